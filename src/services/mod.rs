pub mod log_archive;
pub mod persist;
pub mod pipeline;

pub use persist::{Artifacts, ResponsePersister};
pub use pipeline::{FetchRequest, Pipeline, RunReport};
