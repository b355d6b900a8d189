pub mod artifact;
pub mod hashtag;
pub mod post;
