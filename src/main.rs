use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    // Fetches run strictly one after another; a single thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(hashtag_harvest::run())
}
