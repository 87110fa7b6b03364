#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    // Must run before the runtime spawns worker threads.
    let local_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start tokio runtime: {err}");
            return ExitCode::from(1);
        }
    };
    runtime.block_on(mission_base::cli::main(local_offset))
}
