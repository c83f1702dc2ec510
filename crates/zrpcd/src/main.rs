//! `zrpcd` — line-oriented JSON-RPC daemon for z/OS dataset/USS/job/console
//! operations. CLI parsing and handler registration live here; the runtime
//! itself (dispatcher, worker pool, daemon loop) lives in `zrpcd-core`.

use std::path::PathBuf;

use clap::Parser;

use zrpcd_core::daemon::{self, DaemonConfig};
use zrpcd_core::Dispatcher;

#[derive(Debug, Parser)]
#[command(name = "zrpcd")]
#[command(about = "JSON-RPC daemon for z/OS dataset/USS/job/console operations")]
struct Args {
    /// Path to the native helper binary each worker's channel execs against.
    #[arg(long, env = "ZRPCD_HELPER_PATH", default_value = "zowe-native-proto")]
    helper_path: PathBuf,

    /// Number of persistent workers, each owning one helper child process.
    #[arg(long, default_value_t = 10)]
    num_workers: usize,

    /// Raise the file log layer from info to debug.
    #[arg(long)]
    verbose: bool,

    /// Copy the named pipe at PATH to stdout and exit, without starting the
    /// dispatcher or worker pool at all (§6 one-shot mode).
    #[arg(long)]
    pipe: Option<PathBuf>,

    /// Override the default `<exe_dir>/logs/zrpcd.log` destination.
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Override the default `<exe_dir>/checksums.asc` sidecar path.
    #[arg(long)]
    checksums_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Some(pipe_path) = args.pipe {
        if let Err(err) = daemon::copy_pipe_to_stdout(&pipe_path).await {
            eprintln!("zrpcd: fatal: {err}");
            std::process::exit(1);
        }
        return;
    }

    let mut dispatcher = Dispatcher::new();
    if let Err(err) = zrpcd_handlers::register_all(&mut dispatcher) {
        eprintln!("zrpcd: fatal: {err}");
        std::process::exit(1);
    }

    let config = DaemonConfig {
        helper_path: args.helper_path,
        num_workers: args.num_workers,
        verbose: args.verbose,
        log_path: args.log_path,
        checksums_path: args.checksums_path,
    };

    if let Err(err) = daemon::run(config, dispatcher).await {
        eprintln!("zrpcd: fatal: {err}");
        std::process::exit(1);
    }
}
