//! arca CLI entry point.

use arca::cli::{self, EXIT_OK, exit_code_for, render_error};
use arca::{commands, tracing};

fn main() {
    let cli = cli::parse();
    tracing::init(cli.level);

    let exit_code = run_with_tokio(cli);
    std::process::exit(exit_code);
}

/// Create the tokio runtime and run the command.
fn run_with_tokio(cli: cli::Cli) -> i32 {
    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return 1;
        }
    };

    rt.block_on(run(cli))
}

async fn run(cli: cli::Cli) -> i32 {
    match commands::execute(cli.command).await {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err);
            exit_code_for(&err)
        }
    }
}
