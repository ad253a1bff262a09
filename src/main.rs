use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Load `.env` first so it can provide `RUST_LOG` and the directory variables.
    dotenvy::dotenv().ok();

    // `RUST_LOG` wins when set; otherwise log our own progress at info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,mlx_experiments=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match mlx_experiments::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
