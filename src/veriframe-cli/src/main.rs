//! Veriframe CLI - main entry point.

use std::process::ExitCode;

use clap::Parser;
use veriframe_cli::cli::{Cli, ColorMode, dispatch_command};
use veriframe_cli::styled_output::{print_dim, print_error, set_colors_enabled};
use veriframe_client::ClientError;

/// Environment variable holding the log filter.
const LOG_ENV_VAR: &str = "VERIFRAME_LOG";

fn init_logging(cli: &Cli) {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let directive = cli.log_directive(env_value.as_deref());
    let filter = tracing_subscriber::EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_error(err: &anyhow::Error) {
    print_error(&format!("{err:#}"));

    let expired = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ClientError>(),
            Some(ClientError::SessionExpired(_))
        )
    });
    if expired {
        print_dim("Your session has expired. Run 'veriframe login' to sign in again.");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => set_colors_enabled(true),
        ColorMode::Never => set_colors_enabled(false),
        ColorMode::Auto => {}
    }

    init_logging(&cli);

    match dispatch_command(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}
