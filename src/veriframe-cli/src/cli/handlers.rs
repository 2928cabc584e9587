//! Command dispatch.

use std::process::ExitCode;

use anyhow::Result;

use super::args::{Cli, Commands};
use crate::context::AppContext;
use crate::{images_cmd, login_cmd};

/// Dispatch a CLI command to its handler.
pub async fn dispatch_command(cli: Cli) -> Result<ExitCode> {
    let ctx = AppContext::load(&cli.global).await?;
    // Keeps the in-memory session in step with a store wiped by a failed refresh
    let _expiry_watch = ctx.session.watch_expiry();

    match cli.command {
        Commands::Login(args) => login_cmd::run_login(&ctx, args).await?,
        Commands::Register(args) => login_cmd::run_register(&ctx, args).await?,
        Commands::Logout => login_cmd::run_logout(&ctx).await?,
        Commands::Whoami => login_cmd::run_whoami(&ctx).await?,
        Commands::Upload(args) => return images_cmd::run_upload(&ctx, args).await,
        Commands::Images(command) => images_cmd::run(&ctx, command).await?,
    }
    Ok(ExitCode::SUCCESS)
}
