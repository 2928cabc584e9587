//! Account command handlers: login, register, logout, whoami.

use std::io::{BufRead, IsTerminal, Write};

use anyhow::{Context, Result, bail};
use veriframe_client::{ClientError, UserProfile};
use veriframe_client::auth::NewAccount;

use crate::cli::args::{LoginArgs, RegisterArgs};
use crate::context::AppContext;
use crate::styled_output::{print_dim, print_info, print_success};

/// Password from the flag/env, stdin, or an interactive prompt.
fn resolve_password(password: Option<String>, from_stdin: bool) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let stdin = std::io::stdin();
    if !from_stdin && stdin.is_terminal() {
        eprint!("Password: ");
        std::io::stderr().flush().ok();
    }

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

/// Headline from the session's `last_error`, cause chain from the client error.
fn failure(ctx: &AppContext, err: ClientError, fallback: &str) -> anyhow::Error {
    let message = ctx
        .session
        .state()
        .last_error
        .unwrap_or_else(|| fallback.to_string());
    anyhow::Error::new(err).context(message)
}

fn describe(user: &UserProfile) -> String {
    format!("{} (id {}, {})", user.username, user.id, user.role)
}

pub async fn run_login(ctx: &AppContext, args: LoginArgs) -> Result<()> {
    let password = resolve_password(args.password, args.password_stdin)?;

    let user = match ctx.session.login(&args.username, &password).await {
        Ok(user) => user,
        Err(err) => return Err(failure(ctx, err, "Login failed")),
    };
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        print_success(&format!("Logged in as {}", describe(&user)));
        print_dim(&format!(
            "Credentials stored in {} store",
            ctx.client().store().mode()
        ));
    }
    Ok(())
}

pub async fn run_register(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let password = resolve_password(args.password, args.password_stdin)?;
    let account = NewAccount {
        username: args.username,
        password,
        email: args.email,
    };

    let user = match ctx.session.register(&account).await {
        Ok(user) => user,
        Err(err) => return Err(failure(ctx, err, "Registration failed")),
    };

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        print_success(&format!("Registered {}", describe(&user)));
        print_info(&format!("Sign in with: veriframe login -u {}", user.username));
    }
    Ok(())
}

pub async fn run_logout(ctx: &AppContext) -> Result<()> {
    let was_signed_in = ctx.session.is_authenticated();
    ctx.session
        .logout()
        .await
        .context("Failed to remove stored credentials")?;
    if was_signed_in {
        print_success("Logged out");
    } else {
        print_info("Not logged in");
    }
    Ok(())
}

pub async fn run_whoami(ctx: &AppContext) -> Result<()> {
    let Some(user) = ctx.session.user() else {
        bail!("Not logged in. Run 'veriframe login' first.");
    };

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("{}", describe(&user));
        if let Some(email) = &user.email {
            println!("email: {email}");
        }
    }
    Ok(())
}
