use agentloom_core::{CurrentUser, LoginOutcome};
use anyhow::{anyhow, Context};
use clap::Subcommand;
use colored::Colorize;
use std::io::{BufRead, Write};

use crate::context::{CliContext, GlobalOptions};
use crate::output::{print_json, print_success, OutputFormat};

#[derive(Subcommand)]
pub enum AuthCommand {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(short, long, help = "Account email")]
        email: String,

        #[arg(
            short,
            long,
            env = "AGENTLOOM_PASSWORD",
            hide_env_values = true,
            help = "Password (prompted when omitted)"
        )]
        password: Option<String>,

        #[arg(long, help = "MFA or backup code, if the account requires one")]
        mfa_code: Option<String>,

        #[arg(long, help = "Keep the token on disk for later commands")]
        remember: bool,

        #[arg(
            long,
            conflicts_with = "remember",
            help = "Do not write the token to disk; print it for AGENTLOOM_TOKEN instead"
        )]
        session: bool,
    },

    #[command(about = "Sign out and forget the stored token")]
    Logout,

    #[command(about = "Create a new account")]
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        name: String,

        #[arg(
            short,
            long,
            env = "AGENTLOOM_PASSWORD",
            hide_env_values = true,
            help = "Password (prompted when omitted)"
        )]
        password: Option<String>,
    },

    #[command(about = "Show the signed-in user and their permissions")]
    Whoami {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    #[command(about = "Print the sign-in URL for an identity provider")]
    Oauth {
        #[arg(help = "Provider name (google, microsoft, github, ...)")]
        provider: String,
    },
}

pub async fn handle_auth_command(opts: &GlobalOptions, cmd: AuthCommand) -> anyhow::Result<()> {
    match cmd {
        AuthCommand::Login {
            email,
            password,
            mfa_code,
            remember,
            session,
        } => cmd_login(opts, &email, password, mfa_code, remember, session).await,
        AuthCommand::Logout => cmd_logout(opts).await,
        AuthCommand::Register {
            email,
            name,
            password,
        } => cmd_register(opts, &email, &name, password).await,
        AuthCommand::Whoami { format } => cmd_whoami(opts, format).await,
        AuthCommand::Oauth { provider } => cmd_oauth(opts, &provider).await,
    }
}

async fn cmd_login(
    opts: &GlobalOptions,
    email: &str,
    password: Option<String>,
    mfa_code: Option<String>,
    remember: bool,
    session: bool,
) -> anyhow::Result<()> {
    let mut ctx = CliContext::load(opts)?;
    let password = match password {
        Some(p) => p,
        None => prompt("Password")?,
    };

    let auth = ctx.client.auth();
    let outcome = match auth.login(email, &password).await? {
        LoginOutcome::MfaRequired { challenge_token } => {
            println!("{}", "Multi-factor authentication required.".yellow());
            let code = match mfa_code {
                Some(c) => c,
                None => prompt("MFA code")?,
            };
            auth.verify_mfa(&challenge_token, &code).await?
        }
        other => other,
    };

    let LoginOutcome::Authenticated { token, user } = outcome else {
        return Err(anyhow!("Sign-in did not complete"));
    };

    let remember = !session && (remember || ctx.config.auth.remember);
    ctx.remember_token(&token, remember)?;

    let who = user
        .map(|u| u.email)
        .unwrap_or_else(|| email.to_string());
    print_success(&format!("Signed in as {}", who));
    if remember {
        if let Some(path) = ctx.tokens.path() {
            println!("  {} {}", "Token saved to".dimmed(), path.display());
        }
    } else {
        println!();
        println!("  Token kept for this shell only. Run:");
        println!("    export AGENTLOOM_TOKEN={}", token);
    }
    Ok(())
}

async fn cmd_logout(opts: &GlobalOptions) -> anyhow::Result<()> {
    let mut ctx = CliContext::load(opts)?;
    ctx.client.auth().logout().await?;
    ctx.forget_token()?;
    print_success("Signed out");
    Ok(())
}

async fn cmd_register(
    opts: &GlobalOptions,
    email: &str,
    name: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let mut ctx = CliContext::load(opts)?;
    let password = match password {
        Some(p) => p,
        None => prompt("Choose a password")?,
    };

    match ctx.client.auth().register(email, &password, name).await? {
        LoginOutcome::Authenticated { token, .. } => {
            let remember = ctx.config.auth.remember;
            ctx.remember_token(&token, remember)?;
            print_success(&format!("Account created for {}", email));
        }
        LoginOutcome::MfaRequired { .. } => {
            print_success(&format!("Account created for {}", email));
            println!("  Sign in with 'agentloom login --email {}'", email);
        }
    }
    Ok(())
}

async fn cmd_whoami(opts: &GlobalOptions, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = CliContext::authenticated(opts).await?;
    let me = ctx.client.auth().me().await?;

    if format.is_json() {
        return print_json(&me);
    }
    print_user(&me);
    Ok(())
}

fn print_user(me: &CurrentUser) {
    println!("{}", "Signed-in User".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("  {:<14} {}", "Name:".bold(), me.name);
    println!("  {:<14} {}", "Email:".bold(), me.email);
    println!("  {:<14} {}", "ID:".bold(), me.id.dimmed());
    let roles = if me.roles.is_empty() {
        "-".to_string()
    } else {
        me.roles.join(", ")
    };
    println!("  {:<14} {}", "Roles:".bold(), roles);
    println!();
    println!("  {} ({})", "Permissions".yellow().bold(), me.permissions.len());
    for permission in &me.permissions {
        println!("    {}", permission);
    }
}

async fn cmd_oauth(opts: &GlobalOptions, provider: &str) -> anyhow::Result<()> {
    let ctx = CliContext::load(opts)?;
    let url = ctx.client.auth().oauth_url(provider).await?;
    println!("Open this URL in a browser to sign in with {}:", provider.bold());
    println!();
    println!("  {}", url.underline());
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        return Err(anyhow!("{} is required", label));
    }
    Ok(value)
}
