//! Auth command - log in, log out and inspect the current session.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::{Style, style};
use portico_client::{LoginRequest, TokenPair};

use super::{Context, print_json};
use crate::session;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in and store the returned tokens
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (prompted for when omitted)
        #[arg(short, long, env = "PORTICO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out and forget stored tokens
    Logout,

    /// Show the logged-in user
    Profile,

    /// Show whether tokens are stored
    Status,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { email, password } => cmd_login(email, password, ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
        AuthCommand::Profile => cmd_profile(ctx).await,
        AuthCommand::Status => cmd_status(ctx),
    }
}

async fn cmd_login(email: String, password: Option<String>, ctx: &Context) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ").context("failed to read password")?,
    };

    let session = session::connect(ctx)?;
    let response = session
        .client
        .auth()
        .login(&LoginRequest { email, password })
        .await?;

    let login = response.result;
    session.credentials.save(&TokenPair::new(
        login.access_token.clone(),
        Some(login.refresh_token.clone()),
    ))?;
    tracing::info!(user = %login.user.email, "logged in");

    if ctx.json_output {
        print_json(&login.user)?;
    } else {
        let green = Style::new().green();
        let dim = Style::new().dim();
        println!(
            "{} Logged in as {} {}",
            green.apply_to("✓"),
            style(&login.user.name).bold(),
            dim.apply_to(format!("<{}>", login.user.email))
        );
        if ctx.verbose {
            println!(
                "  {}",
                dim.apply_to(format!(
                    "Tokens saved to {}",
                    session.credentials.path().display()
                ))
            );
        }
    }

    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let session = session::connect(ctx)?;

    if session.credentials.has_tokens() {
        // Local tokens are dropped even if the server call fails.
        if let Err(e) = session.client.auth().logout().await {
            tracing::warn!(error = %e, "server logout failed");
        }
    }
    session.credentials.clear()?;

    if ctx.json_output {
        print_json(&serde_json::json!({ "loggedOut": true }))?;
    } else {
        let green = Style::new().green();
        println!("{} Logged out", green.apply_to("✓"));
    }

    Ok(())
}

async fn cmd_profile(ctx: &Context) -> Result<()> {
    let session = session::connect(ctx)?;
    let profile = session.client.auth().profile().await?.result;

    if ctx.json_output {
        print_json(&profile)?;
    } else {
        let dim = Style::new().dim();
        println!("{}", style("Profile").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {:<8} {}", dim.apply_to("ID"), profile.id);
        println!("  {:<8} {}", dim.apply_to("Name"), profile.name);
        println!("  {:<8} {}", dim.apply_to("Email"), profile.email);
        println!("  {:<8} {}", dim.apply_to("Role"), profile.role);
    }

    Ok(())
}

fn cmd_status(ctx: &Context) -> Result<()> {
    let session = session::connect(ctx)?;
    let logged_in = session.credentials.has_tokens();

    if ctx.json_output {
        print_json(&serde_json::json!({
            "server": session.client.base_url().as_str(),
            "loggedIn": logged_in,
            "credentialsFile": session.credentials.path().display().to_string(),
        }))?;
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style("Auth Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {:<12} {}", dim.apply_to("Server"), session.client.base_url());
    if logged_in {
        let green = Style::new().green();
        println!("  {:<12} {}", dim.apply_to("Session"), green.apply_to("logged in"));
    } else {
        let yellow = Style::new().yellow();
        println!(
            "  {:<12} {}",
            dim.apply_to("Session"),
            yellow.apply_to("not logged in")
        );
        println!();
        println!(
            "{}",
            dim.apply_to("Run 'portico auth login --email <email>' to log in.")
        );
    }
    if ctx.verbose {
        println!(
            "  {:<12} {}",
            dim.apply_to("Credentials"),
            session.credentials.path().display()
        );
    }

    Ok(())
}
