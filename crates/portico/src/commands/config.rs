//! Config command - manage named server contexts in client.yaml.

use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow};
use clap::{Args, Subcommand};
use console::{Style, style};
use portico_config::{ClientConfig, Context as ClientContext};

use super::{Context, print_json};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the current context name
    CurrentContext,

    /// List available contexts
    GetContexts,

    /// Switch to a different context
    UseContext {
        /// Context name to switch to
        name: String,
    },

    /// Create or update a context
    SetContext {
        /// Context name
        name: String,

        /// Server URL (e.g., http://localhost:8080)
        #[arg(long)]
        server: Option<String>,

        /// Path prefix for API routes (default "api/")
        #[arg(long)]
        api_prefix: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Where this context's tokens are stored
        #[arg(long)]
        credentials_file: Option<PathBuf>,
    },

    /// Delete a context
    DeleteContext {
        /// Context name to delete
        name: String,
    },

    /// Show the client config file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::CurrentContext => {
            let config = load()?;
            match config.current_context {
                Some(name) => println!("{}", name),
                None => {
                    let dim = Style::new().dim();
                    println!("{}", dim.apply_to("No current context set"));
                }
            }
        }
        ConfigCommand::GetContexts => {
            let config = load()?;
            if ctx.json_output {
                return print_json(&config.contexts);
            }
            print_contexts(&config);
        }
        ConfigCommand::UseContext { name } => {
            let mut config = load()?;
            config.use_context(&name)?;
            portico_config::save_client_config(&config)?;
            println!("Switched to context \"{}\".", name);
        }
        ConfigCommand::SetContext {
            name,
            server,
            api_prefix,
            timeout,
            credentials_file,
        } => {
            let mut config = load()?;

            match config.get_context_mut(&name) {
                Some(existing) => {
                    if let Some(url) = server {
                        existing.server = url;
                    }
                    if let Some(prefix) = api_prefix {
                        existing.api_prefix = Some(prefix);
                    }
                    if let Some(t) = timeout {
                        existing.timeout = Some(t);
                    }
                    if let Some(file) = credentials_file {
                        existing.credentials_file = Some(file);
                    }
                    println!("Context \"{}\" modified.", name);
                }
                None => {
                    // Creating a new context requires a server
                    let server_url = server.ok_or_else(|| {
                        anyhow!("--server is required when creating a new context")
                    })?;
                    let mut context = ClientContext::new(&name, server_url);
                    context.api_prefix = api_prefix;
                    context.timeout = timeout;
                    context.credentials_file = credentials_file;
                    config.set_context(context);
                    println!("Context \"{}\" created.", name);
                }
            }

            // The first context becomes current
            if config.current_context.is_none() && config.contexts.len() == 1 {
                config.current_context = Some(name.clone());
                println!("Context \"{}\" set as current context.", name);
            }

            portico_config::save_client_config(&config)?;
        }
        ConfigCommand::DeleteContext { name } => {
            let mut config = load()?;
            if config.remove_context(&name).is_none() {
                return Err(portico_config::ConfigError::ContextNotFound(name).into());
            }
            portico_config::save_client_config(&config)?;
            println!("Context \"{}\" deleted.", name);
            if config.current_context.is_none() {
                let dim = Style::new().dim();
                println!(
                    "{}",
                    dim.apply_to(
                        "No current context. Use 'portico config use-context <name>' to set one."
                    )
                );
            }
        }
        ConfigCommand::Path => {
            let path = portico_config::client_config_path()
                .ok_or_else(|| anyhow!("could not determine config directory"))?;
            if ctx.json_output {
                return print_json(&serde_json::json!({
                    "path": path.display().to_string(),
                    "exists": path.exists(),
                }));
            }
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn load() -> Result<ClientConfig> {
    portico_config::load_client_config().context("failed to load client config")
}

fn print_contexts(config: &ClientConfig) {
    let dim = Style::new().dim();

    if config.contexts.is_empty() {
        println!("{}", dim.apply_to("No contexts configured"));
        println!(
            "{}",
            dim.apply_to("Run 'portico config set-context <name> --server <url>' to add one.")
        );
        return;
    }

    println!(
        "{}",
        style(format!("{:<9} {:<15} {}", "CURRENT", "NAME", "SERVER")).bold()
    );
    for name in config.context_names() {
        let Some(context) = config.get_context(name) else {
            continue;
        };
        let marker = if config.current_context.as_deref() == Some(name) {
            "*"
        } else {
            " "
        };
        println!("{:<9} {:<15} {}", marker, name, context.server);
    }
}
