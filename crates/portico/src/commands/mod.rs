//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod files;
pub mod users;

use console::Style;
use portico_client::ApiError;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Server URL override from `--server` or the environment.
    pub server_url: Option<String>,
    /// Context name override from `--context`.
    pub context_name: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Print a command failure to stderr.
///
/// Request failures show the status and error code when the server sent one.
pub fn print_error(err: &anyhow::Error) {
    let red = Style::new().red();
    let dim = Style::new().dim();

    match err.downcast_ref::<ApiError>() {
        Some(api) => {
            eprintln!("{} {}", red.apply_to("Error:"), api.message);
            let mut extra = Vec::new();
            if let Some(status) = api.status {
                extra.push(format!("status {}", status));
            }
            if let Some(code) = &api.code {
                extra.push(code.clone());
            }
            if !extra.is_empty() {
                eprintln!("  {}", dim.apply_to(extra.join(", ")));
            }
            if let Some(details) = &api.details {
                eprintln!("  {}", dim.apply_to(details));
            }
        }
        None => eprintln!("{} {:#}", red.apply_to("Error:"), err),
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
