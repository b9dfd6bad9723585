//! Builds the authenticated client for a CLI run.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use portico_client::{ApiRefresher, AuthOptions, ClientBuilder, FileCredentials, HttpClient};
use portico_config::ClientConfig;

use crate::commands::Context;

/// Server used when neither `--server` nor a context names one.
const DEFAULT_SERVER: &str = "http://localhost:8080";

/// A configured client plus the credential store it reads from.
pub struct Session {
    pub client: HttpClient,
    pub credentials: Arc<FileCredentials>,
}

/// Resolve config, open the credential store and build the client.
///
/// The client refreshes through `auth/refresh` on 401, so every command
/// shares the same retry behaviour.
pub fn connect(ctx: &Context) -> Result<Session> {
    let config = portico_config::load_client_config().context("failed to load client config")?;
    connect_with(ctx, &config)
}

pub fn connect_with(ctx: &Context, config: &ClientConfig) -> Result<Session> {
    let selected = match &ctx.context_name {
        Some(name) => Some(
            config
                .get_context(name)
                .with_context(|| format!("context '{}' not found", name))?,
        ),
        None => config.current(),
    };

    let server = ctx
        .server_url
        .clone()
        .or_else(|| selected.map(|c| c.server.clone()))
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());

    let credentials_path = match selected {
        Some(c) => c.credentials_path()?,
        None => portico_config::config_dir()
            .context("could not determine config directory")?
            .join(portico_client::credentials::CREDENTIALS_FILE),
    };
    let credentials = Arc::new(FileCredentials::open(&credentials_path)?);

    let configure = |builder: ClientBuilder| match selected {
        Some(c) => {
            let builder = builder.base_url(&server).timeout(config.timeout_for(c));
            match &c.api_prefix {
                Some(prefix) => builder.api_prefix(prefix),
                None => builder,
            }
        }
        None => builder
            .base_url(&server)
            .timeout(Duration::from_secs(config.defaults.timeout)),
    };

    // The refresher talks to auth/refresh without credentials attached.
    let plain = configure(HttpClient::builder()).build()?;
    let refresher = Arc::new(ApiRefresher::new(&plain));

    let client = configure(HttpClient::builder())
        .auth(AuthOptions::new(credentials.clone()).with_refresher(refresher))
        .build()?;

    tracing::debug!(
        server = %server,
        credentials = %credentials_path.display(),
        "session ready"
    );

    Ok(Session {
        client,
        credentials,
    })
}
