//! Client configuration for portico.
//!
//! Named connection contexts, kubeconfig style:
//!
//! ```yaml
//! api-version: v1
//! kind: ClientConfig
//! current-context: local
//! contexts:
//!   - name: local
//!     server: http://localhost:8080
//!     timeout: 60
//!     credentials-file: ~/.config/portico/credentials.json
//! defaults:
//!   timeout: 60
//! ```

pub mod client;
pub mod discovery;
pub mod error;

pub use client::{
    ClientConfig, ClientDefaults, Context, client_config_path, load_client_config,
    load_client_config_from, save_client_config, save_client_config_to,
};
pub use discovery::{CONFIG_DIR_ENV, config_dir};
pub use error::{ConfigError, Result};
