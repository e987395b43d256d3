use std::sync::Arc;

use crate::authz::permits::Permits;
use crate::authz::Verifier;
use crate::config::Config;
use crate::database::{Database, DatabaseSetupError};

/// Immutable service settings shared across requests.
#[derive(Debug)]
pub struct Settings {
    base_url: String,
    host: String,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let base_url = config.base_url.as_str().trim_end_matches('/').to_string();
        let host = config
            .base_url
            .host_str()
            .ok_or(StateSetupError::InvalidBaseUrl)?;
        let host = match config.base_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self { base_url, host })
    }

    /// Public base URL with no trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authority value the signed `host` header must carry.
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Main service state - composes the store, the capability verifier, and
/// the permission bridge.
#[derive(Clone)]
pub struct State {
    database: Database,
    settings: Arc<Settings>,
    permits: Permits,
    verifier: Verifier,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let database = match &config.sqlite_path {
            Some(path) => Database::connect(path).await?,
            None => Database::in_memory().await?,
        };
        tracing::info!(
            database = ?config.sqlite_path,
            base_url = %config.base_url,
            "service state initialized"
        );

        let settings = Arc::new(Settings::from_config(config)?);
        let permits = Permits::new(config.accounts.iter().cloned());
        let verifier = Verifier::new(database.clone(), settings.clone());

        Ok(Self {
            database,
            settings,
            permits,
            verifier,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn permits(&self) -> &Permits {
        &self.permits
    }

    pub fn base_url(&self) -> &str {
        self.settings.base_url()
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to set up the database: {0}")]
    Database(#[from] DatabaseSetupError),
    #[error("base URL must carry a host")]
    InvalidBaseUrl,
}
