//! Backend connection settings.

use thiserror::Error;

/// Environment variable naming the backend project URL.
pub const ENV_URL: &str = "BOARDSYNC_SUPABASE_URL";

/// Environment variable naming the anon (publishable) API key.
pub const ENV_ANON_KEY: &str = "BOARDSYNC_SUPABASE_ANON_KEY";

#[derive(Debug, Error)]
pub enum BackendConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
}

/// Where the backend lives and the key that identifies this client.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    base_url: String,
    anon_key: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            anon_key: anon_key.into(),
        }
    }

    /// Read the connection settings from the environment, loading a
    /// `.env` file first when one exists.
    pub fn from_env() -> Result<Self, BackendConfigError> {
        dotenvy::dotenv().ok();
        let base_url =
            std::env::var(ENV_URL).map_err(|_| BackendConfigError::MissingVar(ENV_URL))?;
        let anon_key =
            std::env::var(ENV_ANON_KEY).map_err(|_| BackendConfigError::MissingVar(ENV_ANON_KEY))?;
        Ok(Self::new(base_url, anon_key))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }
}
