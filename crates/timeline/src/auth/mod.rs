//! Authentication for X/Twitter API access.
//!
//! Credential acquisition (browser login, cookie capture) happens elsewhere;
//! this module only holds and hands out the resulting session.

mod session;

use std::path::PathBuf;

use async_trait::async_trait;

pub use session::{Session, ENV_AUTH_TOKEN, ENV_BEARER_TOKEN, ENV_CSRF_TOKEN, ENV_CT0_TOKEN};

use crate::error::Result;

/// Source of session credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a session usable for API requests.
    async fn session(&self) -> Result<Session>;
}

/// Reads credentials from `X_*` environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn session(&self) -> Result<Session> {
        Session::from_env()
    }
}

/// Reads a saved session file, falling back to the environment.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialProvider for FileCredentials {
    async fn session(&self) -> Result<Session> {
        if self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Loading saved session");
            Session::load(&self.path)
        } else {
            EnvCredentials.session().await
        }
    }
}

#[async_trait]
impl CredentialProvider for Session {
    async fn session(&self) -> Result<Session> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        Session::new("saved").with_ct0("c").save(&path).unwrap();

        let session = FileCredentials::new(&path).session().await.unwrap();
        assert_eq!(session.auth_token, "saved");
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileCredentials::new(dir.path().join("absent.json"));
        let from_file = provider.session().await.map(|s| s.auth_token);
        let from_env = EnvCredentials.session().await.map(|s| s.auth_token);
        assert_eq!(from_file.ok(), from_env.ok());
    }

    #[tokio::test]
    async fn test_static_session_provider() {
        let provider = Session::new("static");
        assert_eq!(provider.session().await.unwrap().auth_token, "static");
    }
}
