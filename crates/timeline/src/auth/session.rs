//! Session management for X/Twitter API access.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CrawlError, Result};

/// Environment variable holding the `auth_token` cookie.
pub const ENV_AUTH_TOKEN: &str = "X_AUTH_TOKEN";
/// Environment variable holding the `ct0` cookie.
pub const ENV_CT0_TOKEN: &str = "X_CT0_TOKEN";
/// Environment variable holding the web client bearer token.
pub const ENV_BEARER_TOKEN: &str = "X_BEARER_TOKEN";
/// Environment variable holding an explicit CSRF header value.
pub const ENV_CSRF_TOKEN: &str = "X_CSRF_TOKEN";

/// Authenticated web session credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The long-lived auth token cookie.
    pub auth_token: String,
    /// The CSRF cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct0: Option<String>,
    /// Web client bearer token, with or without the `Bearer ` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    /// Explicit `x-csrf-token` header; falls back to `ct0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
    /// Any other cookies captured with the session.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_cookies: BTreeMap<String, String>,
    /// When this session was created/updated.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session with the given auth token.
    #[must_use]
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            ct0: None,
            bearer_token: None,
            csrf_token: None,
            extra_cookies: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the `ct0` cookie.
    #[must_use]
    pub fn with_ct0(mut self, ct0: impl Into<String>) -> Self {
        self.ct0 = Some(ct0.into());
        self
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Load session from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let session: Self = serde_json::from_str(&content)?;
        Ok(session)
    }

    /// Save session to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load session from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a session from a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let auth_token = present(ENV_AUTH_TOKEN)
            .ok_or_else(|| CrawlError::config(format!("{ENV_AUTH_TOKEN} not set")))?;

        let mut session = Self::new(auth_token);
        session.ct0 = present(ENV_CT0_TOKEN);
        session.bearer_token = present(ENV_BEARER_TOKEN);
        session.csrf_token = present(ENV_CSRF_TOKEN);
        Ok(session)
    }

    /// Value for the `x-csrf-token` header.
    #[must_use]
    pub fn csrf(&self) -> Option<&str> {
        self.csrf_token.as_deref().or(self.ct0.as_deref())
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        let token = self.bearer_token.as_deref()?.trim();
        if token.starts_with("Bearer ") {
            Some(token.to_string())
        } else {
            Some(format!("Bearer {token}"))
        }
    }

    /// Get cookie string for HTTP requests.
    #[must_use]
    pub fn cookie_string(&self) -> String {
        let mut parts = vec![format!("auth_token={}", self.auth_token)];
        if let Some(ct0) = &self.ct0 {
            parts.push(format!("ct0={ct0}"));
        }
        for (name, value) in &self.extra_cookies {
            if name != "auth_token" && name != "ct0" {
                parts.push(format!("{name}={value}"));
            }
        }
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let session = Session::from_lookup(lookup(&[
            (ENV_AUTH_TOKEN, "abc"),
            (ENV_CT0_TOKEN, "csrf"),
            (ENV_BEARER_TOKEN, "AAAA"),
        ]))
        .unwrap();

        assert_eq!(session.auth_token, "abc");
        assert_eq!(session.csrf(), Some("csrf"));
        assert_eq!(session.authorization().as_deref(), Some("Bearer AAAA"));
    }

    #[test]
    fn test_missing_auth_token() {
        let err = Session::from_lookup(lookup(&[(ENV_CT0_TOKEN, "csrf")])).unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[test]
    fn test_explicit_csrf_wins() {
        let mut session = Session::new("abc").with_ct0("cookie");
        session.csrf_token = Some("header".to_string());
        assert_eq!(session.csrf(), Some("header"));
    }

    #[test]
    fn test_cookie_string() {
        let mut session = Session::new("abc").with_ct0("xyz");
        session
            .extra_cookies
            .insert("guest_id".to_string(), "v1".to_string());
        assert_eq!(session.cookie_string(), "auth_token=abc; ct0=xyz; guest_id=v1");

        let session = Session::new("abc");
        assert_eq!(session.cookie_string(), "auth_token=abc");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth").join("session.json");

        let session = Session::new("abc").with_ct0("xyz").with_bearer("Bearer T");
        session.save(&path).unwrap();

        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.authorization().as_deref(), Some("Bearer T"));
    }
}
