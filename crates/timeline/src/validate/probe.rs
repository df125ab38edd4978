//! Live media reachability probing.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Checks whether a media URL is reachable.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// `true` when the URL answered successfully.
    async fn is_reachable(&self, url: &str) -> bool;
}

/// Probes with an HTTP `HEAD` request.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaProbe for HttpProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url, error = %e, "Media probe failed");
                false
            }
        }
    }
}
