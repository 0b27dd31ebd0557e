//! Song resolver client
//!
//! Turns a free-text query or URL into playable item metadata by calling the
//! external resolver service. The trait seam lets tests substitute a stub.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("jamroom-rp/", env!("CARGO_PKG_VERSION"));

/// One resolver candidate: playable metadata for a query match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSong {
    /// Streamable media reference
    pub media_url: String,
    /// Item title
    pub title: String,
    /// Item artist
    pub artist: String,
    /// Playback duration in seconds
    pub duration_secs: i64,
    /// Artwork reference, if known
    pub thumbnail_url: Option<String>,
}

/// Resolver seam consumed by the orchestration facade
#[async_trait]
pub trait SongResolver: Send + Sync {
    /// Resolve `query` into up to `limit` ranked candidates.
    ///
    /// An empty result means no match; transport/timeout problems surface as
    /// `Error::Resolution`. The queue is never touched on failure.
    async fn resolve(&self, query: &str, limit: usize) -> Result<Vec<ResolvedSong>>;
}

/// HTTP resolver client with a bounded request timeout
pub struct HttpResolver {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpResolver {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Resolution(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SongResolver for HttpResolver {
    async fn resolve(&self, query: &str, limit: usize) -> Result<Vec<ResolvedSong>> {
        let url = format!("{}/resolve", self.base_url);
        debug!("Resolving query {:?} via {}", query, url);

        let limit_param = limit.to_string();
        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query), ("limit", limit_param.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Resolution(format!("Resolver timed out for {:?}", query))
                } else {
                    Error::Resolution(format!("Resolver request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Resolution(format!(
                "Resolver returned {} for {:?}",
                status, query
            )));
        }

        let candidates: Vec<ResolvedSong> = response
            .json()
            .await
            .map_err(|e| Error::Resolution(format!("Invalid resolver response: {}", e)))?;

        debug!("Resolver returned {} candidates for {:?}", candidates.len(), query);
        Ok(candidates)
    }
}
