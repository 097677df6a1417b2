use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::sources::LinkResolver;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("song.link request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("song.link returned non 200: {0}")]
    Status(StatusCode),
    #[error("malformed song.link response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("song.link has no apple music link")]
    NoAppleMusicLink,
}

/// song.link 응답. 플랫폼 이름을 키로 하는 링크 맵만 사용한다.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonglinkResponse {
    #[serde(default)]
    links_by_platform: HashMap<String, PlatformLink>,
}

#[derive(Deserialize)]
struct PlatformLink {
    #[serde(default)]
    url: String,
}

/// song.link를 통해 다른 플랫폼 링크를 Apple Music 링크로 바꾼다.
pub struct SonglinkClient {
    client: reqwest::Client,
    base_url: String,
}

impl SonglinkClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LinkResolver for SonglinkClient {
    async fn to_apple_music(&self, url: &str) -> Result<String, ResolveError> {
        debug!(%url, "resolving through song.link");
        let resp = self
            .client
            .get(format!("{}/v1-alpha.1/links", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(ResolveError::Status(resp.status()));
        }

        let body = resp.bytes().await?;
        let parsed: SonglinkResponse = serde_json::from_slice(&body)?;

        parsed
            .links_by_platform
            .get("appleMusic")
            .map(|link| link.url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or(ResolveError::NoAppleMusicLink)
    }
}
