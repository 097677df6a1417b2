use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::DeveloperToken;

/// 토큰 갱신 주기.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<u64>,
}

impl DeveloperToken {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let expires_at = decode_expiry(&value);
        Self { value, expires_at }
    }
}

/// JWT payload에서 `exp`를 읽는다. JWT가 아니면 None.
pub fn decode_expiry(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.exp
}

/// 프로세스 전역 개발자 토큰 저장소.
/// 갱신 작업이 쓰고, 카탈로그 클라이언트가 읽는다.
#[derive(Debug, Default)]
pub struct TokenStore {
    current: RwLock<Option<Arc<DeveloperToken>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: DeveloperToken) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(token))),
        }
    }

    /// 현재 토큰의 스냅샷. 아직 한 번도 받지 못했으면 None.
    pub async fn current(&self) -> Option<Arc<DeveloperToken>> {
        self.current.read().await.clone()
    }

    pub async fn refresh(&self, token: DeveloperToken) {
        *self.current.write().await = Some(Arc::new(token));
    }
}

/// 토큰 발급 엔드포인트를 주기적으로 호출해 저장소를 갱신한다.
pub struct TokenRefresher {
    client: reqwest::Client,
    url: String,
    store: Arc<TokenStore>,
    interval: Duration,
}

impl TokenRefresher {
    pub fn new(client: reqwest::Client, url: impl Into<String>, store: Arc<TokenStore>) -> Self {
        Self {
            client,
            url: url.into(),
            store,
            interval: REFRESH_INTERVAL,
        }
    }

    /// 토큰을 한 번 받아 저장소에 넣는다. 실패하면 이전 토큰을 유지한다.
    pub async fn refresh_once(&self) -> Result<()> {
        let body: TokenBody = self
            .client
            .get(&self.url)
            .header(reqwest::header::USER_AGENT, "Cider")
            .send()
            .await
            .context("failed to reach token endpoint")?
            .error_for_status()
            .context("token endpoint rejected the request")?
            .json()
            .await
            .context("failed to parse token response")?;

        let token = DeveloperToken::new(body.token);
        match token.expires_at {
            Some(exp) => info!(expires_at = exp, "developer token refreshed"),
            None => info!("developer token refreshed"),
        }
        self.store.refresh(token).await;
        Ok(())
    }

    /// 백그라운드 갱신 루프를 시작한다. 첫 갱신은 즉시 실행된다.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                debug!(url = %self.url, "refreshing developer token");
                if let Err(e) = self.refresh_once().await {
                    warn!("{:#}; keeping previous token", e);
                }
            }
        })
    }
}
