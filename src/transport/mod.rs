#[cfg(feature = "discord")]
pub mod discord;

use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::models::{Author, OutboundReply, RawMessage};

/// 파이프라인이 채팅 플랫폼에 요구하는 동작.
/// Discord 구현은 `discord` 모듈에 있다.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// 임시 웹훅 핸들.
    type Webhook: Send + Sync;

    /// 봇 자신의 사용자 id. 자기 메시지를 무시하는 데 쓴다.
    fn bot_user_id(&self) -> u64;

    /// 원본 메시지에 짧은 안내 문구로 답장한다.
    async fn reply_notice(&self, original: &RawMessage, text: &str) -> Result<()>;

    /// 봇 이름으로 카드를 보낸다.
    async fn send_reply(&self, channel_id: u64, reply: &OutboundReply) -> Result<()>;

    async fn create_webhook(&self, channel_id: u64, name: &str) -> Result<Self::Webhook>;

    /// 웹훅으로 원래 작성자를 흉내 내어 카드를 보낸다.
    async fn execute_webhook(
        &self,
        webhook: &Self::Webhook,
        author: &Author,
        reply: &OutboundReply,
    ) -> Result<()>;

    async fn delete_webhook(&self, webhook: Self::Webhook) -> Result<()>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()>;
}

/// Await a cleanup action and log its failure instead of returning it.
pub async fn best_effort<F>(action: &str, fut: F)
where
    F: Future<Output = Result<()>>,
{
    if let Err(e) = fut.await {
        warn!("{} failed: {:#}", action, e);
    }
}
