use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{RelayConfig, ReplyMode};
use crate::core::{catalog_link, classifier, formatter};
use crate::models::{
    ClassifiedLink, DisplayCard, LinkAction, OutboundReply, Platform, RawMessage, ResourceKind,
};
use crate::sources::songlink::ResolveError;
use crate::sources::{CatalogSource, LinkResolver};
use crate::transport::{best_effort, ChatTransport};

pub const CONVERSION_FAILED: &str = "Could not convert Spotify link to Apple Music link";
pub const NOT_IMPLEMENTED: &str = "Apple music link type is not implemented";

/// Name of the transient webhook used to post as the original author.
pub const WEBHOOK_NAME: &str = "temporary-cidar";
/// Text that stands in for the link inside the preserved message.
pub const LINK_PLACEHOLDER: &str = "(embed)";

const PLAY_PREFIX: &str = "https://cider.sh/p?";
const VIEW_PREFIX: &str = "https://cider.sh/o?";

/// What a single pipeline run ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Authored by a bot or a webhook, or posted in an ignored channel.
    Ignored,
    /// No Apple Music or Spotify link in the text.
    NoLink,
    /// The author was told why no preview was made.
    Notified(&'static str),
    /// Stopped without any user-visible action.
    Aborted(String),
    Published,
}

/// Why a link could not be turned into a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// Tell the author with a fixed notice.
    Notice(&'static str),
    /// Log only.
    Silent(String),
}

/// Turns chat messages containing music links into preview cards.
///
/// Runs are independent. The pipeline holds no per-message state, so one
/// instance is shared by every concurrent message handler.
pub struct ReplyPipeline {
    catalog: Arc<dyn CatalogSource>,
    resolver: Arc<dyn LinkResolver>,
    config: RelayConfig,
}

impl ReplyPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        resolver: Arc<dyn LinkResolver>,
        config: RelayConfig,
    ) -> Self {
        Self {
            catalog,
            resolver,
            config,
        }
    }

    /// Resolver shared with the `/convert` command.
    pub fn resolver(&self) -> Arc<dyn LinkResolver> {
        self.resolver.clone()
    }

    pub fn should_ignore(&self, message: &RawMessage, bot_user_id: u64) -> bool {
        message.author.id == bot_user_id
            || message.author.bot
            || message.webhook_id.is_some()
            || self.config.ignored_channels.contains(&message.channel_id)
    }

    #[instrument(skip_all, fields(message_id = message.id, channel_id = message.channel_id))]
    pub async fn handle<T: ChatTransport>(&self, transport: &T, message: &RawMessage) -> Outcome {
        if self.should_ignore(message, transport.bot_user_id()) {
            return Outcome::Ignored;
        }

        let Some(link) = classifier::classify(&message.content) else {
            return Outcome::NoLink;
        };
        info!(url = %link.url, platform = ?link.platform, "music link found");

        let card = match self.build_card(&link, &message.author.name).await {
            Ok(card) => card,
            Err(Stop::Notice(text)) => {
                best_effort("notice reply", transport.reply_notice(message, text)).await;
                return Outcome::Notified(text);
            }
            Err(Stop::Silent(reason)) => {
                warn!("{}", reason);
                return Outcome::Aborted(reason);
            }
        };

        let Some(reply) = compose_reply(message, &link.url, card) else {
            warn!("catalog resource has no canonical url");
            return Outcome::Aborted("catalog resource has no canonical url".to_string());
        };

        if let Err(e) = self.publish(transport, message, &reply).await {
            error!("unable to publish preview: {:#}", e);
            return Outcome::Aborted(format!("publish failed: {:#}", e));
        }

        best_effort(
            "original message deletion",
            transport.delete_message(message.channel_id, message.id),
        )
        .await;

        info!(title = %reply.card.title, "preview published");
        Outcome::Published
    }

    /// Resolve, fetch and format a classified link.
    pub async fn build_card(&self, link: &ClassifiedLink, shared_by: &str) -> Result<DisplayCard, Stop> {
        let apple_url = match link.platform {
            Platform::AppleMusic => link.url.clone(),
            Platform::Spotify => match self.resolver.to_apple_music(&link.url).await {
                Ok(url) => url,
                Err(ResolveError::NoAppleMusicLink) => return Err(Stop::Notice(CONVERSION_FAILED)),
                Err(e) => return Err(Stop::Silent(e.to_string())),
            },
        };

        let catalog_link = match catalog_link::parse_catalog_link(&apple_url, &self.config.storefront) {
            Ok(Some(catalog_link))
                if catalog_link.kind != ResourceKind::Station || self.config.stations =>
            {
                catalog_link
            }
            Ok(_) => {
                info!(url = %apple_url, "unsupported apple music link type");
                return Err(Stop::Notice(NOT_IMPLEMENTED));
            }
            Err(e) => return Err(Stop::Silent(format!("{:#}", e))),
        };

        let resource = self
            .catalog
            .fetch_resource(&catalog_link)
            .await
            .map_err(|e| Stop::Silent(format!("failed to fetch {}: {}", catalog_link.api_path(), e)))?;
        debug!(name = resource.name(), kind = ?catalog_link.kind, "catalog resource fetched");

        Ok(formatter::build_card(&resource, shared_by))
    }

    async fn publish<T: ChatTransport>(
        &self,
        transport: &T,
        message: &RawMessage,
        reply: &OutboundReply,
    ) -> Result<()> {
        match self.config.reply_mode {
            ReplyMode::Direct => transport.send_reply(message.channel_id, reply).await,
            ReplyMode::Webhook => {
                let webhook = transport.create_webhook(message.channel_id, WEBHOOK_NAME).await?;
                let result = transport
                    .execute_webhook(&webhook, &message.author, reply)
                    .await;
                best_effort("webhook deletion", transport.delete_webhook(webhook)).await;
                result
            }
        }
    }
}

/// Build the replacement message.
///
/// Any text the author wrote around the link is kept, with the link itself
/// swapped for a placeholder. Returns None when the card has no URL to
/// derive the deep links from.
pub fn compose_reply(message: &RawMessage, link_url: &str, card: DisplayCard) -> Option<OutboundReply> {
    let stripped = card.url.replace("https://", "");
    if stripped.is_empty() {
        return None;
    }

    let content = if message.content.replace(link_url, "").trim().is_empty() {
        String::new()
    } else {
        message.content.replace(link_url, LINK_PLACEHOLDER)
    };

    Some(OutboundReply {
        content,
        footer_icon: message.author.avatar_url.clone(),
        actions: vec![
            LinkAction {
                label: "Play In Cider".to_string(),
                url: format!("{}{}", PLAY_PREFIX, stripped),
            },
            LinkAction {
                label: "View In Cider".to_string(),
                url: format!("{}{}", VIEW_PREFIX, stripped),
            },
        ],
        card,
    })
}
