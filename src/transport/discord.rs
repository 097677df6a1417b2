use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    ChannelId, Client, Command, CommandInteraction, CommandOptionType, Context, EventHandler,
    GatewayIntents, Interaction, Message, MessageId, Ready, Webhook,
};
use serenity::builder::{
    CreateActionRow, CreateButton, CreateCommand, CreateCommandOption, CreateEmbed,
    CreateEmbedFooter, CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage,
    CreateWebhook, EditInteractionResponse, ExecuteWebhook,
};
use serenity::http::Http;
use serenity::model::Timestamp;
use tracing::{debug, error, info, warn};

use crate::commands::{self, ABOUT, CONVERT, LINK_OPTION};
use crate::core::pipeline::ReplyPipeline;
use crate::models::{Author, OutboundReply, RawMessage};
use crate::transport::ChatTransport;

/// Cider 브랜드 색상.
const EMBED_COLOR: u32 = 0xFB003F;

/// serenity HTTP 클라이언트 위의 [`ChatTransport`] 구현.
pub struct DiscordTransport {
    http: Arc<Http>,
    bot_user_id: u64,
}

impl DiscordTransport {
    pub fn new(http: Arc<Http>, bot_user_id: u64) -> Self {
        Self { http, bot_user_id }
    }
}

fn build_embed(reply: &OutboundReply) -> CreateEmbed {
    let card = &reply.card;
    let mut footer = CreateEmbedFooter::new(&card.footer);
    if let Some(ref icon) = reply.footer_icon {
        footer = footer.icon_url(icon);
    }

    CreateEmbed::new()
        .title(&card.title)
        .url(&card.url)
        .thumbnail(&card.thumbnail)
        .description(&card.description)
        .color(EMBED_COLOR)
        .footer(footer)
        .timestamp(Timestamp::now())
}

fn build_action_rows(reply: &OutboundReply) -> Vec<CreateActionRow> {
    let buttons = reply
        .actions
        .iter()
        .map(|action| CreateButton::new_link(&action.url).label(&action.label))
        .collect();
    vec![CreateActionRow::Buttons(buttons)]
}

pub fn to_raw_message(msg: &Message) -> RawMessage {
    RawMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author: Author {
            id: msg.author.id.get(),
            name: msg.author.name.clone(),
            avatar_url: Some(msg.author.face()),
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        webhook_id: msg.webhook_id.map(|id| id.get()),
    }
}

#[async_trait]
impl ChatTransport for DiscordTransport {
    type Webhook = Webhook;

    fn bot_user_id(&self) -> u64 {
        self.bot_user_id
    }

    async fn reply_notice(&self, original: &RawMessage, text: &str) -> Result<()> {
        let channel = ChannelId::new(original.channel_id);
        let builder = CreateMessage::new()
            .content(text)
            .reference_message((channel, MessageId::new(original.id)));
        channel
            .send_message(&*self.http, builder)
            .await
            .with_context(|| format!("failed to reply in channel {}", original.channel_id))?;
        Ok(())
    }

    async fn send_reply(&self, channel_id: u64, reply: &OutboundReply) -> Result<()> {
        let mut builder = CreateMessage::new()
            .embed(build_embed(reply))
            .components(build_action_rows(reply));
        if !reply.content.is_empty() {
            builder = builder.content(&reply.content);
        }
        ChannelId::new(channel_id)
            .send_message(&*self.http, builder)
            .await
            .with_context(|| format!("failed to send message to channel {}", channel_id))?;
        Ok(())
    }

    async fn create_webhook(&self, channel_id: u64, name: &str) -> Result<Webhook> {
        ChannelId::new(channel_id)
            .create_webhook(&*self.http, CreateWebhook::new(name))
            .await
            .with_context(|| format!("failed to create webhook in channel {}", channel_id))
    }

    async fn execute_webhook(
        &self,
        webhook: &Webhook,
        author: &Author,
        reply: &OutboundReply,
    ) -> Result<()> {
        let mut builder = ExecuteWebhook::new()
            .username(&author.name)
            .embeds(vec![build_embed(reply)])
            .components(build_action_rows(reply));
        if let Some(ref avatar) = author.avatar_url {
            builder = builder.avatar_url(avatar);
        }
        if !reply.content.is_empty() {
            builder = builder.content(&reply.content);
        }
        webhook
            .execute(&*self.http, false, builder)
            .await
            .with_context(|| format!("failed to execute webhook {}", webhook.id))?;
        Ok(())
    }

    async fn delete_webhook(&self, webhook: Webhook) -> Result<()> {
        webhook
            .delete(&*self.http)
            .await
            .with_context(|| format!("failed to delete webhook {}", webhook.id))
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()> {
        ChannelId::new(channel_id)
            .delete_message(&*self.http, MessageId::new(message_id))
            .await
            .with_context(|| format!("failed to delete message {} in channel {}", message_id, channel_id))
    }
}

fn slash_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(ABOUT).description("Get information about Cidar"),
        CreateCommand::new(CONVERT)
            .description("Converts any link into an apple equivalent")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, LINK_OPTION, "Media link")
                    .required(true),
            ),
    ]
}

/// `link` 옵션의 문자열 값.
fn link_option(command: &CommandInteraction) -> Option<&str> {
    command
        .data
        .options
        .iter()
        .find(|o| o.name == LINK_OPTION)
        .and_then(|o| o.value.as_str())
}

/// 게이트웨이 이벤트를 파이프라인으로 넘긴다.
/// serenity가 이벤트마다 별도 태스크에서 호출하므로 메시지들은 서로 독립적으로 처리된다.
struct Handler {
    pipeline: Arc<ReplyPipeline>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected", ready.user.name);

        match Command::set_global_commands(&ctx.http, slash_commands()).await {
            Ok(registered) => info!(count = registered.len(), "slash commands registered"),
            Err(e) => warn!("failed to register slash commands: {:?}", e),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        debug!(name = %command.data.name, channel_id = command.channel_id.get(), "slash command");

        let defer = CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new());
        if let Err(e) = command.create_response(&ctx.http, defer).await {
            warn!("cannot acknowledge slash command: {:?}", e);
            return;
        }

        let resolver = self.pipeline.resolver();
        let content = commands::respond(&command.data.name, link_option(&command), resolver.as_ref()).await;

        if let Err(e) = command
            .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
            .await
        {
            warn!("cannot respond to slash command: {:?}", e);
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let bot_user_id = ctx.cache.current_user().id.get();
        let transport = DiscordTransport::new(ctx.http.clone(), bot_user_id);
        let outcome = self.pipeline.handle(&transport, &to_raw_message(&msg)).await;
        debug!(message_id = msg.id.get(), ?outcome, "message handled");
    }
}

/// 봇을 시작하고 게이트웨이 연결이 끝날 때까지 기다린다.
/// Ctrl-C를 받으면 모든 샤드를 종료한다.
pub async fn run(token: &str, pipeline: Arc<ReplyPipeline>) -> Result<()> {
    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(token, intents)
        .event_handler(Handler { pipeline })
        .await
        .context("failed to create discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    if let Err(e) = client.start().await {
        error!("client error: {:?}", e);
        return Err(e).context("discord client stopped");
    }
    Ok(())
}
