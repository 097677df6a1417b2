use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input, Select};
use tracing::info;

use crate::commands;
use crate::config::{self, Config, ReplyMode, StorefrontResolution};
use crate::core::classifier;
use crate::core::pipeline::{self, ReplyPipeline, Stop};
use crate::models::{Author, DeveloperToken, RawMessage};
use crate::sources::apple_music::CatalogClient;
use crate::sources::songlink::SonglinkClient;
use crate::sources::token::{TokenRefresher, TokenStore};

#[derive(Parser)]
#[command(
    name = "cidar",
    version,
    about = "Discord relay that replaces Apple Music and Spotify links with Cider previews"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Debug logging with source locations
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to Discord and start relaying links
    Run,
    /// Resolve a link and print the preview card without Discord
    Convert {
        /// Apple Music or Spotify link
        link: String,
        /// Name shown in the card footer
        #[arg(long, default_value = "cidar")]
        shared_by: String,
    },
    /// Interactively edit the config file
    Config,
    /// Show build information
    About,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Run) => cmd_run().await,
        Some(Commands::Convert { link, shared_by }) => cmd_convert(&link, &shared_by).await,
        Some(Commands::Config) => cmd_config(),
        Some(Commands::About) => {
            cmd_about();
            Ok(())
        }
        None => {
            println!("usage: cidar <command>");
            println!("run 'cidar --help' for more information.");
            Ok(())
        }
    }
}

/// Token store, refresher (absent when a static token is configured) and pipeline.
fn build_pipeline(
    cfg: &Config,
    client: reqwest::Client,
) -> (Arc<TokenStore>, Option<TokenRefresher>, ReplyPipeline) {
    let (tokens, refresher) = match cfg.apple_music.developer_token {
        Some(ref token) => (Arc::new(TokenStore::with_token(DeveloperToken::new(token.clone()))), None),
        None => {
            let tokens = Arc::new(TokenStore::new());
            let refresher =
                TokenRefresher::new(client.clone(), &cfg.apple_music.token_url, tokens.clone());
            (tokens, Some(refresher))
        }
    };

    let catalog = Arc::new(CatalogClient::new(
        client.clone(),
        &cfg.apple_music.catalog_base,
        tokens.clone(),
    ));
    let resolver = Arc::new(SonglinkClient::new(client, &cfg.songlink.base_url));
    let pipeline = ReplyPipeline::new(catalog, resolver, cfg.relay.clone());

    (tokens, refresher, pipeline)
}

#[cfg(feature = "discord")]
async fn cmd_run() -> Result<()> {
    let cfg = config::load_with_env()?;
    let token = match cfg.discord.token {
        Some(ref token) if cfg.discord.is_configured() => token.clone(),
        _ => bail!("discord token is not set; run 'cidar config' or set TOKEN"),
    };

    info!(
        reply_mode = ?cfg.relay.reply_mode,
        storefront = ?cfg.relay.storefront,
        "cidar launching"
    );

    let (_tokens, refresher, pipeline) = build_pipeline(&cfg, reqwest::Client::new());
    if let Some(refresher) = refresher {
        refresher.spawn();
    }

    crate::transport::discord::run(&token, Arc::new(pipeline)).await
}

#[cfg(not(feature = "discord"))]
async fn cmd_run() -> Result<()> {
    bail!("discord support is not enabled. rebuild with: cargo build --features discord");
}

async fn cmd_convert(link: &str, shared_by: &str) -> Result<()> {
    let cfg = config::load_with_env()?;
    let Some(classified) = classifier::classify(link) else {
        bail!("not an Apple Music or Spotify link: {}", link);
    };

    let (_tokens, refresher, pipeline) = build_pipeline(&cfg, reqwest::Client::new());
    if let Some(refresher) = refresher {
        refresher
            .refresh_once()
            .await
            .context("unable to obtain a developer token")?;
    }

    let card = match pipeline.build_card(&classified, shared_by).await {
        Ok(card) => card,
        Err(Stop::Notice(text)) => bail!("{}", text),
        Err(Stop::Silent(reason)) => bail!("{}", reason),
    };

    let message = RawMessage {
        content: classified.url.clone(),
        author: Author {
            name: shared_by.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let Some(reply) = pipeline::compose_reply(&message, &classified.url, card) else {
        bail!("catalog resource has no canonical url");
    };

    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    let card = &reply.card;
    for (field, value) in [
        ("Title", card.title.as_str()),
        ("URL", card.url.as_str()),
        ("Thumbnail", card.thumbnail.as_str()),
        ("Duration", card.duration.as_str()),
        ("Description", card.description.as_str()),
        ("Footer", card.footer.as_str()),
    ] {
        table.add_row(vec![Cell::new(field), Cell::new(value)]);
    }
    for action in &reply.actions {
        table.add_row(vec![Cell::new(&action.label), Cell::new(&action.url)]);
    }

    println!("{table}");
    Ok(())
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config()?;

    println!("Cidar configuration");
    println!("(written to {})\n", config::config_path().display());

    let token: String = Input::new()
        .with_prompt("Discord bot token")
        .with_initial_text(cfg.discord.token.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let modes = ["direct (bot posts the preview)", "webhook (post as the original author)"];
    let current = match cfg.relay.reply_mode {
        ReplyMode::Direct => 0,
        ReplyMode::Webhook => 1,
    };
    let mode = Select::new()
        .with_prompt("Reply mode")
        .items(&modes)
        .default(current)
        .interact()?;

    let current_storefront = match cfg.relay.storefront {
        StorefrontResolution::Fixed(ref code) => code.clone(),
        StorefrontResolution::Derived => String::new(),
    };
    let storefront: String = Input::new()
        .with_prompt("Fixed storefront (empty = take it from the link)")
        .with_initial_text(current_storefront)
        .allow_empty(true)
        .interact_text()?;

    let stations = Confirm::new()
        .with_prompt("Convert radio station links")
        .default(cfg.relay.stations)
        .interact()?;

    cfg.discord.token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
    cfg.relay.reply_mode = if mode == 1 {
        ReplyMode::Webhook
    } else {
        ReplyMode::Direct
    };
    cfg.relay.stations = stations;
    cfg.relay.storefront = match storefront.trim() {
        "" => StorefrontResolution::Derived,
        code => StorefrontResolution::Fixed(code.to_lowercase()),
    };

    config::save_config(&cfg)?;
    println!("\nconfiguration saved!");
    Ok(())
}

fn cmd_about() {
    println!("{}", commands::about());
    println!(
        "Discord support: {}",
        if cfg!(feature = "discord") { "yes" } else { "no" }
    );
}
