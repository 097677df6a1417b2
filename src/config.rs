use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_URL: &str = "https://api.cider.sh/v1";
pub const DEFAULT_CATALOG_BASE: &str = "https://api.music.apple.com";
pub const DEFAULT_SONGLINK_BASE: &str = "https://api.song.link";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub apple_music: AppleMusicConfig,
    #[serde(default)]
    pub songlink: SonglinkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiscordConfig {
    pub token: Option<String>,
}

impl DiscordConfig {
    pub fn is_configured(&self) -> bool {
        self.token.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// 답장을 누구 이름으로 보낼지.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyMode {
    /// 임시 웹훅으로 원래 작성자를 흉내 낸다.
    Webhook,
    #[default]
    Direct,
}

/// 카탈로그 조회에 쓸 스토어프론트 결정 방식.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorefrontResolution {
    /// URL 경로의 첫 세그먼트를 쓴다.
    #[default]
    Derived,
    Fixed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RelayConfig {
    #[serde(default)]
    pub reply_mode: ReplyMode,
    #[serde(default)]
    pub ignored_channels: Vec<u64>,
    /// 라디오 스테이션 링크도 카드로 바꾼다. 꺼져 있으면 미지원 안내를 보낸다.
    #[serde(default)]
    pub stations: bool,
    #[serde(default)]
    pub storefront: StorefrontResolution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppleMusicConfig {
    /// 고정 개발자 토큰. 설정되면 주기적 갱신을 하지 않는다.
    pub developer_token: Option<String>,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_catalog_base")]
    pub catalog_base: String,
}

impl Default for AppleMusicConfig {
    fn default() -> Self {
        Self {
            developer_token: None,
            token_url: default_token_url(),
            catalog_base: default_catalog_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SonglinkConfig {
    #[serde(default = "default_songlink_base")]
    pub base_url: String,
}

impl Default for SonglinkConfig {
    fn default() -> Self {
        Self {
            base_url: default_songlink_base(),
        }
    }
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_catalog_base() -> String {
    DEFAULT_CATALOG_BASE.to_string()
}

fn default_songlink_base() -> String {
    DEFAULT_SONGLINK_BASE.to_string()
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CIDAR_CONFIG") {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("cidar")
        .join("config.toml")
}

/// 설정 파일을 읽는다. 파일이 없으면 기본값, 파싱에 실패하면 에러.
pub fn load_config() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config file {}", path.display()))
}

/// 파일 설정 위에 환경 변수를 덮어쓴다.
pub fn load_with_env() -> Result<Config> {
    let mut config = load_config()?;
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(token) = lookup("TOKEN").filter(|s| !s.is_empty()) {
        config.discord.token = Some(token);
    }
    if let Some(flag) = lookup("USE_WEBHOOK") {
        config.relay.reply_mode = if flag.eq_ignore_ascii_case("true") {
            ReplyMode::Webhook
        } else {
            ReplyMode::Direct
        };
    }
    if let Some(token) = lookup("DEVELOPER_TOKEN").filter(|s| !s.is_empty()) {
        config.apple_music.developer_token = Some(token);
    }
    if let Some(code) = lookup("STOREFRONT").filter(|s| !s.is_empty()) {
        config.relay.storefront = StorefrontResolution::Fixed(code.to_lowercase());
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.relay.reply_mode, ReplyMode::Direct);
        assert_eq!(config.relay.storefront, StorefrontResolution::Derived);
        assert!(!config.relay.stations);
        assert_eq!(config.apple_music.token_url, DEFAULT_TOKEN_URL);
        assert!(!config.discord.is_configured());
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
[discord]
token = "abc"

[relay]
reply_mode = "webhook"
stations = true
storefront = { fixed = "us" }
ignored_channels = [1133927653074796555]

[songlink]
base_url = "http://localhost:1234"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert!(config.discord.is_configured());
        assert_eq!(config.relay.reply_mode, ReplyMode::Webhook);
        assert!(config.relay.stations);
        assert_eq!(
            config.relay.storefront,
            StorefrontResolution::Fixed("us".to_string())
        );
        assert_eq!(config.relay.ignored_channels, vec![1133927653074796555]);
        assert_eq!(config.songlink.base_url, "http://localhost:1234");
        assert_eq!(config.apple_music.catalog_base, DEFAULT_CATALOG_BASE);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_env(
            &mut config,
            env(&[
                ("TOKEN", "bot-token"),
                ("USE_WEBHOOK", "true"),
                ("DEVELOPER_TOKEN", "dev"),
                ("STOREFRONT", "GB"),
            ]),
        );
        assert_eq!(config.discord.token.as_deref(), Some("bot-token"));
        assert_eq!(config.relay.reply_mode, ReplyMode::Webhook);
        assert_eq!(config.apple_music.developer_token.as_deref(), Some("dev"));
        assert_eq!(
            config.relay.storefront,
            StorefrontResolution::Fixed("gb".to_string())
        );
    }

    #[test]
    fn test_use_webhook_false_selects_direct() {
        let mut config = Config::default();
        config.relay.reply_mode = ReplyMode::Webhook;
        apply_env(&mut config, env(&[("USE_WEBHOOK", "no")]));
        assert_eq!(config.relay.reply_mode, ReplyMode::Direct);
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = Config::default();
        apply_env(&mut config, env(&[("TOKEN", ""), ("STOREFRONT", "")]));
        assert!(config.discord.token.is_none());
        assert_eq!(config.relay.storefront, StorefrontResolution::Derived);
    }
}
