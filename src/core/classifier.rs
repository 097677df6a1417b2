use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ClassifiedLink, Platform};

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(?:https?|ftp)://)?[\w/\-?=%.]+\.[\w/\-&?=%.]+").expect("valid url pattern")
});

static APPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"music\.apple\.com/(.+[a-z](/?)+)").expect("valid apple music pattern")
});

static SPOTIFY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"open\.spotify\.com/(.+[a-z](/?)+)").expect("valid spotify pattern")
});

/// Find the first URL-like substring in free text.
pub fn find_url(text: &str) -> Option<&str> {
    URL_RE.find(text).map(|m| m.as_str())
}

/// Tell which supported platform a URL belongs to.
pub fn platform_of(url: &str) -> Option<Platform> {
    if APPLE_RE.is_match(url) {
        Some(Platform::AppleMusic)
    } else if SPOTIFY_RE.is_match(url) {
        Some(Platform::Spotify)
    } else {
        None
    }
}

/// Classify the first URL in a message.
///
/// Only the first URL-like match is considered. If it belongs to neither
/// Apple Music nor Spotify the message has no link, even when a later URL
/// would have matched.
pub fn classify(text: &str) -> Option<ClassifiedLink> {
    let url = find_url(text)?;
    let platform = platform_of(url)?;
    Some(ClassifiedLink {
        url: url.to_string(),
        platform,
    })
}
