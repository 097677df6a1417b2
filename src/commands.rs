//! 슬래시 명령(`/about`, `/convert`) 응답 본문.
//! 게이트웨이와 무관하게 문자열만 만든다.

use thiserror::Error;

use crate::core::classifier;
use crate::sources::songlink::ResolveError;
use crate::sources::LinkResolver;

pub const ABOUT: &str = "about";
pub const CONVERT: &str = "convert";
/// `/convert`의 필수 문자열 옵션 이름.
pub const LINK_OPTION: &str = "link";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Convert Error: Did not input link")]
    MissingLink,
    #[error("Convert Error: Content is not a link")]
    NotALink,
    #[error("Convert Error: Unable to convert to apple music link")]
    NoAppleMusicLink,
    #[error("Convert Error: {0}")]
    Upstream(ResolveError),
}

pub fn split_authors(authors: &str) -> String {
    authors
        .split(':')
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 버전과 작성자 정보.
pub fn about() -> String {
    format!(
        "Version: {}\nAuthor(s): {}",
        env!("CARGO_PKG_VERSION"),
        split_authors(env!("CARGO_PKG_AUTHORS"))
    )
}

/// song.link가 아는 아무 링크나 Apple Music 링크로 바꾼다.
pub async fn convert(resolver: &dyn LinkResolver, link: Option<&str>) -> Result<String, ConvertError> {
    let link = link
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(ConvertError::MissingLink)?;
    let url = classifier::find_url(link).ok_or(ConvertError::NotALink)?;

    match resolver.to_apple_music(url).await {
        Ok(apple_url) => Ok(apple_url),
        Err(ResolveError::NoAppleMusicLink) => Err(ConvertError::NoAppleMusicLink),
        Err(e) => Err(ConvertError::Upstream(e)),
    }
}

/// 명령 이름에 맞는 응답. 실패도 사용자에게 보여줄 문구로 바꾼다.
pub async fn respond(name: &str, link: Option<&str>, resolver: &dyn LinkResolver) -> String {
    match name {
        ABOUT => about(),
        CONVERT => convert(resolver, link)
            .await
            .unwrap_or_else(|e| e.to_string()),
        _ => "not implemented".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    struct StubResolver {
        reply: Option<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    impl StubResolver {
        fn new(reply: Option<&'static str>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LinkResolver for StubResolver {
        async fn to_apple_music(&self, url: &str) -> Result<String, ResolveError> {
            self.seen.lock().unwrap().push(url.to_string());
            self.reply
                .map(str::to_string)
                .ok_or(ResolveError::NoAppleMusicLink)
        }
    }

    #[test]
    fn test_split_authors() {
        assert_eq!(split_authors("a <a@x>:b <b@x>"), "a <a@x>, b <b@x>");
        assert_eq!(split_authors(""), "");
    }

    #[test]
    fn test_about() {
        let text = about();
        assert!(text.starts_with(&format!("Version: {}\n", env!("CARGO_PKG_VERSION"))));
        assert!(text.contains("Author(s): Cider Collective"));
    }

    #[tokio::test]
    async fn test_convert_any_resolvable_link() {
        let resolver = StubResolver::new(Some("https://music.apple.com/us/album/_/1?i=2"));
        let text = respond(
            CONVERT,
            Some("https://www.youtube.com/watch?v=D1PvIWdJ8xo"),
            &resolver,
        )
        .await;

        assert_eq!(text, "https://music.apple.com/us/album/_/1?i=2");
        assert_eq!(
            *resolver.seen.lock().unwrap(),
            vec!["https://www.youtube.com/watch?v=D1PvIWdJ8xo".to_string()]
        );
    }

    #[tokio::test]
    async fn test_convert_rejects_plain_text() {
        let resolver = StubResolver::new(Some("unused"));
        let text = respond(CONVERT, Some("not a link"), &resolver).await;

        assert_eq!(text, "Convert Error: Content is not a link");
        assert!(resolver.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_convert_missing_link() {
        let resolver = StubResolver::new(None);
        assert!(matches!(
            convert(&resolver, None).await,
            Err(ConvertError::MissingLink)
        ));
    }

    #[tokio::test]
    async fn test_convert_without_apple_equivalent() {
        let resolver = StubResolver::new(None);
        let text = respond(CONVERT, Some("https://open.spotify.com/track/x1y2"), &resolver).await;
        assert_eq!(text, "Convert Error: Unable to convert to apple music link");
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let resolver = StubResolver::new(None);
        assert_eq!(respond("ping", None, &resolver).await, "not implemented");
    }
}
