use anyhow::{bail, Context, Result};
use url::Url;

use crate::config::StorefrontResolution;
use crate::models::{CatalogLink, ResourceKind};

/// Path segments that select a resource kind, in priority order.
const KIND_SEGMENTS: [(&str, ResourceKind); 5] = [
    ("album", ResourceKind::Album),
    ("playlist", ResourceKind::Playlist),
    ("music-video", ResourceKind::MusicVideo),
    ("artist", ResourceKind::Artist),
    ("station", ResourceKind::Station),
];

/// Parse a link that may be missing its scheme.
pub fn parse_url(raw: &str) -> Result<Url> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    Url::parse(&with_scheme).with_context(|| format!("not a valid url: {}", raw))
}

/// Determine the resource kind of an Apple Music URL.
///
/// An `i` query parameter or a `song` segment means a song. Otherwise the
/// first of album, playlist, music-video, artist, station present among the
/// path segments wins.
pub fn resource_kind(url: &Url) -> Option<ResourceKind> {
    if song_query_id(url).is_some() {
        return Some(ResourceKind::Song);
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    if segments.contains(&"song") {
        return Some(ResourceKind::Song);
    }

    KIND_SEGMENTS
        .iter()
        .find(|(segment, _)| segments.contains(segment))
        .map(|(_, kind)| *kind)
}

fn song_query_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "i")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// The storefront code is the first path segment, e.g. `us` in
/// `music.apple.com/us/album/...`.
pub fn derived_storefront(url: &Url) -> Option<String> {
    url.path_segments()?
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
}

/// Resolve an Apple Music URL to the catalog entry it points at.
///
/// Returns `Ok(None)` when the path names no supported resource kind.
pub fn parse_catalog_link(
    raw: &str,
    storefront: &StorefrontResolution,
) -> Result<Option<CatalogLink>> {
    let url = parse_url(raw)?;

    let Some(kind) = resource_kind(&url) else {
        return Ok(None);
    };

    let storefront = match storefront {
        StorefrontResolution::Derived => {
            derived_storefront(&url).context("unable to obtain storefront from url")?
        }
        StorefrontResolution::Fixed(code) => code.clone(),
    };

    let id = match (kind, song_query_id(&url)) {
        (ResourceKind::Song, Some(id)) => id,
        _ => url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(|s| s.to_string())
            .context("url has no resource id")?,
    };

    if id.is_empty() {
        bail!("url has no resource id");
    }

    Ok(Some(CatalogLink {
        storefront,
        kind,
        id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived(raw: &str) -> Option<CatalogLink> {
        parse_catalog_link(raw, &StorefrontResolution::Derived).unwrap()
    }

    #[test]
    fn test_song_from_album_query() {
        let link = derived("https://music.apple.com/us/album/blueming/1484218012?i=1484218019").unwrap();
        assert_eq!(link.kind, ResourceKind::Song);
        assert_eq!(link.id, "1484218019");
        assert_eq!(link.storefront, "us");
        assert_eq!(link.api_path(), "v1/catalog/us/songs/1484218019");
    }

    #[test]
    fn test_song_segment() {
        let link = derived("https://music.apple.com/kr/song/blueming/1484218019").unwrap();
        assert_eq!(link.kind, ResourceKind::Song);
        assert_eq!(link.id, "1484218019");
        assert_eq!(link.storefront, "kr");
    }

    #[test]
    fn test_album() {
        let link = derived("https://music.apple.com/gb/album/love-poem-ep/1484218012").unwrap();
        assert_eq!(link.kind, ResourceKind::Album);
        assert_eq!(link.api_path(), "v1/catalog/gb/albums/1484218012");
    }

    #[test]
    fn test_slug_containing_kind_word_is_not_a_match() {
        let link = derived("https://music.apple.com/us/album/songs-about-you/123").unwrap();
        assert_eq!(link.kind, ResourceKind::Album);
    }

    #[test]
    fn test_playlist_video_artist_station() {
        let playlist = derived("https://music.apple.com/us/playlist/todays-hits/pl.f4d106fed2bd41149aaacabb233eb5eb").unwrap();
        assert_eq!(playlist.kind, ResourceKind::Playlist);
        assert_eq!(playlist.id, "pl.f4d106fed2bd41149aaacabb233eb5eb");

        let video = derived("https://music.apple.com/us/music-video/eight/1511930232").unwrap();
        assert_eq!(video.kind, ResourceKind::MusicVideo);
        assert_eq!(video.api_path(), "v1/catalog/us/music-videos/1511930232");

        let artist = derived("https://music.apple.com/us/artist/iu/409076743").unwrap();
        assert_eq!(artist.kind, ResourceKind::Artist);
        assert_eq!(artist.api_path(), "v1/catalog/us/artists/409076743");

        let station = derived("https://music.apple.com/us/station/apple-music-1/ra.978194965").unwrap();
        assert_eq!(station.kind, ResourceKind::Station);
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(derived("https://music.apple.com/us/curator/apple-music-pop/976439548"), None);
        assert_eq!(derived("https://music.apple.com/us/browse"), None);
    }

    #[test]
    fn test_fixed_storefront() {
        let link = parse_catalog_link(
            "https://music.apple.com/jp/album/x/42",
            &StorefrontResolution::Fixed("us".to_string()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(link.storefront, "us");
    }

    #[test]
    fn test_missing_scheme() {
        let link = derived("music.apple.com/us/artist/iu/409076743").unwrap();
        assert_eq!(link.id, "409076743");
    }

    #[test]
    fn test_trailing_slash() {
        let link = derived("https://music.apple.com/us/artist/iu/409076743/").unwrap();
        assert_eq!(link.id, "409076743");
    }
}
