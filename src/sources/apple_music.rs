use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{CatalogLink, CatalogResource, Collection, Profile, ResourceKind, Track};
use crate::sources::token::TokenStore;
use crate::sources::CatalogSource;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no developer token available yet")]
    MissingToken,
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("non 200: {0}")]
    Status(StatusCode),
    #[error("malformed catalog response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("catalog returned no data")]
    Empty,
}

/// Apple Music 카탈로그 API 클라이언트.
/// 토큰은 저장소에서 읽기만 하고, 갱신은 하지 않는다.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
}

#[derive(Deserialize)]
struct CatalogResponse {
    data: Vec<ResourceDto>,
}

#[derive(Deserialize)]
struct ResourceDto {
    attributes: AttributesDto,
    relationships: Option<RelationshipsDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributesDto {
    name: String,
    url: String,
    artwork: Option<ArtworkDto>,
    artist_name: Option<String>,
    album_name: Option<String>,
    curator_name: Option<String>,
    duration_in_millis: Option<u64>,
    release_date: Option<String>,
}

#[derive(Deserialize)]
struct ArtworkDto {
    url: String,
}

#[derive(Deserialize)]
struct RelationshipsDto {
    tracks: Option<TrackListDto>,
}

#[derive(Deserialize)]
struct TrackListDto {
    #[serde(default)]
    data: Vec<TrackRefDto>,
}

#[derive(Deserialize)]
struct TrackRefDto {
    attributes: Option<TrackAttributesDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackAttributesDto {
    duration_in_millis: Option<u64>,
}

impl CatalogClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// `{base}/{path}`에 인증된 요청을 보내고 본문을 그대로 반환한다.
    /// 200이 아니면 본문은 읽지 않고 에러를 반환한다.
    pub async fn fetch(&self, method: Method, path: &str) -> Result<Vec<u8>, CatalogError> {
        let token = self.tokens.current().await.ok_or(CatalogError::MissingToken)?;
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, "catalog request");

        let resp = self
            .client
            .request(method, &url)
            .bearer_auth(&token.value)
            .header(reqwest::header::ORIGIN, "https://music.apple.com")
            .header(reqwest::header::REFERER, "https://music.apple.com")
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(CatalogError::Status(resp.status()));
        }

        Ok(resp.bytes().await?.to_vec())
    }

    fn convert(kind: ResourceKind, body: &[u8]) -> Result<CatalogResource, CatalogError> {
        let resp: CatalogResponse = serde_json::from_slice(body)?;
        let resource = resp.data.into_iter().next().ok_or(CatalogError::Empty)?;
        let attrs = resource.attributes;
        let artwork = attrs.artwork.map(|a| a.url).unwrap_or_default();

        let converted = match kind {
            ResourceKind::Song | ResourceKind::MusicVideo => {
                let track = Track {
                    name: attrs.name,
                    url: attrs.url,
                    artwork,
                    artist_name: attrs.artist_name.unwrap_or_default(),
                    album_name: attrs.album_name.unwrap_or_default(),
                    duration_ms: attrs.duration_in_millis,
                    release_date: attrs.release_date,
                };
                if kind == ResourceKind::Song {
                    CatalogResource::Song(track)
                } else {
                    CatalogResource::Video(track)
                }
            }
            ResourceKind::Album | ResourceKind::Playlist => {
                let track_durations = resource
                    .relationships
                    .and_then(|r| r.tracks)
                    .map(|t| t.data)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|t| t.attributes.and_then(|a| a.duration_in_millis).unwrap_or(0))
                    .collect();

                if kind == ResourceKind::Album {
                    CatalogResource::Album(Collection {
                        name: attrs.name,
                        url: attrs.url,
                        artwork,
                        owner: attrs.artist_name,
                        track_durations,
                    })
                } else {
                    CatalogResource::Playlist(Collection {
                        name: attrs.name,
                        url: attrs.url,
                        artwork,
                        owner: attrs.curator_name,
                        track_durations,
                    })
                }
            }
            ResourceKind::Artist | ResourceKind::Station => {
                let profile = Profile {
                    name: attrs.name,
                    url: attrs.url,
                    artwork,
                };
                if kind == ResourceKind::Artist {
                    CatalogResource::Artist(profile)
                } else {
                    CatalogResource::Station(profile)
                }
            }
        };

        Ok(converted)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_resource(&self, link: &CatalogLink) -> Result<CatalogResource, CatalogError> {
        let body = self.fetch(Method::GET, &link.api_path()).await?;
        Self::convert(link.kind, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeveloperToken;

    const SONG: &str = r#"{"data":[{"id":"1484218019","type":"songs","attributes":{
        "name":"Blueming","url":"https://music.apple.com/kr/album/blueming/1484218012?i=1484218019",
        "artwork":{"width":3000,"height":3000,"url":"https://is1.mzstatic.com/{w}x{h}bb.jpg"},
        "artistName":"IU","albumName":"Love poem","durationInMillis":217000,"releaseDate":"2019-11-18"}}]}"#;

    const PLAYLIST: &str = r#"{"data":[{"id":"pl.1","attributes":{
        "name":"Today's Hits","url":"https://music.apple.com/us/playlist/todays-hits/pl.1",
        "artwork":{"url":"https://is1.mzstatic.com/{w}x{h}cc.jpg"},"curatorName":"Apple Music"},
        "relationships":{"tracks":{"data":[
            {"id":"1","attributes":{"durationInMillis":120000}},
            {"id":"2","attributes":{"durationInMillis":60000}},
            {"id":"3"}]}}}]}"#;

    fn client(server: &mockito::Server, store: TokenStore) -> CatalogClient {
        CatalogClient::new(reqwest::Client::new(), server.url(), Arc::new(store))
    }

    fn link(kind: ResourceKind, id: &str) -> CatalogLink {
        CatalogLink {
            storefront: "us".to_string(),
            kind,
            id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_song() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/catalog/us/songs/1484218019")
            .match_header("authorization", "Bearer dev-token")
            .with_status(200)
            .with_body(SONG)
            .create_async()
            .await;

        let client = client(&server, TokenStore::with_token(DeveloperToken::new("dev-token")));
        let resource = client
            .fetch_resource(&link(ResourceKind::Song, "1484218019"))
            .await
            .unwrap();

        mock.assert_async().await;
        match resource {
            CatalogResource::Song(track) => {
                assert_eq!(track.name, "Blueming");
                assert_eq!(track.album_name, "Love poem");
                assert_eq!(track.duration_ms, Some(217_000));
                assert_eq!(track.artwork, "https://is1.mzstatic.com/{w}x{h}bb.jpg");
            }
            other => panic!("expected song, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_playlist_collects_track_durations() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/catalog/us/playlists/pl.1")
            .with_status(200)
            .with_body(PLAYLIST)
            .create_async()
            .await;

        let client = client(&server, TokenStore::with_token(DeveloperToken::new("t")));
        let resource = client
            .fetch_resource(&link(ResourceKind::Playlist, "pl.1"))
            .await
            .unwrap();

        match resource {
            CatalogResource::Playlist(playlist) => {
                assert_eq!(playlist.owner.as_deref(), Some("Apple Music"));
                assert_eq!(playlist.track_durations, vec![120_000, 60_000, 0]);
                assert_eq!(playlist.total_duration_ms(), 180_000);
            }
            other => panic!("expected playlist, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_200_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/catalog/us/albums/1")
            .with_status(401)
            .with_body(r#"{"errors":[{"status":"401"}]}"#)
            .create_async()
            .await;

        let client = client(&server, TokenStore::with_token(DeveloperToken::new("t")));
        let err = client
            .fetch_resource(&link(ResourceKind::Album, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Status(s) if s == StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/catalog/us/artists/1")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let client = client(&server, TokenStore::with_token(DeveloperToken::new("t")));
        let err = client
            .fetch_resource(&link(ResourceKind::Artist, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }

    #[tokio::test]
    async fn test_empty_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/catalog/us/stations/ra.1")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = client(&server, TokenStore::with_token(DeveloperToken::new("t")));
        let err = client
            .fetch_resource(&link(ResourceKind::Station, "ra.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Empty));
    }

    #[tokio::test]
    async fn test_missing_token_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client(&server, TokenStore::new());
        let err = client.fetch(Method::GET, "v1/catalog/us/songs/1").await.unwrap_err();

        assert!(matches!(err, CatalogError::MissingToken));
        mock.assert_async().await;
    }
}
