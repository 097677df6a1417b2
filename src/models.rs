/// 메시지 작성자 정보.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub avatar_url: Option<String>,
    pub bot: bool,
}

/// 채팅 플랫폼에서 들어온 원본 메시지. 파이프라인의 불변 입력이다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author: Author,
    pub content: String,
    pub webhook_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    AppleMusic,
    Spotify,
}

/// 메시지에서 찾은 첫 번째 음악 링크와 그 플랫폼.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLink {
    pub url: String,
    pub platform: Platform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Song,
    Album,
    Playlist,
    MusicVideo,
    Artist,
    Station,
}

impl ResourceKind {
    /// 카탈로그 API 경로에 쓰이는 리소스 타입 이름.
    pub fn catalog_path(&self) -> &'static str {
        match self {
            ResourceKind::Song => "songs",
            ResourceKind::Album => "albums",
            ResourceKind::Playlist => "playlists",
            ResourceKind::MusicVideo => "music-videos",
            ResourceKind::Artist => "artists",
            ResourceKind::Station => "stations",
        }
    }
}

/// Apple Music URL에서 추출한 카탈로그 조회 대상.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLink {
    pub storefront: String,
    pub kind: ResourceKind,
    pub id: String,
}

impl CatalogLink {
    pub fn api_path(&self) -> String {
        format!(
            "v1/catalog/{}/{}/{}",
            self.storefront,
            self.kind.catalog_path(),
            self.id
        )
    }
}

/// 곡 또는 뮤직비디오.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub name: String,
    pub url: String,
    pub artwork: String,
    pub artist_name: String,
    pub album_name: String,
    pub duration_ms: Option<u64>,
    pub release_date: Option<String>,
}

/// 앨범 또는 플레이리스트. 수록곡 길이 목록을 함께 가진다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub name: String,
    pub url: String,
    pub artwork: String,
    /// 앨범은 아티스트, 플레이리스트는 큐레이터.
    pub owner: Option<String>,
    pub track_durations: Vec<u64>,
}

impl Collection {
    pub fn total_duration_ms(&self) -> u64 {
        self.track_durations.iter().sum()
    }

    pub fn track_count(&self) -> usize {
        self.track_durations.len()
    }
}

/// 아티스트나 스테이션처럼 이름과 아트워크만 있는 리소스.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub name: String,
    pub url: String,
    pub artwork: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogResource {
    Song(Track),
    Video(Track),
    Album(Collection),
    Playlist(Collection),
    Artist(Profile),
    Station(Profile),
}

impl CatalogResource {
    pub fn name(&self) -> &str {
        match self {
            CatalogResource::Song(t) | CatalogResource::Video(t) => &t.name,
            CatalogResource::Album(c) | CatalogResource::Playlist(c) => &c.name,
            CatalogResource::Artist(p) | CatalogResource::Station(p) => &p.name,
        }
    }
}

/// 출력용으로 정규화된 카탈로그 리소스 요약.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayCard {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub duration: String,
    pub description: String,
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAction {
    pub label: String,
    pub url: String,
}

/// 원본 메시지를 대체할 답장.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub content: String,
    pub card: DisplayCard,
    pub footer_icon: Option<String>,
    pub actions: Vec<LinkAction>,
}

/// 카탈로그 API용 개발자 토큰.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperToken {
    pub value: String,
    /// JWT payload의 `exp` (unix seconds). 로그 용도로만 쓴다.
    pub expires_at: Option<u64>,
}
