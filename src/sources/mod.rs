pub mod apple_music;
pub mod songlink;
pub mod token;

use async_trait::async_trait;

use crate::models::{CatalogLink, CatalogResource};
use apple_music::CatalogError;
use songlink::ResolveError;

/// 카탈로그 리소스를 가져오는 소스.
/// 파이프라인은 이 트레이트에만 의존한다.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// 링크가 가리키는 리소스를 조회한다. 캐시하지 않는다.
    async fn fetch_resource(&self, link: &CatalogLink) -> Result<CatalogResource, CatalogError>;
}

/// 다른 플랫폼 링크를 Apple Music 링크로 바꾸는 리졸버.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn to_apple_music(&self, url: &str) -> Result<String, ResolveError>;
}
