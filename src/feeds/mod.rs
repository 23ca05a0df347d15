pub mod search;

use async_trait::async_trait;

use crate::post::SearchEnvelope;

pub use search::{build_search_url, decode_envelope, HttpSearchFetcher};

/// Why a search request produced no envelope.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search endpoint returned HTTP {0}")]
    Status(u16),

    #[error("search response is not a valid envelope: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait SearchFetcher: Send + Sync {
    async fn fetch(&self) -> Result<SearchEnvelope, FetchError>;
}
