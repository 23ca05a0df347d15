use super::{FetchError, SearchFetcher};
use crate::post::SearchEnvelope;
use async_trait::async_trait;
use std::time::Duration;

pub struct HttpSearchFetcher {
    url: String,
    client: reqwest::Client,
}

impl HttpSearchFetcher {
    pub fn new(url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("delaywatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { url, client }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Recent-results search URL for `query`, e.g.
/// `http://search.twitter.com/search.json?q=caltrain&rpp=100&page=1&result_type=recent`.
pub fn build_search_url(base_url: &str, query: &str, results_per_page: u32) -> String {
    format!(
        "{}?q={}&rpp={}&page=1&result_type=recent",
        base_url.trim_end_matches('?'),
        urlencoding::encode(query),
        results_per_page,
    )
}

pub fn decode_envelope(body: &str) -> Result<SearchEnvelope, FetchError> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl SearchFetcher for HttpSearchFetcher {
    async fn fetch(&self) -> Result<SearchEnvelope, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        decode_envelope(&body)
    }
}
