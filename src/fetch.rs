//! The `reqwest`-blocking-backed webmention fetcher, per §4.17/§6's JF2 wire
//! contract.

use janos_core::error::FetchError;
use janos_core::webmention::{HttpFetcher, MentionsResponse, Webmention};
use std::time::Duration;

/// Per-request deadline, per §5: "Webmention requests have a per-request
/// deadline (default 10 s)".
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches `mentions.jf2` documents over HTTP.
#[derive(Debug)]
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher with the mandated request timeout.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError {
                operation: "build http client".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl HttpFetcher for ReqwestFetcher {
    fn fetch_mentions(
        &self,
        endpoint: &str,
        target_url: &str,
        per_page: u32,
        since_id: Option<i64>,
    ) -> Result<Vec<Webmention>, FetchError> {
        let base = format!("{}/mentions.jf2", endpoint.trim_end_matches('/'));
        let mut params = vec![
            ("target".to_string(), target_url.to_string()),
            ("per-page".to_string(), per_page.to_string()),
        ];
        if let Some(id) = since_id {
            params.push(("since_id".to_string(), id.to_string()));
        }
        let url = reqwest::Url::parse_with_params(&base, &params).map_err(|e| FetchError {
            operation: format!("build request url for {target_url}"),
            reason: e.to_string(),
        })?;

        let response = self.client.get(url).send().map_err(|e| FetchError {
            operation: format!("fetch mentions for {target_url}"),
            reason: e.to_string(),
        })?;
        let response = response.error_for_status().map_err(|e| FetchError {
            operation: format!("fetch mentions for {target_url}"),
            reason: e.to_string(),
        })?;
        let body: MentionsResponse = response.json().map_err(|e| FetchError {
            operation: format!("parse mentions response for {target_url}"),
            reason: e.to_string(),
        })?;
        Ok(body.children)
    }
}
