//! Selector lookup against the OpenChain signature database

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::abi::SelectorRegistry;

const DEFAULT_BASE_URL: &str = "https://api.openchain.xyz/signature-database/v1";

/// OpenChain API response structures
#[derive(Debug, Deserialize)]
struct LookupResponse {
    ok: bool,
    result: LookupResult,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    #[serde(default)]
    function: HashMap<String, Option<Vec<SignatureEntry>>>,
}

#[derive(Debug, Deserialize)]
struct SignatureEntry {
    name: String,
}

/// HTTP client for the OpenChain signature database.
///
/// Stateless: the decoder owns the schema cache, so a failed lookup is
/// naturally retried on the next miss instead of being cached.
pub struct OpenChainClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenChainClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for OpenChainClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SelectorRegistry for OpenChainClient {
    /// All candidate signatures for a selector, in registry order. A
    /// non-success status or `ok: false` yields an empty candidate list
    /// rather than an error so the caller can keep decoding.
    async fn lookup(&self, selector: [u8; 4]) -> Result<Vec<String>> {
        let selector_hex = format!("0x{}", hex::encode(selector));
        let url = format!(
            "{}/lookup?function={}&filter=true",
            self.base_url, selector_hex
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to query OpenChain API")?;

        if !response.status().is_success() {
            tracing::debug!(
                status = %response.status(),
                selector = %selector_hex,
                "OpenChain returned non-success status"
            );
            return Ok(Vec::new());
        }

        let data: LookupResponse = response
            .json()
            .await
            .context("Failed to parse OpenChain response")?;

        if !data.ok {
            tracing::debug!(selector = %selector_hex, "OpenChain returned ok=false");
            return Ok(Vec::new());
        }

        Ok(data
            .result
            .function
            .get(&selector_hex)
            .and_then(Option::as_ref)
            .map(|entries| entries.iter().map(|entry| entry.name.clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "hits the live OpenChain API"]
    async fn lookup_transfer_selector() {
        let client = OpenChainClient::new();
        // transfer(address,uint256) = 0xa9059cbb
        let candidates = client.lookup([0xa9, 0x05, 0x9c, 0xbb]).await.unwrap();
        assert!(candidates
            .iter()
            .any(|sig| sig == "transfer(address,uint256)"));
    }

    #[tokio::test]
    #[ignore = "hits the live OpenChain API"]
    async fn lookup_unknown_selector_is_empty() {
        let client = OpenChainClient::new();
        let candidates = client.lookup([0x00, 0x01, 0x02, 0x03]).await.unwrap();
        assert!(candidates.is_empty());
    }
}
