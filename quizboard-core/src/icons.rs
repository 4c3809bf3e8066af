//! Icon lookup for generated tiles.

use crate::content::TileConcept;
use async_trait::async_trait;
use serde::Deserialize;

/// Public Iconify search endpoint.
pub const ICONIFY_SEARCH_URL: &str = "https://api.iconify.design/search";

/// Icons used, by property ordinal, when a lookup finds nothing.
pub const FALLBACK_ICONS: [&str; 5] = [
    "mdi:circle",
    "mdi:square",
    "mdi:triangle",
    "mdi:hexagon",
    "mdi:star",
];

/// Keyword to icon identifier lookup.
#[async_trait]
pub trait IconSearch: Send + Sync {
    /// Best match for `keyword`, or `None`. Failures are never fatal.
    async fn search(&self, keyword: &str) -> Option<String>;
}

/// Fallback icon for the property at `ordinal` (0..16).
pub fn fallback_icon(ordinal: usize) -> &'static str {
    FALLBACK_ICONS[ordinal % FALLBACK_ICONS.len()]
}

/// Resolve one icon per concept, sequentially, falling back to the pool.
pub async fn resolve_icons(concepts: &[TileConcept], search: &dyn IconSearch) -> Vec<String> {
    let mut icons = Vec::with_capacity(concepts.len());
    for (ordinal, concept) in concepts.iter().enumerate() {
        let icon = match search.search(&concept.keyword).await {
            Some(icon) => icon,
            None => {
                tracing::debug!(keyword = %concept.keyword, ordinal, "No icon found, using fallback");
                fallback_icon(ordinal).to_string()
            }
        };
        icons.push(icon);
    }
    icons
}

/// Search that never finds anything; every tile gets a fallback icon.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIcons;

#[async_trait]
impl IconSearch for NoIcons {
    async fn search(&self, _keyword: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    icons: Vec<String>,
}

/// Iconify HTTP search client.
#[derive(Debug, Clone)]
pub struct IconifyClient {
    http: reqwest::Client,
    search_url: String,
}

impl Default for IconifyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl IconifyClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            search_url: ICONIFY_SEARCH_URL.to_string(),
        }
    }

    /// Point at a different search endpoint (self-hosted Iconify API).
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    async fn lookup(&self, keyword: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .http
            .get(&self.search_url)
            .query(&[("query", keyword), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;
        let body: SearchResponse = response.json().await?;
        Ok(body.icons.into_iter().next())
    }
}

#[async_trait]
impl IconSearch for IconifyClient {
    async fn search(&self, keyword: &str) -> Option<String> {
        if keyword.trim().is_empty() {
            return None;
        }
        match self.lookup(keyword).await {
            Ok(icon) => icon,
            Err(e) => {
                tracing::warn!(keyword, error = %e, "Icon search failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockIcons;

    #[test]
    fn test_fallback_icon_cycles() {
        assert_eq!(fallback_icon(0), "mdi:circle");
        assert_eq!(fallback_icon(4), "mdi:star");
        assert_eq!(fallback_icon(5), "mdi:circle");
        assert_eq!(fallback_icon(15), "mdi:circle");
    }

    #[tokio::test]
    async fn test_resolve_mixes_hits_and_fallbacks() {
        let icons = MockIcons::new().with_icon("truck", "mdi:truck");
        let concepts = vec![
            TileConcept::new("Freight", "truck"),
            TileConcept::new("Storage", "warehouse"),
            TileConcept::new("Routes", "map"),
        ];

        let resolved = resolve_icons(&concepts, &icons).await;
        assert_eq!(resolved, vec!["mdi:truck", "mdi:square", "mdi:triangle"]);
        assert_eq!(icons.lookups(), vec!["truck", "warehouse", "map"]);
    }

    #[tokio::test]
    async fn test_no_icons_uses_pool() {
        let concepts = vec![TileConcept::new("A", "a"); 6];
        let resolved = resolve_icons(&concepts, &NoIcons).await;
        assert_eq!(resolved[5], "mdi:circle");
    }

    #[test]
    fn test_search_response_parses() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"icons": ["mdi:sword", "game-icons:sword"], "total": 2}"#).unwrap();
        assert_eq!(body.icons[0], "mdi:sword");
        let empty: SearchResponse = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(empty.icons.is_empty());
    }
}
