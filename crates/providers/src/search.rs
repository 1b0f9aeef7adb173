use serde::Deserialize;
use shared::config::SearchSettings;
use shared::error::QueryError;
use tracing::{debug, warn};

const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
const RESULT_COUNT: u32 = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
    error: Option<ApiError>,
    #[serde(rename = "searchInformation")]
    search_information: Option<SearchInformation>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: String,
    link: String,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchInformation {
    #[serde(rename = "totalResults", default)]
    total_results: String,
}

/// Google Custom Search JSON API client. Zero results and missing credentials
/// are terminal for the turn and surface as `SearchUnavailable`.
pub struct SearchClient {
    http: reqwest::Client,
    settings: SearchSettings,
}

impl SearchClient {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            http: crate::SHARED_HTTP.clone(),
            settings,
        }
    }

    pub async fn search(&self, query: &str) -> Result<String, QueryError> {
        let (key, cx) = self.credentials()?;
        debug!(query, "making Google search request");

        let num = RESULT_COUNT.to_string();
        let resp = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("key", key.trim()),
                ("cx", cx.trim()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| QueryError::Unexpected(format!("Error performing web search: {e}")))?;
        debug!(status = %resp.status(), "search response");
        if !resp.status().is_success() {
            return Err(QueryError::Unexpected(format!(
                "Error performing web search: HTTP {}",
                resp.status()
            )));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| QueryError::Unexpected(format!("Error performing web search: {e}")))?;

        match body.items {
            Some(items) if !items.is_empty() => Ok(format_results(&items)),
            _ => {
                let mut msg = "No results found for your query.".to_string();
                if let Some(err) = body.error {
                    msg.push_str(&format!(" Error: {}", err.message));
                } else if let Some(info) = body.search_information {
                    msg.push_str(&format!(" Total results: {}", info.total_results));
                }
                Err(QueryError::SearchUnavailable(msg))
            }
        }
    }

    /// Startup connectivity check. Failures are logged, never fatal; web
    /// search mode simply won't work until credentials are fixed.
    pub async fn probe(&self) -> bool {
        debug!("testing Google Search API connection");
        let (key, cx) = match self.credentials() {
            Ok(c) => c,
            Err(_) => {
                warn!("Google Search API credentials not configured");
                return false;
            }
        };
        let resp = self
            .http
            .get(SEARCH_URL)
            .query(&[("key", key.trim()), ("cx", cx.trim()), ("q", "test query"), ("num", "1")])
            .send()
            .await;
        match resp {
            Ok(r) if r.status().is_success() => {
                match r.json::<SearchResponse>().await {
                    Ok(body) if body.items.is_some() => {
                        debug!("Google Search API test successful");
                        true
                    }
                    Ok(body) => {
                        if let Some(err) = body.error {
                            warn!(error = %err.message, "Google Search API test returned no items");
                        } else {
                            warn!("Google Search API test returned no items");
                        }
                        false
                    }
                    Err(e) => {
                        warn!(error = %e, "Google Search API test response unreadable");
                        false
                    }
                }
            }
            Ok(r) => {
                warn!(status = %r.status(), "Google Search API test failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Google Search API test error");
                false
            }
        }
    }

    fn credentials(&self) -> Result<(&str, &str), QueryError> {
        match (&self.settings.api_key, &self.settings.engine_id) {
            (Some(key), Some(cx)) if !key.is_empty() && !cx.is_empty() => Ok((key, cx)),
            _ => Err(QueryError::SearchUnavailable(
                "Google Search API key or Search Engine ID is not configured. \
                 Please add your API credentials to the configuration."
                    .into(),
            )),
        }
    }
}

fn format_results(items: &[SearchItem]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, item.title));
        out.push_str(&format!("   {}\n", item.link));
        if let Some(snippet) = &item.snippet {
            out.push_str(&format!("   {}\n", snippet));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, link: &str, snippet: Option<&str>) -> SearchItem {
        SearchItem {
            title: title.into(),
            link: link.into(),
            snippet: snippet.map(Into::into),
        }
    }

    #[test]
    fn results_are_numbered_with_link_and_snippet() {
        let formatted = format_results(&[
            item("Rust", "https://rust-lang.org", Some("A language")),
            item("Crates", "https://crates.io", None),
        ]);
        assert!(formatted.starts_with("1. Rust\n   https://rust-lang.org\n   A language\n"));
        assert!(formatted.contains("2. Crates\n   https://crates.io\n"));
    }

    #[test]
    fn missing_credentials_is_search_unavailable() {
        let client = SearchClient::new(SearchSettings::default());
        let err = client.credentials().unwrap_err();
        assert!(matches!(err, shared::error::QueryError::SearchUnavailable(_)));
    }
}
