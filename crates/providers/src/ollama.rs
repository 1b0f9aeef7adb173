use serde::{Deserialize, Serialize};
use shared::error::QueryError;
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct OllamaClient {
    http: reqwest::Client,
    base: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base: String, model: String) -> Self {
        Self {
            http: crate::SHARED_HTTP.clone(),
            base,
            model,
        }
    }

    /// One-shot generation against `/api/generate`. The caller builds the full
    /// prompt (system line, history, new user line); an empty `response` field
    /// is returned as-is and handled upstream.
    pub async fn generate(&self, prompt: &str) -> Result<String, QueryError> {
        let url = format!("{}/api/generate", self.base);
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let head: String = prompt.chars().take(50).collect();
        debug!(prompt_head = %head, "sending generate request");

        let resp = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if !resp.status().is_success() {
            return Err(QueryError::Http(resp.status().to_string()));
        }
        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| QueryError::Unexpected(e.to_string()))?;
        Ok(body.response)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> QueryError {
        if e.is_connect() {
            QueryError::Connection(self.base.clone())
        } else {
            QueryError::Unexpected(e.to_string())
        }
    }
}
