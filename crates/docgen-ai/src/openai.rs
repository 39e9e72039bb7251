//! OpenAI-compatible chat completion client

use crate::client::{GenerationRequest, TextGenerator};
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// HTTP client for `POST {endpoint}/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client for `endpoint` (no trailing slash needed)
    ///
    /// # Errors
    /// `GenerationError::Transport` if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut builder = self.client.post(self.url()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(model = %request.model, url = %self.url(), "sending completion request");
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(status.as_u16(), body));
        }

        let body = response.text().await?;
        extract_content(&body)
    }
}

/// Pull the first choice's content out of a completion response body
///
/// # Errors
/// `GenerationError::InvalidOutput` when the body is not a completion or the
/// content is missing or blank.
pub fn extract_content(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidOutput(format!("malformed completion: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GenerationError::InvalidOutput("empty completion".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn empty_choices_is_invalid_output() {
        let err = extract_content(r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(err, GenerationError::InvalidOutput("empty completion".into()));
        assert!(err.is_retryable());
    }

    #[test]
    fn null_content_is_invalid_output() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert!(matches!(
            extract_content(body),
            Err(GenerationError::InvalidOutput(_))
        ));
    }

    #[test]
    fn garbage_is_invalid_output() {
        assert!(matches!(
            extract_content("<html>bad gateway</html>"),
            Err(GenerationError::InvalidOutput(_))
        ));
    }

    #[test]
    fn endpoint_trailing_slash_trimmed() {
        let client =
            OpenAiClient::new("http://localhost:8080/v1/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1");
        assert_eq!(client.url(), "http://localhost:8080/v1/chat/completions");
    }
}
