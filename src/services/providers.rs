// AI Provider Service
// HTTP calls to the generative models, the GPTZero detector and Google Custom Search

use crate::models::{DetectorResult, SearchHit};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const GPTZERO_DEFAULT_URL: &str = "https://api.gptzero.me/v2/predict/text";
pub const GOOGLE_SEARCH_DEFAULT_URL: &str = "https://www.googleapis.com/customsearch/v1";

const CLIENT_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured")]
    MissingApiKey,
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Bound a collaborator call; an elapsed deadline becomes `ProviderError::Timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, ProviderError>
where
    F: std::future::Future<Output = Result<T, ProviderError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(ProviderError::Timeout(timeout)))
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
}

/// Endpoint overrides; `None` falls back to the public default.
#[derive(Debug, Clone, Default)]
pub struct ProviderUrls {
    pub openai: Option<String>,
    pub gemini: Option<String>,
    pub gptzero: Option<String>,
    pub google_search: Option<String>,
}

pub struct ProviderClient {
    client: Client,
    openai_url: String,
    gemini_url: String,
    gptzero_url: String,
    search_url: String,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self::with_client(client, ProviderUrls::default())
    }

    pub fn with_proxy(proxy_url: &str, urls: ProviderUrls) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .proxy(proxy)
            .build()?;
        Ok(Self::with_client(client, urls))
    }

    pub fn with_urls(urls: ProviderUrls) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self::with_client(client, urls)
    }

    fn with_client(client: Client, urls: ProviderUrls) -> Self {
        Self {
            client,
            openai_url: urls.openai.unwrap_or_else(|| OPENAI_DEFAULT_URL.to_string()),
            gemini_url: urls.gemini.unwrap_or_else(|| GEMINI_DEFAULT_URL.to_string()),
            gptzero_url: urls.gptzero.unwrap_or_else(|| GPTZERO_DEFAULT_URL.to_string()),
            search_url: urls
                .google_search
                .unwrap_or_else(|| GOOGLE_SEARCH_DEFAULT_URL.to_string()),
        }
    }

    /// OpenAI-compatible chat completion.
    pub async fn call_openai(
        &self,
        model: &str,
        api_key: &str,
        system: &str,
        user: &str,
        max_tokens: i32,
        temperature: f64,
        timeout: Duration,
    ) -> Result<ChatResult, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens,
            temperature,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&self.openai_url)
            .timeout(timeout)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult {
            content,
            latency_ms,
        })
    }

    /// Gemini `generateContent` with a single user prompt.
    pub async fn call_gemini(
        &self,
        model: &str,
        api_key: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<ChatResult, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let url = format!("{}/{}:generateContent", self.gemini_url.trim_end_matches('/'), model);
        let request = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        // {"candidates":[{"content":{"parts":[{"text":"..."}]}}]}
        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult {
            content,
            latency_ms,
        })
    }

    /// GPTZero document prediction, probabilities scaled to 0-100.
    pub async fn call_gptzero(
        &self,
        api_key: &str,
        document: &str,
        timeout: Duration,
    ) -> Result<DetectorResult, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let response = self
            .client
            .post(&self.gptzero_url)
            .timeout(timeout)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&serde_json::json!({ "document": document }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        parse_gptzero_response(&data)
    }

    /// Google Custom Search; returns at most `num` hits.
    pub async fn call_google_search(
        &self,
        api_key: &str,
        engine_id: &str,
        query: &str,
        num: usize,
        timeout: Duration,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        if api_key.is_empty() || engine_id.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let num = num.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .timeout(timeout)
            .query(&[
                ("key", api_key),
                ("cx", engine_id),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        Ok(parse_search_items(&data))
    }
}

/// The first document must carry a numeric `average_generated_prob`; a
/// missing `completely_generated_prob` counts as zero.
fn parse_gptzero_response(data: &serde_json::Value) -> Result<DetectorResult, ProviderError> {
    let doc = data["documents"]
        .as_array()
        .and_then(|docs| docs.first())
        .filter(|doc| doc.is_object())
        .ok_or(ProviderError::MissingContent)?;

    let average = doc["average_generated_prob"].as_f64().ok_or_else(|| {
        ProviderError::MalformedResponse(format!(
            "gptzero average_generated_prob is not a number: {}",
            doc["average_generated_prob"]
        ))
    })?;

    Ok(DetectorResult {
        completely_generated_prob: doc["completely_generated_prob"].as_f64().unwrap_or(0.0) * 100.0,
        average_generated_prob: average * 100.0,
    })
}

/// A response without `items` means no hits.
fn parse_search_items(data: &serde_json::Value) -> Vec<SearchHit> {
    data["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| SearchHit {
                    title: item["title"].as_str().unwrap_or("Unknown").to_string(),
                    url: item["link"].as_str().unwrap_or_default().to_string(),
                    snippet: item["snippet"].as_str().unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_client_creation() {
        let client = ProviderClient::new();
        assert!(client.openai_url.contains("api.openai.com"));
        assert!(client.search_url.contains("customsearch"));
    }

    #[test]
    fn test_provider_urls_override() {
        let client = ProviderClient::with_urls(ProviderUrls {
            gptzero: Some("http://localhost:9000/predict".to_string()),
            ..ProviderUrls::default()
        });
        assert_eq!(client.gptzero_url, "http://localhost:9000/predict");
        assert!(client.gemini_url.contains("generativelanguage"));
    }

    #[test]
    fn test_parse_gptzero_response_scales_to_percent() {
        let data = serde_json::json!({
            "documents": [{"completely_generated_prob": 0.25, "average_generated_prob": 0.5}]
        });
        let result = parse_gptzero_response(&data).unwrap();
        assert_eq!(result.completely_generated_prob, 25.0);
        assert_eq!(result.average_generated_prob, 50.0);
    }

    #[test]
    fn test_parse_gptzero_response_without_document_fails() {
        assert!(matches!(
            parse_gptzero_response(&serde_json::json!({"documents": []})),
            Err(ProviderError::MissingContent)
        ));
        assert!(matches!(
            parse_gptzero_response(&serde_json::json!({})),
            Err(ProviderError::MissingContent)
        ));
        assert!(matches!(
            parse_gptzero_response(&serde_json::json!({"documents": ["oops"]})),
            Err(ProviderError::MissingContent)
        ));
        assert!(matches!(
            parse_gptzero_response(&serde_json::json!({"documents": [{"average_generated_prob": "high"}]})),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_search_items() {
        let data = serde_json::json!({
            "items": [
                {"title": "A", "link": "https://a.example", "snippet": "sa"},
                {"link": "https://b.example"}
            ]
        });
        let hits = parse_search_items(&data);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "A");
        assert_eq!(hits[1].title, "Unknown");
        assert_eq!(hits[1].snippet, "");

        assert!(parse_search_items(&serde_json::json!({"kind": "x"})).is_empty());
    }

    #[tokio::test]
    async fn test_with_timeout_reports_deadline() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<u32, ProviderError>(1)
        };
        let err = with_timeout(Duration::from_millis(20), slow).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(d) if d == Duration::from_millis(20)));

        let fast = async { Ok::<u32, ProviderError>(7) };
        assert_eq!(with_timeout(Duration::from_secs(1), fast).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let client = ProviderClient::new();
        let err = client
            .call_openai("gpt-4o-mini", "", "sys", "user", 10, 0.3, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));

        let err = client
            .call_google_search("key", "", "\"q\"", 3, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));
    }
}
