// LLM Analyzer
// Asks generative models for a 0-100 AI likelihood and falls back across providers:
// - primary: OpenAI chat completions
// - secondary: Gemini generateContent
// One attempt per provider, no retries; the first parsable answer wins.

use crate::models::{ExternalOpinion, Provenance};
use crate::services::providers::{with_timeout, ProviderClient, ProviderError};
use crate::services::text_processor::head_chars;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Only the head of the document is sent to a model.
pub const SAMPLE_MAX_CHARS: usize = 2000;

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

const OPENAI_SYSTEM_PROMPT: &str =
    "You are an expert at detecting AI-generated text. Respond with only a number.";
const OPENAI_TEMPERATURE: f64 = 0.3;
const OPENAI_MAX_TOKENS: i32 = 10;

/// Build the evaluation prompt for a text sample.
pub fn build_detection_prompt(sample: &str) -> String {
    format!(
        r#"Analyze the following text and determine if it was likely written by AI or a human.
Consider factors like:
- Writing style consistency
- Vocabulary sophistication
- Natural flow and transitions
- Presence of AI-typical patterns (overly formal, generic phrases)
- Human elements (personal anecdotes, unique perspectives, inconsistencies)

Text to analyze:
{sample}

Respond with ONLY a number from 0-100, where:
- 0-30 = Definitely human-written
- 31-50 = Likely human-written
- 51-70 = Uncertain/Mixed
- 71-90 = Likely AI-generated
- 91-100 = Definitely AI-generated

Your response (number only):"#
    )
}

/// Best-effort numeric extraction from free-form model output.
///
/// Keeps only ASCII digits and `.` and parses the remainder. Returns `None`
/// when nothing numeric survives, the remainder does not parse, or the value
/// falls outside 0..=100.
pub fn extract_numeric_score(text: &str) -> Option<f64> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    kept.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && (0.0..=100.0).contains(v))
}

fn parse_score(provider: &str, content: &str) -> Result<f64, ProviderError> {
    extract_numeric_score(content).ok_or_else(|| {
        ProviderError::MalformedResponse(format!(
            "{} returned no usable score: {:?}",
            provider,
            head_chars(content.trim(), 80)
        ))
    })
}

/// A generative model that can rate a text sample.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Provider and model tag, e.g. `openai:gpt-4o-mini`.
    fn name(&self) -> String;

    async fn classify(&self, sample: &str) -> Result<f64, ProviderError>;
}

/// Outcome of walking the provider chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyOutcome {
    Success {
        score: f64,
        provenance: Provenance,
        provider: String,
    },
    Unavailable,
}

impl ClassifyOutcome {
    pub fn into_opinion(self) -> Option<ExternalOpinion> {
        match self {
            Self::Success {
                score,
                provenance,
                provider,
            } => Some(ExternalOpinion {
                score,
                provenance,
                provider,
            }),
            Self::Unavailable => None,
        }
    }
}

pub struct OpenAiSignal {
    client: Arc<ProviderClient>,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiSignal {
    pub fn new(client: Arc<ProviderClient>, api_key: String, model: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            timeout,
        }
    }
}

#[async_trait]
impl SignalProvider for OpenAiSignal {
    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }

    async fn classify(&self, sample: &str) -> Result<f64, ProviderError> {
        let prompt = build_detection_prompt(sample);
        let result = self
            .client
            .call_openai(
                &self.model,
                &self.api_key,
                OPENAI_SYSTEM_PROMPT,
                &prompt,
                OPENAI_MAX_TOKENS,
                OPENAI_TEMPERATURE,
                self.timeout,
            )
            .await?;
        parse_score("openai", &result.content)
    }
}

pub struct GeminiSignal {
    client: Arc<ProviderClient>,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiSignal {
    pub fn new(client: Arc<ProviderClient>, api_key: String, model: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
            timeout,
        }
    }
}

#[async_trait]
impl SignalProvider for GeminiSignal {
    fn name(&self) -> String {
        format!("gemini:{}", self.model)
    }

    async fn classify(&self, sample: &str) -> Result<f64, ProviderError> {
        let prompt = build_detection_prompt(sample);
        let result = self
            .client
            .call_gemini(&self.model, &self.api_key, &prompt, self.timeout)
            .await?;
        parse_score("gemini", &result.content)
    }
}

/// Ordered providers; the first success stops the walk.
pub struct SignalChain {
    providers: Vec<Box<dyn SignalProvider>>,
    timeout: Duration,
}

impl SignalChain {
    pub fn new(providers: Vec<Box<dyn SignalProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Duration::from_secs(1))
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Classify the first `SAMPLE_MAX_CHARS` of `text`.
    pub async fn classify(&self, text: &str) -> ClassifyOutcome {
        let sample = head_chars(text, SAMPLE_MAX_CHARS);

        for (idx, provider) in self.providers.iter().enumerate() {
            let name = provider.name();
            let started = Instant::now();

            match with_timeout(self.timeout, provider.classify(&sample)).await {
                Ok(score) => {
                    let provenance = Provenance::from_position(idx);
                    info!(
                        "[SIGNAL] {} ({}) score={} elapsed_ms={}",
                        name,
                        provenance,
                        score,
                        started.elapsed().as_millis()
                    );
                    return ClassifyOutcome::Success {
                        score,
                        provenance,
                        provider: name,
                    };
                }
                Err(e) => {
                    warn!("[SIGNAL] {} failed: {}", name, e);
                }
            }
        }

        if !self.providers.is_empty() {
            info!("[SIGNAL] all providers failed, using heuristic-only scoring");
        }
        ClassifyOutcome::Unavailable
    }
}
