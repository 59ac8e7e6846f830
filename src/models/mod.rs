// TextGuard Data Models
// Serialisable value types shared by the scoring engine and the report surface

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Text Metrics ============

/// Sentence- and word-level statistics of a document.
///
/// All fields are finite; construction goes through
/// [`compute_text_metrics`](crate::services::text_processor::compute_text_metrics),
/// which refuses degenerate input instead of producing NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    pub avg_sentence_length: f64,
    pub sentence_length_variance: f64,
    pub unique_word_ratio: f64,
}

impl TextMetrics {
    /// Copy with every field rounded to two decimals, as surfaced in reports.
    pub fn rounded(&self) -> Self {
        Self {
            flesch_reading_ease: round2(self.flesch_reading_ease),
            flesch_kincaid_grade: round2(self.flesch_kincaid_grade),
            avg_sentence_length: round2(self.avg_sentence_length),
            sentence_length_variance: round2(self.sentence_length_variance),
            unique_word_ratio: round2(self.unique_word_ratio),
        }
    }
}

// ============ Heuristic Scoring ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
    Error,
}

impl Confidence {
    /// Label for a numeric AI score: >60 high, >40 medium, otherwise low.
    pub fn from_score(score: f64) -> Self {
        if score > 60.0 {
            Self::High
        } else if score > 40.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicResult {
    pub score: f64,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TextMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HeuristicResult {
    /// Neutral "no opinion" result used when the text is too short to measure.
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self {
            score: 50.0,
            confidence: Confidence::Low,
            metrics: None,
            reason: Some(reason.into()),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            confidence: Confidence::Error,
            metrics: None,
            reason: Some(reason.into()),
        }
    }

    /// True when the score came from measured metrics rather than a fallback.
    pub fn is_measured(&self) -> bool {
        self.metrics.is_some()
    }
}

// ============ External Signals ============

/// Which slot of the fallback chain produced an opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Primary,
    Secondary,
}

impl Provenance {
    pub fn from_position(index: usize) -> Self {
        if index == 0 {
            Self::Primary
        } else {
            Self::Secondary
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalOpinion {
    pub score: f64,
    pub provenance: Provenance,
    /// Provider and model that answered, e.g. `openai:gpt-4o-mini`.
    pub provider: String,
}

/// Probabilities reported by a dedicated detection service, scaled to 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub completely_generated_prob: f64,
    pub average_generated_prob: f64,
}

// ============ Plagiarism ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismMatch {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub matched_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlagiarismResult {
    pub score: f64,
    pub sources: Vec<PlagiarismMatch>,
    pub chunks_checked: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PlagiarismResult {
    pub fn unavailable(note: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            sources: Vec::new(),
            chunks_checked: 0,
            note: Some(note.into()),
        }
    }
}

// ============ Verdict ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallVerdict {
    pub ai_generated: bool,
    pub plagiarized: bool,
    pub risk_level: RiskLevel,
}

// ============ Report ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub total_words: usize,
    pub total_characters: usize,
    pub total_sentences: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiDetection {
    /// Final AI probability (0-100, two decimals).
    pub probability: f64,
    /// Derived from the heuristic score before any blending.
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TextMetrics>,
    pub verdict: String,
    pub external_opinion: Option<ExternalOpinion>,
    pub gptzero: Option<DetectorResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub analyzed_at: String,
    pub text_stats: TextStats,
    pub ai_detection: AiDetection,
    pub plagiarism: PlagiarismResult,
    pub overall_verdict: OverallVerdict,
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
