// Analyzer
// Runs the full pipeline for one document: heuristic + model opinion + detector,
// plagiarism search, verdict. Collaborators are awaited one after another.

use crate::models::{round2, AiDetection, Report};
use crate::services::config_store::{
    AnalysisConfig, AppConfig, PROVIDER_GEMINI, PROVIDER_GOOGLE_SEARCH, PROVIDER_GPTZERO,
    PROVIDER_OPENAI,
};
use crate::services::providers::{ProviderClient, ProviderError, ProviderUrls};
use crate::services::text_processor::{content_hash, text_stats};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use super::aggregation::final_ai_score;
use super::detector::{run_detector, DedicatedDetector, GptZeroDetector};
use super::heuristic::analyze_heuristics;
use super::llm_analyzer::{GeminiSignal, OpenAiSignal, SignalChain, SignalProvider};
use super::plagiarism::{check_plagiarism, GoogleCustomSearch, SearchCollaborator};
use super::verdict::{ai_verdict_label, classify_risk};

pub struct Analyzer {
    signals: SignalChain,
    detector: Option<Box<dyn DedicatedDetector>>,
    search: Option<Box<dyn SearchCollaborator>>,
    detector_timeout: Duration,
    search_timeout: Duration,
}

impl Analyzer {
    pub fn new(
        signals: SignalChain,
        detector: Option<Box<dyn DedicatedDetector>>,
        search: Option<Box<dyn SearchCollaborator>>,
        analysis: &AnalysisConfig,
    ) -> Self {
        Self {
            signals,
            detector,
            search,
            detector_timeout: analysis.detector_timeout(),
            search_timeout: analysis.search_timeout(),
        }
    }

    /// Build the production collaborators; providers without credentials are left out.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let urls = ProviderUrls {
            openai: config.provider_url(PROVIDER_OPENAI),
            gemini: config.provider_url(PROVIDER_GEMINI),
            gptzero: config.provider_url(PROVIDER_GPTZERO),
            google_search: config.provider_url(PROVIDER_GOOGLE_SEARCH),
        };
        let client = Arc::new(match config.proxy_url() {
            Some(proxy) => ProviderClient::with_proxy(&proxy, urls)?,
            None => ProviderClient::with_urls(urls),
        });

        let creds = config.credentials();
        let analysis = &config.analysis;

        let mut providers: Vec<Box<dyn SignalProvider>> = Vec::new();
        if let Some(key) = creds.openai_api_key {
            providers.push(Box::new(OpenAiSignal::new(
                client.clone(),
                key,
                config.provider_model(PROVIDER_OPENAI),
                analysis.provider_timeout(),
            )));
        }
        if let Some(key) = creds.gemini_api_key {
            providers.push(Box::new(GeminiSignal::new(
                client.clone(),
                key,
                config.provider_model(PROVIDER_GEMINI),
                analysis.provider_timeout(),
            )));
        }

        let detector = creds.gptzero_api_key.map(|key| {
            Box::new(GptZeroDetector::new(client.clone(), key, analysis.detector_timeout()))
                as Box<dyn DedicatedDetector>
        });

        let search = match (creds.google_search_api_key, creds.google_search_engine_id) {
            (Some(key), Some(cx)) => Some(Box::new(GoogleCustomSearch::new(
                client.clone(),
                key,
                cx,
                analysis.search_timeout(),
            )) as Box<dyn SearchCollaborator>),
            _ => None,
        };

        info!(
            signal_providers = providers.len(),
            detector = detector.is_some(),
            search = search.is_some(),
            "[ANALYZER] collaborators configured"
        );

        Ok(Self::new(
            SignalChain::new(providers, analysis.provider_timeout()),
            detector,
            search,
            analysis,
        ))
    }

    /// AI-generation half of the report.
    pub async fn detect_ai(&self, text: &str) -> AiDetection {
        self.score_ai(text).await.0
    }

    /// Detection section plus the unrounded final score the thresholds use.
    async fn score_ai(&self, text: &str) -> (AiDetection, f64) {
        let heuristic = analyze_heuristics(text);

        // Too-short or unmeasurable text keeps its fallback score; no model is asked.
        let opinion = if heuristic.is_measured() {
            self.signals.classify(text).await.into_opinion()
        } else {
            None
        };

        let gptzero = run_detector(self.detector.as_deref(), text, self.detector_timeout).await;
        let score = final_ai_score(&heuristic, opinion.as_ref(), gptzero.as_ref());

        let detection = AiDetection {
            probability: round2(score),
            confidence: heuristic.confidence,
            metrics: heuristic.metrics.map(|m| m.rounded()),
            verdict: ai_verdict_label(score).to_string(),
            external_opinion: opinion,
            gptzero,
            reason: heuristic.reason,
        };
        (detection, score)
    }

    /// Analyse one document. Never fails: every collaborator failure degrades.
    pub async fn analyze_text(&self, text: &str) -> Report {
        let started = Instant::now();
        let report_id = content_hash(text);

        let (ai_detection, ai_score) = self.score_ai(text).await;
        let plagiarism = check_plagiarism(text, self.search.as_deref(), self.search_timeout).await;
        let overall_verdict = classify_risk(ai_score, plagiarism.score);

        info!(
            "[ANALYZER] report={} ai={:.2} plagiarism={:.2} risk={} elapsed_ms={}",
            &report_id[..12],
            ai_detection.probability,
            plagiarism.score,
            overall_verdict.risk_level,
            started.elapsed().as_millis()
        );

        Report {
            report_id,
            filename: None,
            analyzed_at: chrono::Local::now().to_rfc3339(),
            text_stats: text_stats(text),
            ai_detection,
            plagiarism,
            overall_verdict,
        }
    }
}
