// Plagiarism Check
// Exact-phrase web search over the leading chunks of a document.
//
// Score = matched result entries / chunks checked * 100 (capped at 100). Entries,
// not chunks, are counted, so one chunk with two hits weighs twice.

use crate::models::{round2, PlagiarismMatch, PlagiarismResult, SearchHit};
use crate::services::providers::{with_timeout, ProviderClient, ProviderError};
use crate::services::text_processor::{build_search_chunks, head_chars};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Later chunks are never queried.
pub const MAX_CHUNKS_CHECKED: usize = 5;
pub const RESULTS_REQUESTED: usize = 3;
pub const RESULTS_KEPT: usize = 2;
const MATCHED_EXCERPT_CHARS: usize = 100;

/// A web search backend.
#[async_trait]
pub trait SearchCollaborator: Send + Sync {
    async fn query(&self, phrase: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError>;
}

pub struct GoogleCustomSearch {
    client: Arc<ProviderClient>,
    api_key: String,
    engine_id: String,
    timeout: Duration,
}

impl GoogleCustomSearch {
    pub fn new(client: Arc<ProviderClient>, api_key: String, engine_id: String, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            engine_id,
            timeout,
        }
    }
}

#[async_trait]
impl SearchCollaborator for GoogleCustomSearch {
    async fn query(&self, phrase: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError> {
        self.client
            .call_google_search(&self.api_key, &self.engine_id, phrase, max_results, self.timeout)
            .await
    }
}

fn to_match(hit: SearchHit, chunk: &str) -> PlagiarismMatch {
    PlagiarismMatch {
        title: hit.title,
        url: hit.url,
        snippet: hit.snippet,
        matched_text: format!("{}...", head_chars(chunk, MATCHED_EXCERPT_CHARS)),
    }
}

/// Query the first `MAX_CHUNKS_CHECKED` chunks in order and score the hits.
///
/// A failed or timed-out query contributes no evidence; the remaining chunks
/// are still checked.
pub async fn check_chunks(
    chunks: &[String],
    search: &dyn SearchCollaborator,
    timeout: Duration,
) -> PlagiarismResult {
    let total_checked = chunks.len().min(MAX_CHUNKS_CHECKED);
    let mut matches = Vec::new();

    for (i, chunk) in chunks.iter().take(total_checked).enumerate() {
        let query = format!("\"{}\"", chunk);
        match with_timeout(timeout, search.query(&query, RESULTS_REQUESTED)).await {
            Ok(hits) => {
                matches.extend(hits.into_iter().take(RESULTS_KEPT).map(|hit| to_match(hit, chunk)));
            }
            Err(e) => {
                warn!("[PLAGIARISM] search error for chunk {}: {}", i, e);
            }
        }
    }

    let score = if total_checked == 0 {
        0.0
    } else {
        (matches.len() as f64 / total_checked as f64 * 100.0).min(100.0)
    };

    info!(
        "[PLAGIARISM] chunks_checked={} of {} matches={} score={:.2}",
        total_checked,
        chunks.len(),
        matches.len(),
        score
    );

    PlagiarismResult {
        score: round2(score),
        sources: matches,
        chunks_checked: total_checked,
        note: None,
    }
}

/// Chunk the document and check it; without a search backend the result is empty.
pub async fn check_plagiarism(
    text: &str,
    search: Option<&dyn SearchCollaborator>,
    timeout: Duration,
) -> PlagiarismResult {
    let Some(search) = search else {
        return PlagiarismResult::unavailable("API keys not configured");
    };
    let chunks = build_search_chunks(text);
    check_chunks(&chunks, search, timeout).await
}
