// Caller surface
// File text extraction, minimum-word gating and a content-addressed report cache
// in front of the analyzer.

use crate::models::Report;
use crate::services::detection::Analyzer;
use crate::services::text_processor::content_hash;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No text provided")]
    EmptyText,
    #[error("Text too short: {found} words, at least {min} required")]
    InsufficientWords { found: usize, min: usize },
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("Failed to extract text: {0}")]
    Extraction(String),
}

/// Extract plain text from an uploaded file.
///
/// `.pdf` goes through `pdf-extract`; `.txt` and `.md` are decoded as UTF-8.
pub fn preprocess_file(file_name: &str, bytes: &[u8]) -> Result<String, ApiError> {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let text = match ext.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ApiError::Extraction(e.to_string()))?,
        "txt" | "md" => String::from_utf8(bytes.to_vec())
            .map_err(|e| ApiError::Extraction(e.to_string()))?,
        _ => return Err(ApiError::UnsupportedFile(file_name.to_string())),
    };

    info!(
        "[API] extracted {} chars from {} ({} bytes)",
        text.chars().count(),
        file_name,
        bytes.len()
    );
    Ok(text)
}

/// Reject empty text and text with fewer than `min_words` whitespace-separated words.
pub fn ensure_min_words(text: &str, min_words: usize) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::EmptyText);
    }
    let found = text.split_whitespace().count();
    if found < min_words {
        return Err(ApiError::InsufficientWords { found, min: min_words });
    }
    Ok(())
}

/// Reports keyed by content hash.
pub trait ReportCache: Send + Sync {
    fn get(&self, report_id: &str) -> Option<Report>;
    fn put(&self, report_id: &str, report: Report);
}

#[derive(Default)]
pub struct InMemoryReportCache {
    reports: Mutex<HashMap<String, Report>>,
}

impl InMemoryReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportCache for InMemoryReportCache {
    fn get(&self, report_id: &str) -> Option<Report> {
        self.reports.lock().ok()?.get(report_id).cloned()
    }

    fn put(&self, report_id: &str, report: Report) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.insert(report_id.to_string(), report);
        }
    }
}

/// Gate, look up the cache, otherwise analyse and store.
pub async fn analyze_document(
    analyzer: &Analyzer,
    cache: &dyn ReportCache,
    text: &str,
    filename: Option<&str>,
    min_words: usize,
) -> Result<Report, ApiError> {
    ensure_min_words(text, min_words)?;

    let report_id = content_hash(text);
    if let Some(mut cached) = cache.get(&report_id) {
        info!("[API] cache hit for report {}", &report_id[..12]);
        cached.filename = filename.map(str::to_string);
        return Ok(cached);
    }

    let mut report = analyzer.analyze_text(text).await;
    report.filename = filename.map(str::to_string);
    cache.put(&report_id, report.clone());
    Ok(report)
}
