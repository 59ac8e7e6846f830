// Heuristic Scorer
// Rule-based AI likelihood from readability and lexical statistics
//
// Each factor is banded: the tight band is tested first and the looser band is
// only reached when the tight one misses. Boundaries are part of the scoring
// contract; changing the comparison operators changes reported scores.

use crate::models::{Confidence, HeuristicResult, TextMetrics};
use crate::services::text_processor::{compute_text_metrics, TextError};
use tracing::{debug, warn};

/// Uniform sentence lengths are typical of generated text.
fn variance_points(variance: f64) -> u32 {
    if variance < 10.0 {
        25
    } else if variance < 20.0 {
        15
    } else {
        0
    }
}

/// Generated prose tends to aim for a "plain English" Flesch score.
fn reading_ease_points(ease: f64) -> u32 {
    if (55.0..=75.0).contains(&ease) {
        25
    } else if (45.0..85.0).contains(&ease) {
        15
    } else {
        0
    }
}

fn grade_level_points(grade: f64) -> u32 {
    if (8.0..=12.0).contains(&grade) {
        20
    } else if (6.0..14.0).contains(&grade) {
        10
    } else {
        0
    }
}

/// Low lexical diversity means repetitive wording.
fn unique_ratio_points(ratio: f64) -> u32 {
    if ratio < 0.4 {
        30
    } else if ratio < 0.6 {
        15
    } else {
        0
    }
}

/// Sum of the four rule factors, clamped to 0..=100.
pub fn score_metrics(metrics: &TextMetrics) -> u32 {
    let total = variance_points(metrics.sentence_length_variance)
        + reading_ease_points(metrics.flesch_reading_ease)
        + grade_level_points(metrics.flesch_kincaid_grade)
        + unique_ratio_points(metrics.unique_word_ratio);
    total.min(100)
}

/// Heuristic-only assessment of a document.
///
/// Too-short text yields the neutral {50, low}; any other measurement failure
/// yields {0, error} with the failure as reason.
pub fn analyze_heuristics(text: &str) -> HeuristicResult {
    match compute_text_metrics(text) {
        Ok(metrics) => {
            let score = f64::from(score_metrics(&metrics));
            debug!(score, ?metrics, "[HEURISTIC] scored");
            HeuristicResult {
                score,
                confidence: Confidence::from_score(score),
                metrics: Some(metrics),
                reason: None,
            }
        }
        Err(TextError::InsufficientText { found }) => {
            debug!(found, "[HEURISTIC] too few sentences, returning neutral score");
            HeuristicResult::insufficient("Text too short")
        }
        Err(e) => {
            warn!("[HEURISTIC] metrics unavailable: {}", e);
            HeuristicResult::failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(variance: f64, ease: f64, grade: f64, ratio: f64) -> TextMetrics {
        TextMetrics {
            flesch_reading_ease: ease,
            flesch_kincaid_grade: grade,
            avg_sentence_length: 15.0,
            sentence_length_variance: variance,
            unique_word_ratio: ratio,
        }
    }

    #[test]
    fn test_variance_band_boundaries() {
        assert_eq!(variance_points(9.99), 25);
        assert_eq!(variance_points(10.0), 15);
        assert_eq!(variance_points(19.99), 15);
        assert_eq!(variance_points(20.0), 0);
    }

    #[test]
    fn test_reading_ease_bands() {
        assert_eq!(reading_ease_points(55.0), 25);
        assert_eq!(reading_ease_points(75.0), 25);
        assert_eq!(reading_ease_points(54.99), 15);
        assert_eq!(reading_ease_points(45.0), 15);
        assert_eq!(reading_ease_points(84.99), 15);
        assert_eq!(reading_ease_points(85.0), 0);
        assert_eq!(reading_ease_points(44.99), 0);
    }

    #[test]
    fn test_grade_level_bands() {
        assert_eq!(grade_level_points(8.0), 20);
        assert_eq!(grade_level_points(12.0), 20);
        assert_eq!(grade_level_points(12.5), 10);
        assert_eq!(grade_level_points(6.0), 10);
        assert_eq!(grade_level_points(14.0), 0);
        assert_eq!(grade_level_points(5.9), 0);
    }

    #[test]
    fn test_unique_ratio_bands() {
        assert_eq!(unique_ratio_points(0.39), 30);
        assert_eq!(unique_ratio_points(0.4), 15);
        assert_eq!(unique_ratio_points(0.59), 15);
        assert_eq!(unique_ratio_points(0.6), 0);
    }

    #[test]
    fn test_score_metrics_maximum() {
        assert_eq!(score_metrics(&metrics(5.0, 65.0, 10.0, 0.3)), 100);
    }

    #[test]
    fn test_score_metrics_mixed_bands() {
        // 15 + 15 + 10 + 15
        assert_eq!(score_metrics(&metrics(10.0, 80.0, 13.0, 0.5)), 55);
        assert_eq!(score_metrics(&metrics(30.0, 100.0, 20.0, 0.9)), 0);
    }

    #[test]
    fn test_score_metrics_is_deterministic() {
        let m = metrics(12.0, 60.0, 7.0, 0.45);
        let first = score_metrics(&m);
        for _ in 0..10 {
            assert_eq!(score_metrics(&m), first);
        }
    }

    #[test]
    fn test_analyze_heuristics_short_text_is_neutral() {
        let result = analyze_heuristics("Only one sentence here. And a second.");
        assert_eq!(result.score, 50.0);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.metrics.is_none());
        assert_eq!(result.reason.as_deref(), Some("Text too short"));
    }

    #[test]
    fn test_analyze_heuristics_without_words_is_error() {
        let result = analyze_heuristics("-- . ++ . ** .");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, Confidence::Error);
        assert!(result.reason.is_some());
    }

    #[test]
    fn test_analyze_heuristics_measured() {
        let result = analyze_heuristics("The cat sat down. The dog ran off. The bird flew by.");
        // variance 0 -> 25; ease 118 -> 0; grade -2.2 -> 0; ratio 0.83 -> 0
        assert_eq!(result.score, 25.0);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.is_measured());
    }
}
