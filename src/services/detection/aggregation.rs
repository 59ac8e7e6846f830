// Aggregation Logic
// Blends the heuristic score with external opinions into the reported AI probability

use crate::models::{DetectorResult, ExternalOpinion, HeuristicResult};

pub const HEURISTIC_WEIGHT: f64 = 0.6;
pub const EXTERNAL_WEIGHT: f64 = 0.4;

/// Heuristic and model opinion mixed 60/40; the heuristic alone when no opinion exists.
pub fn blend_scores(heuristic_score: f64, opinion: Option<&ExternalOpinion>) -> f64 {
    match opinion {
        Some(op) => heuristic_score * HEURISTIC_WEIGHT + op.score * EXTERNAL_WEIGHT,
        None => heuristic_score,
    }
}

/// Second stage: simple mean with a dedicated detector's average probability.
pub fn merge_detector(blended: f64, detector: Option<&DetectorResult>) -> f64 {
    match detector {
        Some(d) => (blended + d.average_generated_prob) / 2.0,
        None => blended,
    }
}

/// Final AI probability: both blending stages, clamped to 0..=100.
///
/// Unrounded; thresholds are applied to this value and only the reported
/// probability is rounded. Confidence is not recomputed here; reports carry
/// the heuristic's own label.
pub fn final_ai_score(
    heuristic: &HeuristicResult,
    opinion: Option<&ExternalOpinion>,
    detector: Option<&DetectorResult>,
) -> f64 {
    let blended = blend_scores(heuristic.score, opinion);
    merge_detector(blended, detector).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, Provenance};

    fn heuristic(score: f64) -> HeuristicResult {
        HeuristicResult {
            score,
            confidence: Confidence::from_score(score),
            metrics: None,
            reason: None,
        }
    }

    fn opinion(score: f64) -> ExternalOpinion {
        ExternalOpinion {
            score,
            provenance: Provenance::Primary,
            provider: "test".to_string(),
        }
    }

    #[test]
    fn test_blend_without_opinion_is_heuristic() {
        assert_eq!(blend_scores(80.0, None), 80.0);
        assert_eq!(final_ai_score(&heuristic(80.0), None, None), 80.0);
    }

    #[test]
    fn test_blend_with_opinion() {
        assert!((blend_scores(80.0, Some(&opinion(60.0))) - 72.0).abs() < 1e-9);
        assert!((final_ai_score(&heuristic(80.0), Some(&opinion(60.0)), None) - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_detector_is_averaged_after_blend() {
        let detector = DetectorResult {
            completely_generated_prob: 90.0,
            average_generated_prob: 40.0,
        };
        // (72 + 40) / 2
        let score = final_ai_score(&heuristic(80.0), Some(&opinion(60.0)), Some(&detector));
        assert!((score - 56.0).abs() < 1e-9);
        assert_eq!(merge_detector(50.0, None), 50.0);
    }

    #[test]
    fn test_final_score_is_clamped_but_not_rounded() {
        // 55 * 0.6 + 33.333 * 0.4 = 46.3332
        let score = final_ai_score(&heuristic(55.0), Some(&opinion(33.333)), None);
        assert!((score - 46.3332).abs() < 1e-9);
        let near_threshold = DetectorResult {
            completely_generated_prob: 95.0008,
            average_generated_prob: 95.0008,
        };
        assert!(final_ai_score(&heuristic(25.0), None, Some(&near_threshold)) > 60.0);
        let wild = DetectorResult {
            completely_generated_prob: 500.0,
            average_generated_prob: 500.0,
        };
        assert_eq!(final_ai_score(&heuristic(100.0), None, Some(&wild)), 100.0);
    }
}
