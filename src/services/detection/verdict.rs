// Verdict utilities
// Fixed thresholds mapping the final scores to labels and a risk level.

use crate::models::{OverallVerdict, RiskLevel};

const AI_GENERATED_ABOVE: f64 = 60.0;
const HUMAN_WRITTEN_BELOW: f64 = 40.0;
const PLAGIARIZED_ABOVE: f64 = 30.0;

const HIGH_RISK_AI_ABOVE: f64 = 70.0;
const HIGH_RISK_PLAGIARISM_ABOVE: f64 = 50.0;
const MEDIUM_RISK_AI_ABOVE: f64 = 50.0;
const MEDIUM_RISK_PLAGIARISM_ABOVE: f64 = 30.0;

pub fn risk_level(ai_score: f64, plagiarism_score: f64) -> RiskLevel {
    if ai_score > HIGH_RISK_AI_ABOVE || plagiarism_score > HIGH_RISK_PLAGIARISM_ABOVE {
        RiskLevel::High
    } else if ai_score > MEDIUM_RISK_AI_ABOVE || plagiarism_score > MEDIUM_RISK_PLAGIARISM_ABOVE {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn classify_risk(ai_score: f64, plagiarism_score: f64) -> OverallVerdict {
    OverallVerdict {
        ai_generated: ai_score > AI_GENERATED_ABOVE,
        plagiarized: plagiarism_score > PLAGIARIZED_ABOVE,
        risk_level: risk_level(ai_score, plagiarism_score),
    }
}

pub fn ai_verdict_label(ai_score: f64) -> &'static str {
    if ai_score > AI_GENERATED_ABOVE {
        "Likely AI-generated"
    } else if ai_score < HUMAN_WRITTEN_BELOW {
        "Likely human-written"
    } else {
        "Uncertain"
    }
}
