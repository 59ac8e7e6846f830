// Detection Module
// Risk scoring organized into specialized submodules:
// - heuristic: statistical AI-likelihood score from text metrics
// - llm_analyzer: generative-model opinion with primary -> secondary fallback
// - detector: dedicated AI-detector collaborator
// - aggregation: blends heuristic, model opinion and detector
// - plagiarism: exact-phrase web search over chunks
// - verdict: final flags and risk level
// - analyzer: runs the pipeline for one document

pub mod heuristic;
pub mod llm_analyzer;
pub mod detector;
pub mod aggregation;
pub mod plagiarism;
pub mod verdict;
pub mod analyzer;

pub use heuristic::{analyze_heuristics, score_metrics};
pub use llm_analyzer::{
    build_detection_prompt,
    extract_numeric_score,
    ClassifyOutcome,
    GeminiSignal,
    OpenAiSignal,
    SignalChain,
    SignalProvider,
};
pub use detector::{run_detector, DedicatedDetector, GptZeroDetector};
pub use aggregation::{blend_scores, final_ai_score, merge_detector};
pub use plagiarism::{check_chunks, check_plagiarism, GoogleCustomSearch, SearchCollaborator};
pub use verdict::{ai_verdict_label, classify_risk, risk_level};
pub use analyzer::Analyzer;
