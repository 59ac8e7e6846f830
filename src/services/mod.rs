// TextGuard Core Services

pub mod text_processor;
pub mod config_store;
pub mod providers;
pub mod detection;

pub use text_processor::*;
pub use config_store::*;
pub use providers::*;

pub use detection::{
    analyze_heuristics,
    check_plagiarism,
    classify_risk,
    final_ai_score,
    Analyzer,
    SignalChain,
};
