//! Trade Agent Profiler — deterministic trader profiling pipeline
//!
//! Provides:
//! - Metrics Extractor: raw trade history → derived quantitative metrics
//! - Behavioral Scorer: metrics + survey text → scores, style, persona label
//! - CSV ingestion for uploaded trade histories
//! - Chat context/prompt templating and the rule-based fallback responder
//! - Ollama client for LLM-backed chat generation
//!
//! The extractor and scorer are pure and synchronous: no I/O, no shared
//! state, safe to run concurrently across independent traders.

pub mod api;
pub mod behavior;
pub mod chat;
pub mod ingest;
pub mod metrics;
pub mod stats;
pub mod types;

// Re-exports for convenience
pub use api::OllamaClient;
pub use behavior::{
    analyze_behavior, build_persona_label, classify_response_patterns, classify_style,
    compute_behavioral_scores, volatility_preference,
};
pub use chat::{build_trader_context, create_prompt, fallback_response, TraderContext};
pub use ingest::parse_trades_csv;
pub use metrics::compute_metrics;
pub use types::*;
