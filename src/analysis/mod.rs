// Heuristic analysis, AI escalation and the proximity scanner

mod alert;
mod config;
mod heuristics;
pub mod prompt;
mod service;

pub use alert::{Alert, ProposedAction, Severity};
pub use config::{AnalysisConfig, HeuristicThresholds};
pub use heuristics::HeuristicAnalyzer;
pub use service::{AnalysisService, SUGGESTION_NOTIFICATION};
