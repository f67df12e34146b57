//! Trading pattern analysis: feature extraction over a trader's recent
//! trades, composite risk scoring, and fraud alert upserts.

pub mod detector;
pub mod features;
pub mod scoring;

pub use detector::{AnalysisReport, PatternAnalyzer};
