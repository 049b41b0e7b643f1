//! Risk - Scoring rules and the canonical risk report.

mod report;
mod scoring;

pub use report::{
    ControlGapAnalysis, LossSimulation, PreventionStrategy, RiskReport, SimilarCase,
};
pub use scoring::{
    heuristic_factors, EvaluationItem, RiskFactor, RiskLevel, RiskScoring, EVALUATION_ITEMS,
};
