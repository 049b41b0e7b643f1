//! Email - Rule-based checks for outgoing trade correspondence.
//!
//! These run without a model (risk patterns, unit consistency, tone, the
//! draft checklist) and back the email handler's review mode; the
//! tone heuristic doubles as the fallback when model tone analysis fails.

mod checklist;
mod risks;
mod tone;
mod units;

pub use checklist::{checklist, ChecklistItem};
pub use risks::{EmailRisk, EmailRiskDetector, Severity};
pub use tone::{heuristic_tone, ToneAnalysis};
pub use units::{UnitIssue, UnitReport, UnitSummary, UnitValidator};
