//! Pattern-based risk detection for email drafts.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

const MAX_REPORTED: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

/// One detected problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRisk {
    pub kind: String,
    pub severity: Severity,
    /// Offending text, when a pattern matched it directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub recommendation: String,
}

/// A mention that must be backed by a detail somewhere in the email.
struct MissingDetail {
    kind: &'static str,
    severity: Severity,
    mention: Regex,
    detail: Regex,
    recommendation: &'static str,
}

struct Pattern {
    kind: &'static str,
    severity: Severity,
    regex: Regex,
    recommendation: &'static str,
}

/// Compiled rule set.
pub struct EmailRiskDetector {
    missing: Vec<MissingDetail>,
    patterns: Vec<Pattern>,
}

fn ci(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

impl EmailRiskDetector {
    pub fn new() -> Self {
        let missing = [
            (
                "payment_terms_missing",
                Severity::Critical,
                r"\bpayment\b",
                r"\b(L/C|T/T|D/P|D/A|CAD)\b",
                "Specify payment terms (L/C, T/T, D/P, D/A or CAD).",
            ),
            (
                "quantity_missing",
                Severity::Medium,
                r"\bquantity\b",
                r"\b\d+(?:[.,]\d+)?\b",
                "State the exact quantity.",
            ),
            (
                "delivery_date_missing",
                Severity::Medium,
                r"\bdelivery\b",
                r"(\d{4}[-/.]\d{1,2}[-/.]\d{1,2}|\d{1,2}[-/.]\d{1,2}|\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)(uary|ruary|ch|il|e|y|ust|t|tember|ober|ember)?\b)",
                "Give a concrete delivery date.",
            ),
        ]
        .into_iter()
        .filter_map(|(kind, severity, mention, detail, recommendation)| {
            Some(MissingDetail {
                kind,
                severity,
                mention: ci(mention)?,
                detail: ci(detail)?,
                recommendation,
            })
        })
        .collect();

        let patterns = [
            (
                "invalid_incoterm",
                Severity::Critical,
                r"\b(FOV|CIV|FOBB|CIIF)\b",
                "Use a valid Incoterms 2020 rule with a named place, e.g. FOB Busan.",
            ),
            (
                "liability_admission",
                Severity::Critical,
                r"(we (take|accept) full responsibility|fully liable|all (the )?responsibility)",
                "Avoid admitting liability before the facts are confirmed.",
            ),
            (
                "vague_terms",
                Severity::High,
                r"(discuss later|to be decided|TBD|at a later date)",
                "Replace open items with concrete terms or a decision date.",
            ),
            (
                "aggressive_tone",
                Severity::High,
                r"\b(must|immediately|urgent|ASAP)\b",
                "Use firm but polite phrasing, e.g. \"We kindly request\".",
            ),
        ]
        .into_iter()
        .filter_map(|(kind, severity, pattern, recommendation)| {
            Some(Pattern {
                kind,
                severity,
                regex: ci(pattern)?,
                recommendation,
            })
        })
        .collect();

        Self { missing, patterns }
    }

    /// Up to five risks, most severe first.
    pub fn detect(&self, email: &str) -> Vec<EmailRisk> {
        let mut risks: Vec<EmailRisk> = self
            .missing
            .iter()
            .filter(|rule| rule.mention.is_match(email) && !rule.detail.is_match(email))
            .map(|rule| EmailRisk {
                kind: rule.kind.to_string(),
                severity: rule.severity,
                excerpt: None,
                recommendation: rule.recommendation.to_string(),
            })
            .collect();

        risks.extend(self.patterns.iter().filter_map(|p| {
            p.regex.find(email).map(|m| EmailRisk {
                kind: p.kind.to_string(),
                severity: p.severity,
                excerpt: Some(m.as_str().to_string()),
                recommendation: p.recommendation.to_string(),
            })
        }));

        risks.sort_by_key(|r| r.severity);
        risks.truncate(MAX_REPORTED);
        risks
    }
}

impl Default for EmailRiskDetector {
    fn default() -> Self {
        Self::new()
    }
}
