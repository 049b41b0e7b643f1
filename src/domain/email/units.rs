//! Unit consistency for quantities quoted in trade emails.
//!
//! Weights, volumes and container counts are pulled out with regexes, then
//! checked for mixed units (ton vs kg, CBM vs CFT) and mixed number
//! formatting. A standardized rendering (MT with kg, CBM, container) is
//! suggested for the first quantity of each family.

use regex::Regex;
use serde::Serialize;

use super::Severity;

const KG_PER_TON: f64 = 1000.0;
const KG_PER_LB: f64 = 0.453_592;
const CFT_PER_CBM: f64 = 35.3147;
/// Relative difference under which two weights count as the same amount.
const EQUIVALENCE_TOLERANCE: f64 = 0.05;

const WEIGHT_PATTERN: &str = r"(?i)\d+(?:,\d{3})*(?:\.\d+)?[\s,]*(?:metric\s+tons?|tons?|mt|kilograms?|kg|lbs?|pounds)\b";
const VOLUME_PATTERN: &str = r"(?i)\d+(?:,\d{3})*(?:\.\d+)?[\s,]*(?:cbm|m3|cft|cubic\s+(?:meters?|feet|ft))\b";
const CONTAINER_PATTERN: &str = r"(?i)\d+\s*x\s*(?:20|40)\s*(?:ft|')?\s*(?:hc)?\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeightUnit {
    Ton,
    Kg,
    Lb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VolumeUnit {
    Cbm,
    Cft,
}

/// One unit problem found in the email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitIssue {
    /// The quantities involved, as written.
    pub text: String,
    pub issue: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Quantities found, grouped by family, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitSummary {
    pub weight: Vec<String>,
    pub volume: Vec<String>,
    pub container: Vec<String>,
}

impl UnitSummary {
    pub fn is_empty(&self) -> bool {
        self.weight.is_empty() && self.volume.is_empty() && self.container.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitReport {
    pub inconsistencies: Vec<UnitIssue>,
    /// Suggested standard form, e.g. `20 MT (20,000 kg), 15 CBM, 1X40HC`.
    pub standardized: String,
    pub unit_summary: UnitSummary,
}

/// Compiled extractors. A pattern that fails to compile simply finds nothing.
pub struct UnitValidator {
    weight: Option<Regex>,
    volume: Option<Regex>,
    container: Option<Regex>,
}

impl UnitValidator {
    pub fn new() -> Self {
        Self {
            weight: Regex::new(WEIGHT_PATTERN).ok(),
            volume: Regex::new(VOLUME_PATTERN).ok(),
            container: Regex::new(CONTAINER_PATTERN).ok(),
        }
    }

    pub fn validate(&self, email: &str) -> UnitReport {
        let summary = UnitSummary {
            weight: extract(self.weight.as_ref(), email, collapse_whitespace),
            volume: extract(self.volume.as_ref(), email, collapse_whitespace),
            container: extract(self.container.as_ref(), email, |m| {
                m.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase()
            }),
        };

        UnitReport {
            inconsistencies: inconsistencies(&summary),
            standardized: standardize(&summary),
            unit_summary: summary,
        }
    }
}

impl Default for UnitValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn extract(regex: Option<&Regex>, text: &str, normalize: impl Fn(&str) -> String) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let Some(regex) = regex else {
        return found;
    };
    for m in regex.find_iter(text) {
        let normalized = normalize(m.as_str().trim());
        if !found.contains(&normalized) {
            found.push(normalized);
        }
    }
    found
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `"20,000 kg"` into `(20000.0, "kg")`.
fn split_quantity(quantity: &str) -> Option<(f64, String)> {
    let end = quantity
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(quantity.len());
    let (number, unit) = quantity.split_at(end);
    let value = number.trim_end_matches(',').replace(',', "").parse::<f64>().ok()?;
    let unit = unit.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    Some((value, unit.to_lowercase()))
}

fn weight_unit(unit: &str) -> WeightUnit {
    if unit.starts_with("kg") || unit.starts_with("kilogram") {
        WeightUnit::Kg
    } else if unit.starts_with("lb") || unit.starts_with("pound") {
        WeightUnit::Lb
    } else {
        WeightUnit::Ton
    }
}

fn volume_unit(unit: &str) -> VolumeUnit {
    if unit.starts_with("cft") || unit.starts_with("cubic f") {
        VolumeUnit::Cft
    } else {
        VolumeUnit::Cbm
    }
}

fn in_kg(value: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Ton => value * KG_PER_TON,
        WeightUnit::Kg => value,
        WeightUnit::Lb => value * KG_PER_LB,
    }
}

/// True when every weight is within tolerance of the first, e.g. 20 ton and
/// 20,000 kg.
fn equivalent_weights(weights: &[String]) -> bool {
    let kg: Vec<f64> = weights
        .iter()
        .filter_map(|w| split_quantity(w))
        .map(|(value, unit)| in_kg(value, weight_unit(&unit)))
        .collect();
    let Some((&base, rest)) = kg.split_first() else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    if base == 0.0 {
        return rest.iter().all(|v| *v == 0.0);
    }
    rest.iter().all(|v| ((v - base) / base).abs() <= EQUIVALENCE_TOLERANCE)
}

fn inconsistencies(summary: &UnitSummary) -> Vec<UnitIssue> {
    let mut issues = Vec::new();

    if summary.weight.len() > 1 {
        let units: Vec<WeightUnit> = summary
            .weight
            .iter()
            .filter_map(|w| split_quantity(w))
            .map(|(_, unit)| weight_unit(&unit))
            .collect();
        let mixed = units.contains(&WeightUnit::Ton) && units.contains(&WeightUnit::Kg);
        if mixed && !equivalent_weights(&summary.weight) {
            issues.push(UnitIssue {
                text: summary.weight.join(", "),
                issue: "Mixed weight units (ton and kg) with different amounts".to_string(),
                suggestion: "Use one weight unit consistently (MT preferred)".to_string(),
                severity: Severity::Medium,
            });
        }
    }

    if summary.volume.len() > 1 {
        let units: Vec<VolumeUnit> = summary
            .volume
            .iter()
            .filter_map(|v| split_quantity(v))
            .map(|(_, unit)| volume_unit(&unit))
            .collect();
        if units.contains(&VolumeUnit::Cbm) && units.contains(&VolumeUnit::Cft) {
            issues.push(UnitIssue {
                text: summary.volume.join(", "),
                issue: "Mixed volume units (CBM and CFT)".to_string(),
                suggestion: "Use one volume unit consistently (CBM preferred)".to_string(),
                severity: Severity::Medium,
            });
        }
    }

    let measures: Vec<&String> = summary.weight.iter().chain(&summary.volume).collect();
    let with_comma = measures.iter().any(|m| m.contains(','));
    let bare_thousands = measures
        .iter()
        .any(|m| !m.contains(',') && has_digit_run(m, 4));
    if with_comma && bare_thousands {
        let shown: Vec<&str> = measures.iter().take(3).map(|m| m.as_str()).collect();
        let more = if measures.len() > 3 { "..." } else { "" };
        issues.push(UnitIssue {
            text: format!("{}{}", shown.join(", "), more),
            issue: "Inconsistent number format (thousands separators)".to_string(),
            suggestion: "Use thousands separators consistently, e.g. 20,000".to_string(),
            severity: Severity::Low,
        });
    }

    issues
}

fn has_digit_run(s: &str, len: usize) -> bool {
    let mut run = 0;
    for c in s.chars() {
        if c.is_ascii_digit() {
            run += 1;
            if run >= len {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

fn standardize(summary: &UnitSummary) -> String {
    let mut parts = Vec::new();

    if let Some(first) = summary.weight.first() {
        if let Some((value, unit)) = split_quantity(first) {
            parts.push(match weight_unit(&unit) {
                WeightUnit::Ton => format!(
                    "{} MT ({} kg)",
                    format_amount(value),
                    group_thousands((value * KG_PER_TON).round() as u64)
                ),
                WeightUnit::Kg if value >= KG_PER_TON => format!(
                    "{:.1} MT ({} kg)",
                    value / KG_PER_TON,
                    group_thousands(value.round() as u64)
                ),
                WeightUnit::Kg => format!("{} kg", format_amount(value)),
                WeightUnit::Lb => first.clone(),
            });
        }
    }

    if let Some(first) = summary.volume.first() {
        match split_quantity(first) {
            Some((value, unit)) if volume_unit(&unit) == VolumeUnit::Cft => {
                parts.push(format!("{:.2} CBM (≈ {} CFT)", value / CFT_PER_CBM, format_amount(value)));
            }
            _ => parts.push(first.to_uppercase()),
        }
    }

    if let Some(first) = summary.container.first() {
        parts.push(first.clone());
    }

    parts.join(", ")
}

/// Whole numbers without a fraction, others as written.
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{}", value)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(email: &str) -> UnitReport {
        UnitValidator::new().validate(email)
    }

    #[test]
    fn all_patterns_compile() {
        let v = UnitValidator::new();
        assert!(v.weight.is_some() && v.volume.is_some() && v.container.is_some());
    }

    #[test]
    fn extracts_each_family() {
        let report = validate("We ship 20 MT of resin, about 15 cbm, in 1 x 40HC.");
        assert_eq!(report.unit_summary.weight, vec!["20 MT"]);
        assert_eq!(report.unit_summary.volume, vec!["15 cbm"]);
        assert_eq!(report.unit_summary.container, vec!["1X40HC"]);
        assert!(report.inconsistencies.is_empty());
        assert_eq!(report.standardized, "20 MT (20,000 kg), 15 CBM, 1X40HC");
    }

    #[test]
    fn different_ton_and_kg_amounts_are_flagged() {
        let report = validate("Total weight 20 ton, net 18000 kg.");
        assert_eq!(report.inconsistencies.len(), 1);
        assert_eq!(report.inconsistencies[0].severity, Severity::Medium);
        assert!(report.inconsistencies[0].issue.contains("ton and kg"));
    }

    #[test]
    fn equivalent_ton_and_kg_are_accepted() {
        let report = validate("Total 20 ton (20,000kg) as agreed.");
        assert_eq!(report.unit_summary.weight, vec!["20 ton", "20,000kg"]);
        assert!(report.inconsistencies.is_empty());
    }

    #[test]
    fn cbm_and_cft_are_flagged() {
        let report = validate("Volume 10 CBM, roughly 353 cft.");
        assert_eq!(report.inconsistencies.len(), 1);
        assert!(report.inconsistencies[0].issue.contains("CBM and CFT"));
    }

    #[test]
    fn mixed_thousands_separators_are_low_severity() {
        let report = validate("Lot A 12,000 kg and lot B 15000 kg.");
        let format_issue = report
            .inconsistencies
            .iter()
            .find(|i| i.issue.contains("number format"))
            .unwrap();
        assert_eq!(format_issue.severity, Severity::Low);
    }

    #[test]
    fn large_kg_is_standardized_to_metric_tons() {
        assert_eq!(validate("Gross 2500 kg.").standardized, "2.5 MT (2,500 kg)");
        assert_eq!(validate("Sample 40 kg.").standardized, "40 kg");
    }

    #[test]
    fn cft_is_converted_to_cbm() {
        assert_eq!(validate("About 353 cft.").standardized, "10.00 CBM (≈ 353 CFT)");
    }

    #[test]
    fn text_without_quantities_yields_empty_report() {
        let report = validate("Dear Ms. Park, thank you for the meeting.");
        assert!(report.unit_summary.is_empty());
        assert!(report.standardized.is_empty());
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
