//! Completeness checklist for generated drafts.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistItem {
    pub item: &'static str,
    pub present: bool,
}

const CHECKS: &[(&str, &[&str])] = &[
    ("Product or service named", &["product", "item", "service", "goods", "equipment", "material"]),
    ("Quantity or specification", &["quantity", "unit", "pcs", "spec", "model", "ton", "kg"]),
    ("Delivery date or deadline", &["delivery", "deadline", "date", "schedule", "shipment", "until"]),
    ("Incoterms rule", &["fob", "cif", "exw", "ddp", "dap", "cfr", "incoterm"]),
    ("Payment terms", &["payment", "t/t", "l/c", "deposit", "balance", "wire transfer"]),
];

/// Which of the five essentials a draft mentions.
pub fn checklist(email: &str) -> Vec<ChecklistItem> {
    let lower = email.to_lowercase();
    CHECKS
        .iter()
        .map(|(item, keywords)| ChecklistItem {
            item,
            present: keywords.iter().any(|k| lower.contains(k)),
        })
        .collect()
}
