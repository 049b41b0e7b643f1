//! Deterministic quiz checks. Each returns the issues found; empty means pass.

use super::QuizItem;
use std::collections::HashSet;

pub const CHOICE_COUNT: usize = 4;

const CATCH_ALL_CHOICES: &[&str] = &["all of the above", "none of the above", "both a and b"];

/// Shape problems: blank text, wrong choice count, answer out of range.
pub fn structural_issues(item: &QuizItem) -> Vec<String> {
    let mut issues = Vec::new();
    if item.question.trim().is_empty() {
        issues.push("Question text is empty".to_string());
    }
    if item.choices.len() != CHOICE_COUNT {
        issues.push(format!(
            "Expected {} choices, got {}",
            CHOICE_COUNT,
            item.choices.len()
        ));
    }
    if item.choices.iter().any(|c| c.trim().is_empty()) {
        issues.push("A choice is blank".to_string());
    }
    if item.correct_answer >= item.choices.len() {
        issues.push(format!(
            "correct_answer {} is out of range",
            item.correct_answer
        ));
    }
    if item.explanation.trim().is_empty() {
        issues.push("Explanation is missing".to_string());
    }
    issues
}

/// Distractor quality: duplicates and catch-all options.
pub fn distractor_issues(item: &QuizItem) -> Vec<String> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    for choice in &item.choices {
        let key = choice.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if !seen.insert(key.clone()) {
            issues.push(format!("Duplicate choice: {}", choice.trim()));
        }
        if CATCH_ALL_CHOICES.contains(&key.as_str()) {
            issues.push(format!("Catch-all choice is not allowed: {}", choice.trim()));
        }
    }
    if let (Some(correct), Some(term)) = (item.correct_choice(), item.term.as_deref()) {
        // The answer must not simply repeat the tested term.
        if correct.trim().eq_ignore_ascii_case(term.trim()) {
            issues.push("Correct choice repeats the tested term".to_string());
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(choices: &[&str], correct: usize) -> QuizItem {
        QuizItem {
            quiz_id: "q".into(),
            question: "Under FOB, when does risk pass to the buyer?".into(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
            correct_answer: correct,
            explanation: "Risk passes once goods are on board.".into(),
            term: Some("FOB".into()),
            difficulty: "easy".into(),
        }
    }

    #[test]
    fn well_formed_item_has_no_issues() {
        let q = item(&["On board the vessel", "At the factory", "At destination", "At customs"], 0);
        assert!(structural_issues(&q).is_empty());
        assert!(distractor_issues(&q).is_empty());
    }

    #[test]
    fn wrong_choice_count_and_range_are_reported() {
        let q = item(&["a", "b"], 3);
        let issues = structural_issues(&q);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("Expected 4 choices"));
    }

    #[test]
    fn blank_question_and_explanation_are_reported() {
        let mut q = item(&["a", "b", "c", "d"], 0);
        q.question = " ".into();
        q.explanation = String::new();
        assert_eq!(structural_issues(&q).len(), 2);
    }

    #[test]
    fn duplicates_are_case_insensitive() {
        let q = item(&["Seller", "seller ", "Buyer", "Carrier"], 2);
        let issues = distractor_issues(&q);
        assert_eq!(issues, vec!["Duplicate choice: seller".to_string()]);
    }

    #[test]
    fn catch_all_choice_is_rejected() {
        let q = item(&["Seller", "Buyer", "Carrier", "All of the above"], 0);
        assert_eq!(distractor_issues(&q).len(), 1);
    }

    #[test]
    fn answer_repeating_term_is_rejected() {
        let q = item(&["fob", "CIF", "EXW", "DDP"], 0);
        assert_eq!(distractor_issues(&q).len(), 1);
    }
}
