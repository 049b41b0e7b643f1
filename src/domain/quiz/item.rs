use serde::{Deserialize, Serialize};

/// Terms the quiz draws topics from, in rotation order.
pub const TOPIC_POOL: &[&str] = &[
    "FOB",
    "CIF",
    "EXW",
    "DDP",
    "CFR",
    "DAP",
    "Letter of Credit (L/C)",
    "Bill of Lading (B/L)",
    "HS code",
    "Demurrage",
    "Commercial invoice",
    "Certificate of origin",
];

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    #[serde(default)]
    pub quiz_id: String,
    pub question: String,
    pub choices: Vec<String>,
    /// Index into `choices`.
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_difficulty() -> String {
    "easy".to_string()
}

impl QuizItem {
    pub fn correct_choice(&self) -> Option<&str> {
        self.choices.get(self.correct_answer).map(String::as_str)
    }

    /// Client-facing view with the answer and explanation removed.
    pub fn without_answer(&self) -> serde_json::Value {
        let mut view = serde_json::json!({
            "quiz_id": self.quiz_id,
            "question": self.question,
            "choices": self.choices,
            "difficulty": self.difficulty,
        });
        if let (Some(term), Some(map)) = (&self.term, view.as_object_mut()) {
            map.insert("term".to_string(), term.clone().into());
        }
        view
    }
}
