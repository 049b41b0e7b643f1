//! Answer collection and scoring for a generated quiz.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::QuizItem;

const CHOICE_LETTERS: [char; 4] = ['a', 'b', 'c', 'd'];

/// Answers parsed from a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedAnswers {
    /// Bare letters (`"A C B"`), filling unanswered questions in order.
    Sequence(Vec<usize>),
    /// Explicit question numbers (`"1:A 3:C"`), as zero-based
    /// `(question, choice)` pairs.
    Numbered(Vec<(usize, usize)>),
}

fn choice_index(token: &str) -> Option<usize> {
    let mut chars = token.chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    CHOICE_LETTERS.iter().position(|c| *c == letter)
}

/// Reads answers such as `"A C B"`, `"a, c, b"`, `"1:A 2:C"`, `"1) b 2) d"`
/// or `"1a 2c"`. Returns `None` when the text carries no answer.
pub fn parse_answers(text: &str) -> Option<SubmittedAnswers> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if ":.)(=-,;/".contains(c) { ' ' } else { c })
        .collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let letters: Option<Vec<usize>> = tokens.iter().map(|t| choice_index(t)).collect();
    if let Some(letters) = letters {
        return Some(SubmittedAnswers::Sequence(letters));
    }

    let mut pairs = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let digits_end = token.find(|c: char| !c.is_ascii_digit()).unwrap_or(token.len());
        let number = token[..digits_end].parse::<usize>().ok().filter(|n| *n > 0);
        match (number, &token[digits_end..]) {
            (Some(n), "") => {
                if let Some(choice) = tokens.get(i + 1).and_then(|t| choice_index(t)) {
                    pairs.push((n - 1, choice));
                    i += 1;
                }
            }
            (Some(n), rest) => {
                if let Some(choice) = choice_index(rest) {
                    pairs.push((n - 1, choice));
                }
            }
            (None, _) => {}
        }
        i += 1;
    }

    (!pairs.is_empty()).then_some(SubmittedAnswers::Numbered(pairs))
}

/// A quiz in progress: the questions with their answers, plus what the user
/// has picked so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSheet {
    pub questions: Vec<QuizItem>,
    /// Zero-based question index to chosen choice index.
    #[serde(default)]
    pub answers: BTreeMap<usize, usize>,
}

impl QuizSheet {
    pub fn new(questions: Vec<QuizItem>) -> Self {
        Self {
            questions,
            answers: BTreeMap::new(),
        }
    }

    /// Zero-based indices of questions still without an answer.
    pub fn unanswered(&self) -> Vec<usize> {
        (0..self.questions.len())
            .filter(|i| !self.answers.contains_key(i))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() >= self.questions.len()
    }

    /// Stores an answer if both indices are in range. Later answers replace
    /// earlier ones.
    pub fn answer(&mut self, question: usize, choice: usize) -> bool {
        match self.questions.get(question) {
            Some(item) if choice < item.choices.len() => {
                self.answers.insert(question, choice);
                true
            }
            _ => false,
        }
    }

    /// Answer keyed by `quiz_id`.
    pub fn answer_by_id(&mut self, quiz_id: &str, choice: usize) -> bool {
        match self.questions.iter().position(|q| q.quiz_id == quiz_id) {
            Some(question) => self.answer(question, choice),
            None => false,
        }
    }

    /// Applies parsed answers and returns how many were accepted.
    pub fn record(&mut self, submitted: SubmittedAnswers) -> usize {
        match submitted {
            SubmittedAnswers::Sequence(choices) => self
                .unanswered()
                .into_iter()
                .zip(choices)
                .filter(|(question, choice)| self.answer(*question, *choice))
                .count(),
            SubmittedAnswers::Numbered(pairs) => pairs
                .into_iter()
                .filter(|(question, choice)| self.answer(*question, *choice))
                .count(),
        }
    }

    /// Scores the sheet. Unanswered questions count as wrong.
    pub fn grade(&self) -> QuizGrade {
        let results: Vec<QuestionResult> = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let selected = self.answers.get(&i).copied();
                QuestionResult {
                    number: i + 1,
                    quiz_id: item.quiz_id.clone(),
                    selected,
                    correct_answer: item.correct_answer,
                    is_correct: selected == Some(item.correct_answer),
                    explanation: item.explanation.clone(),
                }
            })
            .collect();
        QuizGrade {
            score: results.iter().filter(|r| r.is_correct).count(),
            total: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    /// One-based, as shown to the user.
    pub number: usize,
    pub quiz_id: String,
    pub selected: Option<usize>,
    pub correct_answer: usize,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizGrade {
    pub score: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

/// `0 -> 'A'`.
pub fn choice_letter(index: usize) -> char {
    CHOICE_LETTERS
        .get(index)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('?')
}
