//! Quiz - Multiple-choice items, their pure quality checks, and grading.

mod checks;
mod grading;
mod item;

pub use checks::{distractor_issues, structural_issues, CHOICE_COUNT};
pub use grading::{choice_letter, parse_answers, QuestionResult, QuizGrade, QuizSheet, SubmittedAnswers};
pub use item::{QuizItem, TOPIC_POOL};
