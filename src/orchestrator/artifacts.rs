//! Typed generation artifacts.
//!
//! Each output kind has a concrete shape; [`Artifact`] is the closed union
//! the pipeline produces. Structured kinds (flashcards, quizzes) are
//! decoded from generator JSON; prose kinds (article, short post) are
//! lifted from raw text.

use serde::{Deserialize, Serialize};

use super::script::DialogueScript;

/// One study card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A titled set of flashcards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub title: String,
    pub flashcards: Vec<Flashcard>,
}

/// One multiple-choice question. `correct_answer` is the full text of the
/// correct option, not an index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: String,
}

/// A gradable multiple-choice quiz.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizSet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub recommended_time_minutes: u32,
}

impl QuizSet {
    /// Grades submitted answers by position. Missing answers count as
    /// wrong; extra answers are ignored.
    pub fn grade(&self, answers: &[String]) -> QuizGrade {
        let feedback: Vec<QuestionFeedback> = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                let submitted = answers.get(i).map(String::as_str).unwrap_or_default();
                QuestionFeedback {
                    question: question.question.clone(),
                    correct: submitted == question.correct_answer,
                    correct_answer: question.correct_answer.clone(),
                    explanation: question.explanation.clone(),
                }
            })
            .collect();
        let correct = feedback.iter().filter(|f| f.correct).count();
        QuizGrade {
            correct,
            total: self.questions.len(),
            feedback,
        }
    }
}

/// Per-question grading outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub question: String,
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

/// Result of grading one submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizGrade {
    pub correct: usize,
    pub total: usize,
    pub feedback: Vec<QuestionFeedback>,
}

/// A long-form written piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub body: String,
}

impl Article {
    /// Lifts an article out of raw generated text: everything before the
    /// first blank line is the title (any `#` heading markers stripped),
    /// the remainder is the body. Text with no blank line becomes the body
    /// of an article titled "Untitled".
    pub fn from_generated(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.split_once("\n\n") {
            Some((head, rest)) => Self {
                title: head.trim().trim_start_matches('#').trim().to_string(),
                body: rest.trim().to_string(),
            },
            None => Self {
                title: "Untitled".to_string(),
                body: trimmed.to_string(),
            },
        }
    }
}

/// A social-length post. Length is constrained at the prompt, not enforced
/// here; overlong generations pass through untruncated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShortPost {
    pub text: String,
}

/// The closed set of things the pipeline can produce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    DialogueScript(DialogueScript),
    FlashcardSet(FlashcardSet),
    QuizSet(QuizSet),
    Article(Article),
    ShortPost(ShortPost),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> QuizSet {
        QuizSet {
            title: "Basics".to_string(),
            description: String::new(),
            questions: vec![
                QuizQuestion {
                    question: "2+2?".to_string(),
                    options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
                    correct_answer: "4".to_string(),
                    explanation: "arithmetic".to_string(),
                    difficulty: "easy".to_string(),
                },
                QuizQuestion {
                    question: "3+3?".to_string(),
                    options: vec!["5".into(), "6".into(), "7".into(), "8".into()],
                    correct_answer: "6".to_string(),
                    explanation: "arithmetic".to_string(),
                    difficulty: "easy".to_string(),
                },
            ],
            total_points: 20,
            recommended_time_minutes: 5,
        }
    }

    #[test]
    fn grading_is_positional_and_missing_answers_are_wrong() {
        let grade = quiz().grade(&["4".to_string()]);
        assert_eq!(grade.correct, 1);
        assert_eq!(grade.total, 2);
        assert!(grade.feedback[0].correct);
        assert!(!grade.feedback[1].correct);
    }

    #[test]
    fn extra_answers_are_ignored() {
        let grade = quiz().grade(&["4".into(), "6".into(), "9".into()]);
        assert_eq!(grade.correct, 2);
        assert_eq!(grade.feedback.len(), 2);
    }

    #[test]
    fn article_splits_title_from_body_at_first_blank_line() {
        let article = Article::from_generated("# Memory Systems\n\nLong-term memory is...");
        assert_eq!(article.title, "Memory Systems");
        assert_eq!(article.body, "Long-term memory is...");
    }

    #[test]
    fn article_without_blank_line_is_untitled() {
        let article = Article::from_generated("one continuous block of text");
        assert_eq!(article.title, "Untitled");
        assert_eq!(article.body, "one continuous block of text");
    }
}
