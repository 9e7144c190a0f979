use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Validation failures for quiz drafts.
///
/// Question and option numbers are 1-based so they can be shown to authors as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz description cannot be empty")]
    EmptyDescription,

    #[error("a quiz needs at least one question")]
    NoQuestions,

    #[error("question {question} is empty")]
    EmptyQuestion { question: usize },

    #[error("question {question} needs at least two options")]
    TooFewOptions { question: usize },

    #[error("option {option} of question {question} is empty")]
    EmptyOption { question: usize, option: usize },

    #[error("question {question} marks option {correct_answer} as correct but has {options} options")]
    CorrectAnswerOutOfRange {
        question: usize,
        correct_answer: usize,
        options: usize,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    id: QuestionId,
    question: String,
    options: Vec<String>,
    correct_answer: usize,
}

impl QuizQuestion {
    /// Rehydrate a question from storage.
    ///
    /// `correct_answer` is trusted to index into `options`; drafts are checked by
    /// [`NewQuiz::validate`] before they ever reach storage.
    #[must_use]
    pub fn from_persisted(
        id: QuestionId,
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            options,
            correct_answer,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    /// Text of the option at `index`, if it exists.
    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.option(self.correct_answer)
    }

    /// Whether `selection` is the correct answer. No selection is never correct.
    #[must_use]
    pub fn is_correct(&self, selection: Option<usize>) -> bool {
        selection == Some(self.correct_answer)
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A titled, ordered set of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Rehydrate a quiz from storage without re-running draft validation.
    #[must_use]
    pub fn from_persisted(
        id: QuizId,
        title: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<QuizQuestion>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            questions,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&QuizQuestion> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Author input for a single question, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl NewQuestion {
    #[must_use]
    pub fn new(question: impl Into<String>, options: Vec<String>, correct_answer: usize) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer,
        }
    }
}

/// Author input for a quiz, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuiz {
    pub title: String,
    pub description: String,
    pub questions: Vec<NewQuestion>,
}

impl NewQuiz {
    /// Check the draft and turn it into a `Quiz` with the given id.
    ///
    /// Question ids are derived from the quiz id and the 1-based position.
    ///
    /// # Errors
    ///
    /// Returns the first `QuizError` found, checking the title and description
    /// before walking questions in order.
    pub fn validate(self, id: QuizId) -> Result<Quiz, QuizError> {
        if self.title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(QuizError::EmptyDescription);
        }
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        let mut questions = Vec::with_capacity(self.questions.len());
        for (index, draft) in self.questions.into_iter().enumerate() {
            let number = index + 1;
            if draft.question.trim().is_empty() {
                return Err(QuizError::EmptyQuestion { question: number });
            }
            if draft.options.len() < 2 {
                return Err(QuizError::TooFewOptions { question: number });
            }
            if let Some(blank) = draft.options.iter().position(|o| o.trim().is_empty()) {
                return Err(QuizError::EmptyOption {
                    question: number,
                    option: blank + 1,
                });
            }
            if draft.correct_answer >= draft.options.len() {
                return Err(QuizError::CorrectAnswerOutOfRange {
                    question: number,
                    correct_answer: draft.correct_answer,
                    options: draft.options.len(),
                });
            }

            questions.push(QuizQuestion::from_persisted(
                QuestionId::for_position(&id, number),
                draft.question.trim(),
                draft.options,
                draft.correct_answer,
            ));
        }

        Ok(Quiz::from_persisted(
            id,
            self.title.trim(),
            self.description.trim(),
            questions,
        ))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["London".into(), "Berlin".into(), "Paris".into(), "Madrid".into()]
    }

    fn draft() -> NewQuiz {
        NewQuiz {
            title: " Capitals ".into(),
            description: "European capitals".into(),
            questions: vec![NewQuestion::new("What is the capital of France?", options(), 2)],
        }
    }

    #[test]
    fn valid_draft_assigns_question_ids() {
        let quiz = draft().validate(QuizId::new("q1")).unwrap();
        assert_eq!(quiz.title(), "Capitals");
        assert_eq!(quiz.question_count(), 1);
        assert_eq!(quiz.questions()[0].id().as_str(), "q1-1");
        assert_eq!(quiz.questions()[0].correct_option(), Some("Paris"));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut d = draft();
        d.title = "   ".into();
        assert_eq!(d.validate(QuizId::new("q")).unwrap_err(), QuizError::EmptyTitle);
    }

    #[test]
    fn blank_description_is_rejected() {
        let mut d = draft();
        d.description = String::new();
        assert_eq!(
            d.validate(QuizId::new("q")).unwrap_err(),
            QuizError::EmptyDescription
        );
    }

    #[test]
    fn draft_without_questions_is_rejected() {
        let mut d = draft();
        d.questions.clear();
        assert_eq!(d.validate(QuizId::new("q")).unwrap_err(), QuizError::NoQuestions);
    }

    #[test]
    fn blank_option_reports_one_based_position() {
        let mut d = draft();
        d.questions[0].options[1] = " ".into();
        assert_eq!(
            d.validate(QuizId::new("q")).unwrap_err(),
            QuizError::EmptyOption {
                question: 1,
                option: 2
            }
        );
    }

    #[test]
    fn out_of_range_correct_answer_is_rejected() {
        let mut d = draft();
        d.questions[0].correct_answer = 4;
        assert!(matches!(
            d.validate(QuizId::new("q")).unwrap_err(),
            QuizError::CorrectAnswerOutOfRange { question: 1, .. }
        ));
    }

    #[test]
    fn no_selection_is_never_correct() {
        let quiz = draft().validate(QuizId::new("q")).unwrap();
        let question = &quiz.questions()[0];
        assert!(!question.is_correct(None));
        assert!(!question.is_correct(Some(0)));
        assert!(question.is_correct(Some(2)));
    }

    #[test]
    fn new_quiz_reads_camel_case_json() {
        let json = r#"{
            "title": "T",
            "description": "D",
            "questions": [
                { "question": "Q", "options": ["a", "b"], "correctAnswer": 1 }
            ]
        }"#;
        let parsed: NewQuiz = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.questions[0].correct_answer, 1);
    }
}
