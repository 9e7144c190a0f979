//! Pure statistics over recorded attempts.
//!
//! Nothing here is cached: callers recompute whenever they want fresh numbers.

use serde::Serialize;

use crate::model::{Quiz, QuizAttempt, QuizId, QuestionId};

/// Question labels longer than this are shortened by [`QuestionAnalytics::short_label`].
pub const SHORT_LABEL_CHARS: usize = 20;

//
// ─── QUESTION ANALYTICS ────────────────────────────────────────────────────────
//

/// How well a question performed across attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Performance {
    /// At least 70% of attempts answered correctly.
    Strong,
    /// At least 30% of attempts answered correctly.
    Moderate,
    Weak,
}

/// Correctness of one question position across all attempts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionAnalytics {
    pub question_id: QuestionId,
    pub question_text: String,
    pub correct_answers: u32,
    pub total_attempts: u32,
    /// Unrounded percentage in `0.0..=100.0`.
    pub correct_percentage: f64,
}

impl QuestionAnalytics {
    #[must_use]
    pub fn performance(&self) -> Performance {
        if self.correct_percentage >= 70.0 {
            Performance::Strong
        } else if self.correct_percentage >= 30.0 {
            Performance::Moderate
        } else {
            Performance::Weak
        }
    }

    /// Question text cut to [`SHORT_LABEL_CHARS`] characters for compact charts.
    #[must_use]
    pub fn short_label(&self) -> String {
        if self.question_text.chars().count() > SHORT_LABEL_CHARS {
            let head: String = self.question_text.chars().take(SHORT_LABEL_CHARS).collect();
            format!("{head}...")
        } else {
            self.question_text.clone()
        }
    }
}

//
// ─── QUIZ ANALYTICS ────────────────────────────────────────────────────────────
//

/// Snapshot of aggregate statistics for one quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizAnalytics {
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub question_count: u32,
    pub attempts: u32,
    pub average_score: f64,
    pub highest_score: u32,
    pub average_time_spent: f64,
    pub question_analytics: Vec<QuestionAnalytics>,
}

impl QuizAnalytics {
    /// Aggregate the attempts recorded for `quiz`.
    ///
    /// Attempts belonging to other quizzes are ignored. Returns `None` when no
    /// attempt matches, so callers never see a division by zero.
    ///
    /// Correctness is compared by position: `answers[p]` is checked against the
    /// quiz's current question `p`. Attempts recorded before the questions were
    /// reordered will be scored against the new order.
    #[must_use]
    pub fn compute(quiz: &Quiz, attempts: &[QuizAttempt]) -> Option<Self> {
        let matching: Vec<&QuizAttempt> = attempts
            .iter()
            .filter(|attempt| attempt.quiz_id() == quiz.id())
            .collect();
        if matching.is_empty() {
            return None;
        }

        let total_attempts = count_u32(matching.len());
        let denominator = f64::from(total_attempts);

        let question_analytics = quiz
            .questions()
            .iter()
            .enumerate()
            .map(|(position, question)| {
                let correct_answers = count_u32(
                    matching
                        .iter()
                        .filter(|attempt| question.is_correct(attempt.answer(position)))
                        .count(),
                );
                QuestionAnalytics {
                    question_id: question.id().clone(),
                    question_text: question.question().to_owned(),
                    correct_answers,
                    total_attempts,
                    correct_percentage: f64::from(correct_answers) / denominator * 100.0,
                }
            })
            .collect();

        let total_score: f64 = matching.iter().map(|a| f64::from(a.score())).sum();
        let highest_score = matching.iter().map(|a| a.score()).max().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let total_time: f64 = matching.iter().map(|a| a.time_spent_secs() as f64).sum();

        Some(Self {
            quiz_id: quiz.id().clone(),
            quiz_title: quiz.title().to_owned(),
            question_count: count_u32(quiz.question_count()),
            attempts: total_attempts,
            average_score: total_score / denominator,
            highest_score,
            average_time_spent: total_time / denominator,
            question_analytics,
        })
    }

    /// Average score as a percentage of the question count.
    #[must_use]
    pub fn average_score_percentage(&self) -> f64 {
        if self.question_count == 0 {
            return 0.0;
        }
        self.average_score / f64::from(self.question_count) * 100.0
    }

    /// Average correct vs. incorrect answers per attempt.
    #[must_use]
    pub fn score_distribution(&self) -> (f64, f64) {
        let correct = self.average_score;
        let incorrect = (f64::from(self.question_count) - correct).max(0.0);
        (correct, incorrect)
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewQuestion, NewQuiz};
    use crate::time::fixed_now;

    fn general_knowledge() -> Quiz {
        NewQuiz {
            title: "General Knowledge".into(),
            description: "Test your general knowledge with these questions!".into(),
            questions: vec![
                NewQuestion::new(
                    "What is the capital of France?",
                    vec!["London".into(), "Berlin".into(), "Paris".into(), "Madrid".into()],
                    2,
                ),
                NewQuestion::new(
                    "Which planet is known as the Red Planet?",
                    vec!["Earth".into(), "Mars".into(), "Venus".into(), "Jupiter".into()],
                    1,
                ),
                NewQuestion::new(
                    "Who painted the Mona Lisa?",
                    vec![
                        "Van Gogh".into(),
                        "Da Vinci".into(),
                        "Picasso".into(),
                        "Michelangelo".into(),
                    ],
                    1,
                ),
            ],
        }
        .validate(QuizId::new("1"))
        .unwrap()
    }

    fn attempt(quiz: &str, score: u32, answers: &[usize], secs: u64) -> QuizAttempt {
        QuizAttempt::new(
            QuizId::new(quiz),
            fixed_now(),
            score,
            3,
            answers.iter().copied().map(Some).collect(),
            secs,
        )
    }

    #[test]
    fn no_attempts_yields_no_data() {
        assert!(QuizAnalytics::compute(&general_knowledge(), &[]).is_none());
    }

    #[test]
    fn attempts_for_other_quizzes_yield_no_data() {
        let other = attempt("2", 3, &[2, 1, 1], 10);
        assert!(QuizAnalytics::compute(&general_knowledge(), &[other]).is_none());
    }

    #[test]
    fn two_attempts_on_general_knowledge() {
        let quiz = general_knowledge();
        let attempts = vec![attempt("1", 3, &[2, 1, 1], 20), attempt("1", 1, &[0, 1, 0], 40)];

        let stats = QuizAnalytics::compute(&quiz, &attempts).unwrap();

        assert_eq!(stats.attempts, 2);
        assert!((stats.average_score - 2.0).abs() < f64::EPSILON);
        assert_eq!(stats.highest_score, 3);
        assert!((stats.average_time_spent - 30.0).abs() < f64::EPSILON);

        let per_question: Vec<f64> = stats
            .question_analytics
            .iter()
            .map(|q| q.correct_percentage)
            .collect();
        assert!((per_question[0] - 50.0).abs() < f64::EPSILON);
        assert!((per_question[1] - 100.0).abs() < f64::EPSILON);
        assert!((per_question[2] - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nobody_answers_last_question_correctly() {
        let quiz = general_knowledge();
        let attempts = vec![attempt("1", 2, &[2, 1, 0], 20), attempt("1", 1, &[0, 1, 3], 40)];

        let stats = QuizAnalytics::compute(&quiz, &attempts).unwrap();
        assert!((stats.question_analytics[1].correct_percentage - 100.0).abs() < f64::EPSILON);
        assert!(stats.question_analytics[2].correct_percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn first_question_all_correct() {
        let quiz = general_knowledge();
        let attempts = vec![attempt("1", 3, &[2, 1, 1], 20), attempt("1", 1, &[2, 0, 0], 40)];

        let stats = QuizAnalytics::compute(&quiz, &attempts).unwrap();
        let first = &stats.question_analytics[0];
        assert_eq!(first.correct_answers, 2);
        assert!((first.correct_percentage - 100.0).abs() < f64::EPSILON);
        assert_eq!(first.performance(), Performance::Strong);
        assert_eq!(stats.question_analytics[2].performance(), Performance::Moderate);
    }

    #[test]
    fn unanswered_positions_count_as_incorrect() {
        let quiz = general_knowledge();
        let sparse = QuizAttempt::new(QuizId::new("1"), fixed_now(), 0, 3, vec![None, None], 15);

        let stats = QuizAnalytics::compute(&quiz, &[sparse]).unwrap();
        assert!(stats
            .question_analytics
            .iter()
            .all(|q| q.correct_answers == 0 && !q.correct_percentage.is_nan()));
        assert_eq!(stats.question_analytics[0].performance(), Performance::Weak);
    }

    #[test]
    fn percentage_and_distribution_helpers() {
        let quiz = general_knowledge();
        let attempts = vec![attempt("1", 3, &[2, 1, 1], 20), attempt("1", 1, &[0, 1, 0], 40)];
        let stats = QuizAnalytics::compute(&quiz, &attempts).unwrap();

        assert!((stats.average_score_percentage() - 200.0 / 3.0).abs() < 1e-9);
        let (correct, incorrect) = stats.score_distribution();
        assert!((correct - 2.0).abs() < f64::EPSILON);
        assert!((incorrect - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_label_truncates_long_questions() {
        let quiz = general_knowledge();
        let stats =
            QuizAnalytics::compute(&quiz, &[attempt("1", 3, &[2, 1, 1], 20)]).unwrap();
        assert_eq!(
            stats.question_analytics[0].short_label(),
            "What is the capital ..."
        );
        let short = QuestionAnalytics {
            question_text: "2 + 2?".into(),
            ..stats.question_analytics[0].clone()
        };
        assert_eq!(short.short_label(), "2 + 2?");
    }
}
