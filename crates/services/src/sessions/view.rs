use quiz_core::model::{Quiz, QuestionId};

/// Headline shown on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Perfect,
    WellDone,
    BetterLuckNextTime,
}

impl Verdict {
    /// `Perfect` needs every question right; `WellDone` needs more than half.
    #[must_use]
    pub fn for_score(score: u32, total: u32) -> Self {
        if total > 0 && score == total {
            Self::Perfect
        } else if u64::from(score) * 2 > u64::from(total) {
            Self::WellDone
        } else {
            Self::BetterLuckNextTime
        }
    }

    #[must_use]
    pub fn headline(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect Score!",
            Self::WellDone => "Well Done!",
            Self::BetterLuckNextTime => "Better Luck Next Time!",
        }
    }
}

/// One row of the per-question review on the results screen.
///
/// Raw option indices and texts for one question; the front-end decides how
/// the row is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub question: String,
    pub selected: Option<usize>,
    pub selected_option: Option<String>,
    pub correct_answer: usize,
    pub correct_option: String,
    pub is_correct: bool,
}

/// Presentation-agnostic summary of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResults {
    pub quiz_title: String,
    pub score: u32,
    pub total: u32,
    /// Score as a rounded percentage; 0 for an empty quiz.
    pub percentage: u32,
    pub verdict: Verdict,
    pub time_spent_secs: u64,
    pub questions: Vec<QuestionReview>,
}

impl SessionResults {
    pub(crate) fn from_answers(
        quiz: &Quiz,
        answers: &[Option<usize>],
        score: u32,
        time_spent_secs: u64,
    ) -> Self {
        let total = u32::try_from(quiz.question_count()).unwrap_or(u32::MAX);
        let questions = quiz
            .questions()
            .iter()
            .enumerate()
            .map(|(position, question)| {
                let selected = answers.get(position).copied().flatten();
                QuestionReview {
                    question_id: question.id().clone(),
                    question: question.question().to_owned(),
                    selected,
                    selected_option: selected
                        .and_then(|i| question.option(i))
                        .map(str::to_owned),
                    correct_answer: question.correct_answer(),
                    correct_option: question.correct_option().unwrap_or_default().to_owned(),
                    is_correct: question.is_correct(selected),
                }
            })
            .collect();

        Self {
            quiz_title: quiz.title().to_owned(),
            score,
            total,
            percentage: rounded_percentage(score, total),
            verdict: Verdict::for_score(score, total),
            time_spent_secs,
            questions,
        }
    }

    /// Time spent rendered as `"{m}m {s}s"`.
    #[must_use]
    pub fn time_spent_label(&self) -> String {
        format_duration(self.time_spent_secs)
    }
}

fn rounded_percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score);
    let total = u64::from(total);
    u32::try_from((score * 200 + total) / (total * 2)).unwrap_or(u32::MAX)
}

/// Format seconds as whole minutes and remaining seconds, e.g. `"1m 5s"`.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    format!("{}m {}s", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::samples;

    #[test]
    fn verdict_thresholds() {
        assert_eq!(Verdict::for_score(3, 3), Verdict::Perfect);
        assert_eq!(Verdict::for_score(2, 3), Verdict::WellDone);
        assert_eq!(Verdict::for_score(1, 2), Verdict::BetterLuckNextTime);
        assert_eq!(Verdict::for_score(0, 0), Verdict::BetterLuckNextTime);
        assert_eq!(Verdict::Perfect.headline(), "Perfect Score!");
    }

    #[test]
    fn results_list_each_question_with_the_chosen_option() {
        let quiz = samples::general_knowledge_quiz();
        let results = SessionResults::from_answers(&quiz, &[Some(2), None, Some(3)], 1, 65);

        assert_eq!(results.total, 3);
        assert_eq!(results.percentage, 33);
        assert_eq!(results.verdict, Verdict::BetterLuckNextTime);
        assert_eq!(results.time_spent_label(), "1m 5s");

        let first = &results.questions[0];
        assert!(first.is_correct);
        assert_eq!(first.selected_option.as_deref(), Some("Paris"));

        let second = &results.questions[1];
        assert!(!second.is_correct);
        assert_eq!(second.selected_option, None);
        assert_eq!(second.correct_option, "Mars");

        assert_eq!(results.questions[2].selected_option.as_deref(), Some("Michelangelo"));
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 8), 13);
        assert_eq!(rounded_percentage(0, 0), 0);
    }

    #[test]
    fn durations_format_as_minutes_and_seconds() {
        assert_eq!(format_duration(0), "0m 0s");
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(125), "2m 5s");
    }
}
