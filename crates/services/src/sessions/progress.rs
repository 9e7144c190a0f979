/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based number of the question on screen; equals `total` once complete.
    pub question_number: usize,
    pub total: usize,
    pub answered: usize,
    /// Position of the shown question within the quiz, `0..=100`.
    pub percent: u8,
    pub remaining_secs: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    pub(crate) fn new(
        current: usize,
        total: usize,
        answered: usize,
        remaining_secs: u32,
        is_complete: bool,
    ) -> Self {
        let question_number = if is_complete {
            total
        } else {
            (current + 1).min(total)
        };
        let percent = if total == 0 {
            100
        } else {
            u8::try_from(question_number * 100 / total).unwrap_or(100)
        };
        Self {
            question_number,
            total,
            answered,
            percent,
            remaining_secs,
            is_complete,
        }
    }
}
