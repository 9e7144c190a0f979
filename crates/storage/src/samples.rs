//! Built-in example content used by the seed binary and tests.

use quiz_core::model::{NewQuestion, NewQuiz, Quiz, QuizId};

/// Id of the bundled "General Knowledge" quiz.
pub const GENERAL_KNOWLEDGE_ID: &str = "1";

/// Draft of the bundled "General Knowledge" quiz.
#[must_use]
pub fn general_knowledge() -> NewQuiz {
    NewQuiz {
        title: "General Knowledge".into(),
        description: "Test your general knowledge with these questions!".into(),
        questions: vec![
            NewQuestion::new(
                "What is the capital of France?",
                options(&["London", "Berlin", "Paris", "Madrid"]),
                2,
            ),
            NewQuestion::new(
                "Which planet is known as the Red Planet?",
                options(&["Earth", "Mars", "Venus", "Jupiter"]),
                1,
            ),
            NewQuestion::new(
                "Who painted the Mona Lisa?",
                options(&["Van Gogh", "Da Vinci", "Picasso", "Michelangelo"]),
                1,
            ),
        ],
    }
}

/// The bundled quiz with its fixed id (`"1"`, questions `"1-1"` to `"1-3"`).
///
/// # Panics
///
/// Panics if the bundled draft stops validating, which is a programming error.
#[must_use]
pub fn general_knowledge_quiz() -> Quiz {
    general_knowledge()
        .validate(QuizId::new(GENERAL_KNOWLEDGE_ID))
        .expect("bundled quiz should validate")
}

fn options(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
