mod attempt;
mod ids;
mod quiz;

pub use ids::{AttemptId, ParseIdError, QuestionId, QuizId};

pub use attempt::QuizAttempt;
pub use quiz::{NewQuestion, NewQuiz, Quiz, QuizError, QuizQuestion};
