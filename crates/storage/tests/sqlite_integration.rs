use chrono::Duration;
use quiz_core::model::{QuizAttempt, QuizId};
use quiz_core::time::fixed_now;
use storage::repository::{AttemptRepository, QuizRepository, StorageError};
use storage::samples;
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_question_order() {
    let repo = connect("memdb_quiz_roundtrip").await;
    let quiz = samples::general_knowledge_quiz();

    let id = repo.create_quiz(&quiz).await.expect("create");
    let fetched = repo.get_quiz(&id).await.expect("fetch");

    assert_eq!(fetched, quiz);
    assert_eq!(fetched.questions()[2].question(), "Who painted the Mona Lisa?");
    assert_eq!(fetched.questions()[0].correct_option(), Some("Paris"));

    let listed = repo.list_quizzes().await.expect("list");
    assert_eq!(listed, vec![quiz]);
}

#[tokio::test]
async fn sqlite_reports_missing_and_duplicate_quizzes() {
    let repo = connect("memdb_quiz_errors").await;
    let quiz = samples::general_knowledge_quiz();
    repo.create_quiz(&quiz).await.expect("create");

    let dup = repo.create_quiz(&quiz).await.unwrap_err();
    assert!(matches!(dup, StorageError::Conflict));

    let missing = repo.get_quiz(&QuizId::new("missing")).await.unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_attempts_keep_unanswered_positions() {
    let repo = connect("memdb_attempts").await;
    let quiz = samples::general_knowledge_quiz();
    repo.create_quiz(&quiz).await.expect("create");

    let second = QuizAttempt::new(
        quiz.id().clone(),
        fixed_now() + Duration::minutes(3),
        1,
        3,
        vec![Some(2), None, Some(3)],
        47,
    );
    let first = QuizAttempt::new(
        quiz.id().clone(),
        fixed_now(),
        3,
        3,
        vec![Some(2), Some(1), Some(1)],
        21,
    );
    repo.append_attempt(&second).await.expect("append second");
    repo.append_attempt(&first).await.expect("append first");

    let listed = repo.list_attempts(quiz.id()).await.expect("list");
    assert_eq!(listed, vec![first.clone(), second]);
    assert_eq!(listed[1].answer(1), None);

    let again = repo.append_attempt(&first).await.unwrap_err();
    assert!(matches!(again, StorageError::Conflict));
}
