use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{NewQuiz, QuizId};
use services::sessions::format_duration;
use services::{AnalyticsError, AppServices, Clock};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod take;

use take::TerminalNotifier;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidQuizId { raw: String },
    InvalidQuestionSecs { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw}"),
            ArgsError::InvalidQuestionSecs { raw } => {
                write!(f, "invalid --question-secs value (expected 1 or more): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz list      [--db <sqlite_url>]");
    eprintln!("  quiz create    --file <quiz.json> [--db <sqlite_url>]");
    eprintln!("  quiz take      --quiz-id <id> [--question-secs <n>] [--db <sqlite_url>]");
    eprintln!("  quiz analytics --quiz-id <id> [--json] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  --question-secs 15");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_QUESTION_SECS, QUIZ_LOG (falls back to RUST_LOG)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Create,
    Take,
    Analytics,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "create" => Some(Self::Create),
            "take" => Some(Self::Take),
            "analytics" => Some(Self::Analytics),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    quiz_id: Option<QuizId>,
    file: Option<PathBuf>,
    question_secs: Option<u32>,
    json: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut question_secs = std::env::var("QUIZ_QUESTION_SECS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|secs| *secs > 0);
        let mut quiz_id = None;
        let mut file = None;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--quiz-id" => {
                    let value = require_value(args, "--quiz-id")?;
                    let parsed: QuizId = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: value.clone() })?;
                    quiz_id = Some(parsed);
                }
                "--question-secs" => {
                    let value = require_value(args, "--question-secs")?;
                    let parsed = value
                        .parse::<u32>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or_else(|| ArgsError::InvalidQuestionSecs { raw: value.clone() })?;
                    question_secs = Some(parsed);
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(args, "--file")?));
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            quiz_id,
            file,
            question_secs,
            json,
        })
    }

    fn require_quiz_id(&self) -> Result<&QuizId, ArgsError> {
        self.quiz_id
            .as_ref()
            .ok_or(ArgsError::MissingFlag { flag: "--quiz-id" })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_logging() {
    let filter = std::env::var("QUIZ_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    // Logs go to stderr so they never interleave with quiz output on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Listing quizzes is the default when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::List,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::List,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    debug!(db_url = %parsed.db_url, ?cmd, "starting");

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let mut services =
        AppServices::new_sqlite(&parsed.db_url, Clock::system(), Arc::new(TerminalNotifier))
            .await?;
    if let Some(secs) = parsed.question_secs {
        services = services.with_question_time_limit(secs);
    }

    match cmd {
        Command::List => list_quizzes(&services).await,
        Command::Create => {
            let path = parsed
                .file
                .as_ref()
                .ok_or(ArgsError::MissingFlag { flag: "--file" })?;
            create_quiz(&services, path).await
        }
        Command::Take => {
            let quiz_id = parsed.require_quiz_id()?;
            take::take_quiz(&services, quiz_id).await
        }
        Command::Analytics => {
            let quiz_id = parsed.require_quiz_id()?;
            show_analytics(&services, quiz_id, parsed.json).await
        }
    }
}

async fn list_quizzes(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let quizzes = services.quiz_service().list_quizzes().await?;
    if quizzes.is_empty() {
        println!("No quizzes yet. Create one with `quiz create --file <quiz.json>`.");
        return Ok(());
    }
    for quiz in &quizzes {
        println!(
            "{:<38} {} ({} questions)",
            quiz.id(),
            quiz.title(),
            quiz.question_count()
        );
        println!("{:<38} {}", "", quiz.description());
    }
    Ok(())
}

async fn create_quiz(
    services: &AppServices,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let draft: NewQuiz = serde_json::from_str(&raw)?;
    let quiz_id = services.quiz_service().create_quiz(draft).await?;
    println!("Created quiz {quiz_id}");
    Ok(())
}

async fn show_analytics(
    services: &AppServices,
    quiz_id: &QuizId,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = match services.analytics().quiz_analytics(quiz_id).await {
        Ok(stats) => stats,
        Err(AnalyticsError::NoAttemptData(_)) => {
            println!("No Data Available: There are no attempts for this quiz yet");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", stats.quiz_title);
    println!("  Attempts:       {}", stats.attempts);
    println!(
        "  Average score:  {:.1} / {} ({:.0}%)",
        stats.average_score,
        stats.question_count,
        stats.average_score_percentage()
    );
    println!("  Highest score:  {} / {}", stats.highest_score, stats.question_count);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let average_secs = stats.average_time_spent.round() as u64;
    println!("  Average time:   {}", format_duration(average_secs));
    let (correct, incorrect) = stats.score_distribution();
    println!("  Per attempt:    {correct:.1} correct, {incorrect:.1} incorrect");
    println!();
    for (number, question) in stats.question_analytics.iter().enumerate() {
        println!(
            "  Q{:<3} {:<24} {:>3}/{:<3} {:>5.1}%  {:?}",
            number + 1,
            question.short_label(),
            question.correct_answers,
            question.total_attempts,
            question.correct_percentage,
            question.performance()
        );
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_owned());
        Args::parse(&mut iter)
    }

    #[test]
    fn parses_take_flags() {
        let args = parse(&["--quiz-id", "1", "--question-secs", "30", "--db", "sqlite::memory:"]).unwrap();
        assert_eq!(args.require_quiz_id().unwrap().as_str(), "1");
        assert_eq!(args.question_secs, Some(30));
        assert_eq!(args.db_url, "sqlite::memory:");
        assert!(!args.json);
    }

    #[test]
    fn rejects_zero_question_secs_and_unknown_flags() {
        assert!(matches!(
            parse(&["--question-secs", "0"]).unwrap_err(),
            ArgsError::InvalidQuestionSecs { .. }
        ));
        assert!(matches!(
            parse(&["--verbose"]).unwrap_err(),
            ArgsError::UnknownArg(_)
        ));
        assert!(matches!(
            parse(&["--quiz-id"]).unwrap_err(),
            ArgsError::MissingValue { flag: "--quiz-id" }
        ));
    }

    #[test]
    fn missing_quiz_id_is_reported() {
        let args = parse(&["--json"]).unwrap();
        assert!(matches!(
            args.require_quiz_id().unwrap_err(),
            ArgsError::MissingFlag { flag: "--quiz-id" }
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
