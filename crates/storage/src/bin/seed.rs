use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{QuizAttempt, QuizId};
use storage::repository::{Storage, StorageError};
use storage::samples;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    attempts: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidAttempts { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidAttempts { raw } => write!(f, "invalid --attempts value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3?mode=rwc".into());
        let mut attempts = std::env::var("QUIZ_SEED_ATTEMPTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(0);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--attempts" => {
                    let value = require_value(&mut args, "--attempts")?;
                    attempts = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAttempts { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            attempts,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:quiz.sqlite3?mode=rwc)");
    eprintln!("  --attempts <n>            Synthetic attempts to append (default: 0)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_ATTEMPTS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let quiz = samples::general_knowledge().validate(QuizId::new(samples::GENERAL_KNOWLEDGE_ID))?;
    match storage.quizzes.create_quiz(&quiz).await {
        Ok(_) => println!("Inserted quiz {} ({})", quiz.id(), quiz.title()),
        Err(StorageError::Conflict) => println!("Quiz {} already present", quiz.id()),
        Err(e) => return Err(e.into()),
    }

    // Alternate a perfect run with a one-out-of-three run.
    let patterns: [(u32, [usize; 3]); 2] = [(3, [2, 1, 1]), (1, [0, 1, 0])];
    for i in 0..args.attempts {
        let (score, answers) = patterns[(i as usize) % patterns.len()];
        let date = now - Duration::hours(i64::from(i));
        let attempt = QuizAttempt::new(
            QuizId::new(samples::GENERAL_KNOWLEDGE_ID),
            date,
            score,
            3,
            answers.iter().copied().map(Some).collect(),
            synthetic_time_spent(i),
        );
        storage.attempts.append_attempt(&attempt).await?;
    }

    println!(
        "Seeded {} attempt(s) for quiz {} into {}",
        args.attempts,
        samples::GENERAL_KNOWLEDGE_ID,
        args.db_url
    );

    Ok(())
}

/// Seconds spent on the `index`-th synthetic attempt: 20 s plus 5 s per step.
fn synthetic_time_spent(index: u32) -> u64 {
    20 + u64::from(index) * 5
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_time_spent_does_not_overflow() {
        assert_eq!(synthetic_time_spent(0), 20);
        assert_eq!(synthetic_time_spent(2), 30);
        assert_eq!(synthetic_time_spent(u32::MAX), 20 + u64::from(u32::MAX) * 5);
    }
}
