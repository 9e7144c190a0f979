//! Interactive quiz taking on the terminal.

use quiz_core::model::QuizId;
use services::sessions::{ActiveSession, SessionError, TimerEvent};
use services::{AppServices, Notification, NotificationLevel, Notifier};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Countdown values at or below this are announced.
const WARN_AT_SECS: u32 = 5;

/// Prints notifications inline with the quiz output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let marker = match notification.level {
            NotificationLevel::Info => "*",
            NotificationLevel::Success => "+",
            NotificationLevel::Error => "!",
        };
        println!("[{marker}] {notification}");
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Run one quiz until the user quits or stdin closes.
///
/// # Errors
///
/// Returns an error if the quiz cannot be loaded or stdin fails.
pub async fn take_quiz(
    services: &AppServices,
    quiz_id: &QuizId,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = services.session_loop().start_session(quiz_id).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    render(&session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let flow = match line? {
                    Some(line) => handle_input(&mut session, line.trim()).await,
                    None => Flow::Quit,
                };
                if let Flow::Quit = flow {
                    if !session.is_complete() {
                        session.abandon();
                    }
                    return Ok(());
                }
            }
            Some(event) = session.next_timer_event(), if !session.is_complete() => {
                handle_tick(&mut session, event);
            }
        }
    }
}

async fn handle_input(session: &mut ActiveSession, input: &str) -> Flow {
    let result = match input {
        "" => Ok(()),
        "q" | "quit" => return Flow::Quit,
        "s" | "submit" => session.reveal_answer().map(|_| println!("Press n to continue.")),
        "n" | "next" => session.next_question().await.map(|_| render(session)),
        "r" | "retry" => session.retry().map(|()| render(session)),
        "save" => session
            .save_pending_attempt()
            .await
            .map(|id| println!("Saved attempt {id}")),
        "h" | "help" | "?" => {
            print_help();
            Ok(())
        }
        other => match parse_option(other) {
            Some(index) => session.select_option(index).map(|()| {
                if let Some(text) = session
                    .session()
                    .current_question()
                    .and_then(|q| q.option(index))
                {
                    println!("Selected: {text}");
                }
            }),
            None => {
                println!("Unrecognized input: {other} (h for help)");
                Ok(())
            }
        },
    };

    if let Err(err) = result {
        print_session_error(&err);
    }
    Flow::Continue
}

fn handle_tick(session: &mut ActiveSession, event: TimerEvent) {
    if session.handle_timer_event(event).is_some() {
        println!("Time's up! Press n to continue.");
        return;
    }
    if let TimerEvent::Countdown { .. } = event {
        let state = session.session();
        let remaining = state.remaining_secs();
        if !state.is_revealed() && remaining <= WARN_AT_SECS {
            println!("  {remaining}s left");
        }
    }
}

/// `1`-based numbers or letters (`a`, `b`, ...) to option indices.
fn parse_option(input: &str) -> Option<usize> {
    if let Ok(number) = input.parse::<usize>() {
        return number.checked_sub(1);
    }
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some(usize::from(c.to_ascii_lowercase() as u8 - b'a'))
        }
        _ => None,
    }
}

fn print_session_error(err: &SessionError) {
    match err {
        SessionError::InvalidOption { options, .. } => {
            println!("Pick one of the {options} options.");
        }
        SessionError::AlreadyRevealed => println!("Answer already revealed. Press n to continue."),
        SessionError::NotRevealed => println!("Submit an answer first (s)."),
        SessionError::InProgress => println!("Finish the quiz before retrying."),
        SessionError::Completed => println!("Quiz finished. Press r to retry or q to quit."),
        other => println!("Error: {other}"),
    }
}

fn print_help() {
    println!("Commands: 1-9 or a-z select, s submit, n next, r retry, save, q quit");
}

fn render(session: &ActiveSession) {
    if let Some(results) = session.results() {
        println!();
        println!("{} ({})", results.verdict.headline(), results.quiz_title);
        println!(
            "Score: {}/{} ({}%)  Time: {}",
            results.score,
            results.total,
            results.percentage,
            results.time_spent_label()
        );
        for (number, review) in results.questions.iter().enumerate() {
            let mark = if review.is_correct { "+" } else { "-" };
            let chosen = review.selected_option.as_deref().unwrap_or("no answer");
            println!("  {mark} Q{}: {}", number + 1, review.question);
            if review.is_correct {
                println!("      {chosen}");
            } else {
                println!("      {chosen} (correct: {})", review.correct_option);
            }
        }
        if session.pending_attempt().is_some() {
            println!("Results were not saved. Type `save` to try again.");
        }
        println!("Press r to retry or q to quit.");
        return;
    }

    let state = session.session();
    let progress = state.progress();
    let Some(question) = state.current_question() else {
        return;
    };
    println!();
    println!(
        "Question {}/{} ({}%)  {}s",
        progress.question_number, progress.total, progress.percent, progress.remaining_secs
    );
    println!("{}", question.question());
    for (index, option) in question.options().iter().enumerate() {
        let letter = char::from(b'A' + u8::try_from(index % 26).unwrap_or(0));
        println!("  {letter}) {option}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_parse_from_numbers_and_letters() {
        assert_eq!(parse_option("1"), Some(0));
        assert_eq!(parse_option("4"), Some(3));
        assert_eq!(parse_option("0"), None);
        assert_eq!(parse_option("b"), Some(1));
        assert_eq!(parse_option("D"), Some(3));
        assert_eq!(parse_option("ab"), None);
        assert_eq!(parse_option("?!"), None);
    }
}
