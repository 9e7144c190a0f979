use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A tick delivered to the session owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second of the countdown for the question at `question_index`.
    Countdown { question_index: usize },
    /// One second of session-wide elapsed time.
    Elapsed,
}

/// The two periodic tickers behind a running session.
///
/// Both tickers push into one channel so the owner can apply ticks in order
/// with its other inputs. Every countdown tick carries the question it was
/// started for, which lets the owner drop ticks that outlived their question.
/// Dropping the value cancels both tickers.
pub struct SessionTimers {
    tick: Duration,
    tx: Option<UnboundedSender<TimerEvent>>,
    countdown: Option<JoinHandle<()>>,
    elapsed: Option<JoinHandle<()>>,
}

impl SessionTimers {
    /// Start both tickers; the first ticks arrive one `tick` from now.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(tick: Duration, question_index: usize) -> (Self, UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let elapsed = spawn_ticker(tick, tx.clone(), TimerEvent::Elapsed);
        let countdown = spawn_ticker(tick, tx.clone(), TimerEvent::Countdown { question_index });
        let timers = Self {
            tick,
            tx: Some(tx),
            countdown: Some(countdown),
            elapsed: Some(elapsed),
        };
        (timers, rx)
    }

    /// Replace the countdown with a fresh one for `question_index`.
    ///
    /// No effect after [`cancel`](Self::cancel).
    pub fn restart_countdown(&mut self, question_index: usize) {
        self.stop_countdown();
        if let Some(tx) = &self.tx {
            self.countdown = Some(spawn_ticker(
                self.tick,
                tx.clone(),
                TimerEvent::Countdown { question_index },
            ));
        }
    }

    /// Stop the countdown and leave the elapsed ticker running.
    pub fn stop_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }

    /// Stop both tickers. The receiver drains and then yields `None`.
    pub fn cancel(&mut self) {
        self.stop_countdown();
        if let Some(handle) = self.elapsed.take() {
            handle.abort();
        }
        self.tx = None;
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_none()
    }

    #[must_use]
    pub fn countdown_running(&self) -> bool {
        self.countdown.is_some()
    }
}

impl Drop for SessionTimers {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn spawn_ticker(
    tick: Duration,
    tx: UnboundedSender<TimerEvent>,
    event: TimerEvent,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + tick, tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if tx.send(event).is_err() {
                break;
            }
        }
    })
}
