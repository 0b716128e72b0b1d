use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use sheetchat_types::Message;

use crate::session::Session;

/// What the poll loop reports to whoever renders the chat.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A message from the log that has not been shown yet
    Message(Message),
    /// A poll failed; the loop keeps going
    PollFailed(String),
}

/// Poll the session every `period` and forward results to `events`.
///
/// The first poll happens one period after start, since `connect` already
/// returned the history. Runs until the receiving side is dropped.
pub async fn run_poll_loop(
    session: Arc<Session>,
    period: Duration,
    events: mpsc::Sender<ChatEvent>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let batch = match session.poll().await {
            Ok(messages) => messages.into_iter().map(ChatEvent::Message).collect(),
            Err(e) => {
                warn!("Poll error: {}", e);
                vec![ChatEvent::PollFailed(e.to_string())]
            }
        };

        for event in batch {
            if events.send(event).await.is_err() {
                debug!("Event receiver dropped, stopping poll loop");
                return;
            }
        }

        if events.is_closed() {
            debug!("Event receiver dropped, stopping poll loop");
            return;
        }
    }
}
