//! Terminal input
//!
//! Each line typed on stdin is one form submission. `/listen` activates the
//! voice control and `/quit` ends the session.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::controller::Event;

/// Command that activates speech recognition
pub const LISTEN_COMMAND: &str = "/listen";

/// Command that ends the session
pub const QUIT_COMMAND: &str = "/quit";

/// Translate one input line into a controller event
#[must_use]
pub fn parse_line(line: &str) -> Event {
    match line.trim() {
        LISTEN_COMMAND => Event::VoiceRequested,
        QUIT_COMMAND => Event::Quit,
        _ => Event::TextSubmitted(line.to_string()),
    }
}

/// Forward lines from `reader` as events until EOF or a quit command
///
/// EOF is reported as [`Event::Quit`].
pub async fn forward_lines<R>(reader: R, events: mpsc::UnboundedSender<Event>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let event = match lines.next_line().await {
            Ok(Some(line)) => parse_line(&line),
            Ok(None) => Event::Quit,
            Err(e) => {
                tracing::error!(error = %e, "failed to read input");
                Event::Quit
            }
        };

        let quit = matches!(event, Event::Quit);
        if events.send(event).is_err() || quit {
            break;
        }
    }
}

/// Spawn a task reading stdin into `events`
pub fn spawn_stdin(events: mpsc::UnboundedSender<Event>) -> JoinHandle<()> {
    tokio::spawn(forward_lines(BufReader::new(tokio::io::stdin()), events))
}
