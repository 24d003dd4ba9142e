//! The interactive prompt loop of the terminal client.

use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use mathbot_core::ChatSessionBuilder;
use mathbot_core::chat::{ChatMessage, ChatState, GREETING, RelayTransport};
use mathbot_core::relay::Role;
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Idle,
    Reply(ChatMessage),
}

const BAR_CHAR: &str = "▎";

const HELP: &str = "/explain shows the last explanation, /close hides it, \
                    /quit leaves";

/// Chats through `transport`, reading one question per line of `input`
/// until it ends or `/quit` is entered.
///
/// Returns the final state of the session.
pub async fn run<T, R>(transport: T, input: R) -> Option<ChatState>
where
    T: RelayTransport,
    R: AsyncBufRead + Unpin,
{
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let session = ChatSessionBuilder::with_transport(transport)
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::Idle).ok();
            }
        })
        .on_message({
            let event_tx = event_tx.clone();
            move |msg: &ChatMessage| {
                if msg.role() == Role::Assistant {
                    event_tx.send(SessionEvent::Reply(msg.clone())).ok();
                }
            }
        })
        .build();

    let progress_style =
        match ProgressStyle::with_template("{spinner} {wide_msg}") {
            Ok(style) => style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            Err(err) => {
                error!("invalid progress template: {err}");
                return None;
            }
        };

    print_reply(GREETING, false);
    println!("{}", HELP.dimmed());

    let mut lines = input.lines();

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("error reading input: {err}");
                break;
            }
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/close" => {
                session.close_explanation();
                continue;
            }
            "/explain" => {
                let Some(state) = session.snapshot().await else {
                    break;
                };
                match state.latest_explained() {
                    Some(msg) => {
                        session.open_explanation(msg.id());
                        print_explanation(msg.detail());
                    }
                    None => println!("{}", "No explanation yet.".dimmed()),
                }
                continue;
            }
            _ => {}
        }

        session.set_input(line);
        session.submit();

        let mut progress_bar = None;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🤔 Thinking...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = &progress_bar {
                progress_bar.finish_and_clear();
            }
            progress_bar = None;

            match event {
                SessionEvent::Reply(msg) => {
                    print_reply(msg.text(), msg.has_detail());
                }
                SessionEvent::Idle => {
                    break;
                }
            }
        }
    }

    session.snapshot().await
}

fn print_reply(text: &str, has_detail: bool) {
    println!("{}🤖 {}", BAR_CHAR.bright_cyan(), text.bright_white());
    if has_detail {
        println!("{}", "   (/explain for the detailed steps)".dimmed());
    }
}

fn print_explanation(detail: &str) {
    let bar = BAR_CHAR.bright_yellow();
    for line in detail.lines() {
        println!("{bar}{line}");
    }
}

#[cfg(test)]
mod tests {
    use mathbot_core::chat::APOLOGY;

    use super::*;
    use crate::HttpRelayTransport;

    #[tokio::test]
    async fn test_every_buffered_line_is_submitted() {
        let transport = HttpRelayTransport::new("http://127.0.0.1:1/api/chat");
        let input: &[u8] = b"1 + 1\n2 + 2\n\n3 + 3\n";

        let state = run(transport, input).await.unwrap();

        let texts: Vec<_> = state.messages().iter().map(|m| m.text()).collect();
        assert_eq!(
            texts,
            [
                GREETING, "1 + 1", APOLOGY, "2 + 2", APOLOGY, "3 + 3", APOLOGY
            ]
        );
    }

    #[tokio::test]
    async fn test_quit_stops_reading() {
        let transport = HttpRelayTransport::new("http://127.0.0.1:1/api/chat");
        let input: &[u8] = b"/explain\n/quit\n1 + 1\n";

        let state = run(transport, input).await.unwrap();
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.explanation(), None);
    }
}
