//! Interactive chat loop.
//!
//! Lines typed at the prompt go to the chat service; everything shown is
//! rendered from the service's view events.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::debug;

use campusbot_chat::{ChatError, ChatServiceHandle, ViewEvent};
use campusbot_core::types::{Message, Sender, GUEST_DISPLAY_NAME};

use crate::describe;

/// A line typed at the prompt.
#[derive(Debug, PartialEq)]
pub enum ReplCommand {
    Say(String),
    /// Quick-access shortcut by 1-based index; `None` lists them.
    Quick(Option<usize>),
    Earlier,
    Status,
    Suggest(String),
    Forget(String),
    /// Stored history listing by page.
    History(u32),
    /// Delete the stored item with this timestamp.
    Delete(String),
    ClearHistory,
    Logout,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Say(line.to_string());
    };
    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };
    match cmd {
        "quit" | "exit" => ReplCommand::Quit,
        "help" => ReplCommand::Help,
        "earlier" => ReplCommand::Earlier,
        "status" => ReplCommand::Status,
        "clear" => ReplCommand::ClearHistory,
        "logout" => ReplCommand::Logout,
        "history" if arg.is_empty() => ReplCommand::History(1),
        "history" => match arg.parse::<u32>() {
            Ok(n) if n > 0 => ReplCommand::History(n),
            _ => ReplCommand::Unknown(line.to_string()),
        },
        "delete" if !arg.is_empty() => ReplCommand::Delete(arg.to_string()),
        "quick" if arg.is_empty() => ReplCommand::Quick(None),
        "quick" => match arg.parse::<usize>() {
            Ok(n) if n > 0 => ReplCommand::Quick(Some(n)),
            _ => ReplCommand::Unknown(line.to_string()),
        },
        "suggest" => ReplCommand::Suggest(arg.to_string()),
        "forget" if !arg.is_empty() => ReplCommand::Forget(arg.to_string()),
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

const HELP: &str = "\
  /quick [n]       list quick-access questions, or ask number n
  /earlier         load earlier messages
  /suggest <text>  autocomplete from remembered queries
  /forget <query>  forget a remembered query
  /status          show whether the AI fallback is enabled
  /history [n]     list page n of your stored history
  /delete <ts>     delete the stored message with timestamp ts
  /clear           delete your whole chat history
  /logout          sign out and start over as a guest
  /quit            leave";

fn render_message(message: &Message) {
    match message.from {
        Sender::User => println!("you> {}", message.text),
        Sender::Bot => println!("bot> {}", message.text),
    }
}

/// Print every pending view event. User messages are skipped unless
/// `echo_user` is set, since a typed line is already on screen.
fn drain(events: &mut Receiver<ViewEvent>, echo_user: bool) {
    loop {
        match events.try_recv() {
            Ok(ViewEvent::Appended(m)) => {
                if m.from == Sender::Bot || echo_user {
                    render_message(&m);
                }
            }
            Ok(ViewEvent::ThinkingShown) => println!("bot> ..."),
            Ok(ViewEvent::ThinkingCleared) => {}
            Ok(ViewEvent::Prepended(messages)) => {
                println!("--- earlier messages ---");
                messages.iter().for_each(render_message);
                println!("--- end of earlier messages ---");
            }
            Ok(ViewEvent::Replaced(messages)) => messages.iter().for_each(render_message),
            Ok(ViewEvent::Cleared) => println!("--- new conversation ---"),
            Err(TryRecvError::Lagged(n)) => debug!(skipped = n, "View events dropped"),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

fn report(result: Result<(), ChatError>) {
    if let Err(e) = result {
        println!("! {}", describe(&e));
    }
}

/// Run the chat loop until `/quit` or end of input.
pub async fn run(
    handle: ChatServiceHandle,
    quick_access: &[String],
    greeting: &str,
) -> Result<(), ChatError> {
    let mut events = handle.subscribe();

    handle.load_faq().await?;
    if let Err(e) = handle.load_history().await {
        println!("! Could not load history: {}", describe(&e));
    }
    if handle.messages().await?.is_empty() {
        handle.greet(greeting).await?;
    }
    drain(&mut events, true);
    let who = match handle.current_session().await? {
        Some(session) => session.display_name,
        None => GUEST_DISPLAY_NAME.to_string(),
    };
    println!(
        "[{}]  chatting as {}, type /help for commands",
        handle.ai_status().await?,
        who
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await.map_err(campusbot_core::CampusError::from)? else {
            break;
        };
        let command = parse_line(&line);
        let echo_user = !matches!(command, ReplCommand::Say(_));
        match command {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Say(text) => report(handle.send(text).await.map(|_| ())),
            ReplCommand::Quick(None) => {
                for (i, q) in quick_access.iter().enumerate() {
                    println!("  {}. {}", i + 1, q);
                }
            }
            ReplCommand::Quick(Some(n)) => match quick_access.get(n - 1) {
                Some(q) => report(handle.quick_ask(q.clone()).await.map(|_| ())),
                None => println!("! No quick-access question {}", n),
            },
            ReplCommand::Earlier => {
                if handle.has_earlier().await? {
                    match handle.load_earlier().await {
                        Ok(0) => println!("(no earlier messages)"),
                        Ok(_) => {}
                        Err(e) => println!("! {}", describe(&e)),
                    }
                } else {
                    println!("(no earlier messages)");
                }
            }
            ReplCommand::Status => println!("[{}]", handle.ai_status().await?),
            ReplCommand::Suggest(prefix) => {
                for s in handle.autocomplete(prefix).await? {
                    println!("  {}", s);
                }
            }
            ReplCommand::Forget(query) => {
                if !handle.remove_suggestion(query).await? {
                    println!("(not a remembered query)");
                }
            }
            ReplCommand::History(page) => match handle.history_listing(page).await {
                Ok(records) if records.is_empty() => println!("(no history)"),
                Ok(records) => {
                    for r in records {
                        println!("  {}  {:<4} {}", r.ts, r.from.as_str(), r.text);
                    }
                }
                Err(e) => println!("! {}", describe(&e)),
            },
            ReplCommand::Delete(ts) => match handle.delete_history_item(ts).await {
                Ok(()) => println!("Deleted."),
                Err(e) => println!("! {}", describe(&e)),
            },
            ReplCommand::Logout => match handle.logout().await {
                Ok(()) => {
                    drain(&mut events, echo_user);
                    println!("Signed out. Chatting as {}.", GUEST_DISPLAY_NAME);
                    continue;
                }
                Err(e) => println!("! {}", describe(&e)),
            },
            ReplCommand::ClearHistory => match handle.clear_history().await {
                Ok(()) => println!("History cleared."),
                Err(e) => println!("! {}", describe(&e)),
            },
            ReplCommand::Unknown(line) => println!("! Unknown command: {}", line),
        }
        drain(&mut events, echo_user);
    }

    handle.shutdown().await
}
