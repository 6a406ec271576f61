//! Interactive console (`rooms shell`).
//!
//! Mounts all three flows over one backend. The feed and the chat are
//! rendered from their state channels by background view tasks, so a slow
//! reply never blocks paging or form input.
//!
//! | Input | Effect |
//! |-------|--------|
//! | `/page N` | fetch page `N` |
//! | `/next`, `/prev` | move one page |
//! | `/set <field> <value>` | edit a form field |
//! | `/book on\|off` | toggle the booked switch |
//! | `/form` | show the form |
//! | `/submit` | submit the form |
//! | `/retry` | re-send the last undelivered message |
//! | `/help` | list commands |
//! | `/quit` | leave |
//! | anything else | send to the assistant |

use std::sync::Arc;

use anyhow::Result;
use roomdesk_core::backend::CatalogBackend;
use roomdesk_core::chat::ChatHistory;
use roomdesk_core::feed::FeedState;
use roomdesk_core::form::FormField;
use roomdesk_core::models::PaginationCursor;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::chat::{ChatSession, SendOutcome};
use crate::config::Config;
use crate::console::Console;
use crate::render;
use crate::submit::RecordSubmitter;

const HELP: &str = "\
Commands:
  /page N               fetch page N (0-based)
  /next, /prev          move one page
  /set <field> <value>  edit a form field
  /book on|off          mark the new room booked or available
  /form                 show the form
  /submit               add the room
  /retry                re-send the last undelivered message
  /help                 show this help
  /quit                 leave
Anything else is sent to the assistant.";

/// One parsed line of shell input.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Page(u32),
    Next,
    Prev,
    Set { field: String, value: String },
    Book(bool),
    Form,
    Submit,
    Retry,
    Help,
    Quit,
    Say(String),
    Blank,
    /// A slash command that could not be parsed; holds the usage hint.
    Invalid(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Blank;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return ShellCommand::Say(line.to_string());
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        match name {
            "page" => match args.parse() {
                Ok(page) => ShellCommand::Page(page),
                Err(_) => ShellCommand::Invalid("usage: /page N".to_string()),
            },
            "next" => ShellCommand::Next,
            "prev" => ShellCommand::Prev,
            "set" => match args.split_once(char::is_whitespace) {
                Some((field, value)) => ShellCommand::Set {
                    field: field.to_string(),
                    value: value.trim().to_string(),
                },
                // `/set image_url` clears a field.
                None if !args.is_empty() => ShellCommand::Set {
                    field: args.to_string(),
                    value: String::new(),
                },
                None => ShellCommand::Invalid("usage: /set <field> <value>".to_string()),
            },
            "book" => match args {
                "on" | "yes" | "true" => ShellCommand::Book(true),
                "off" | "no" | "false" => ShellCommand::Book(false),
                _ => ShellCommand::Invalid("usage: /book on|off".to_string()),
            },
            "form" => ShellCommand::Form,
            "submit" => ShellCommand::Submit,
            "retry" => ShellCommand::Retry,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => ShellCommand::Invalid(format!("unknown command '/{}'; try /help", other)),
        }
    }
}

/// Runs the interactive console until `/quit` or end of input.
pub async fn run_shell(config: &Config, backend: Arc<dyn CatalogBackend>) -> Result<()> {
    let console = Console::mount(config, backend);
    println!("rooms shell. Type /help for commands.");

    let feed_view = spawn_feed_view(console.feed().subscribe());
    let chat_view = spawn_chat_view(console.chat());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ShellCommand::parse(&line) {
            ShellCommand::Quit => break,
            command => dispatch(&console, command),
        }
    }

    debug!("shell input closed");
    drop(console);
    feed_view.abort();
    chat_view.abort();
    Ok(())
}

fn dispatch(console: &Console, command: ShellCommand) {
    let feed = console.feed();
    let submitter = console.submitter();
    let chat = console.chat();

    match command {
        ShellCommand::Page(page) => {
            let size = feed.current().page_size();
            if let Some(cursor) = PaginationCursor::new(page, size) {
                feed.spawn_fetch(cursor);
            }
        }
        ShellCommand::Next => {
            feed.spawn_fetch(feed.current().next());
        }
        ShellCommand::Prev => {
            feed.spawn_fetch(feed.current().prev());
        }
        ShellCommand::Set { field, value } => match submitter.update_named(&field, &value) {
            Ok(()) => {
                if let Ok(field) = field.parse::<FormField>() {
                    println!("{} = {}", field, submitter.form().value(field));
                }
            }
            Err(e) => println!("{}", e),
        },
        ShellCommand::Book(booked) => {
            submitter.set_booked(booked);
            println!("is_booked = {}", booked);
        }
        ShellCommand::Form => {
            let state = submitter.snapshot();
            print!("{}", render::form(&state.form, &state.status));
        }
        ShellCommand::Submit => spawn_submit(submitter),
        ShellCommand::Retry => match chat.spawn_retry_last() {
            Ok(_) => {}
            Err(SendOutcome::Ignored) => println!("Nothing to retry."),
            Err(outcome) => report_unsent(outcome),
        },
        ShellCommand::Say(text) => {
            if let Err(outcome) = chat.spawn_send(&text) {
                report_unsent(outcome);
            }
        }
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Invalid(hint) => println!("{}", hint),
        ShellCommand::Blank | ShellCommand::Quit => {}
    }
}

fn report_unsent(outcome: SendOutcome) {
    match outcome {
        SendOutcome::Busy => println!("Still waiting for the previous reply."),
        SendOutcome::Cancelled => println!("The chat is closed."),
        _ => {}
    }
}

fn spawn_submit(submitter: &Arc<RecordSubmitter>) {
    let submitter = Arc::clone(submitter);
    tokio::spawn(async move {
        println!("Submitting...");
        match submitter.submit().await {
            Ok(()) => println!("Room added."),
            Err(e) => println!("Could not add the room: {}", e),
        }
    });
}

/// Prints the feed now and every time its state changes.
fn spawn_feed_view(mut rx: watch::Receiver<FeedState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let text = render::feed(&rx.borrow_and_update());
            print!("{}", text);
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

/// Prints new chat messages, the loading line and delivery failures as the
/// history changes.
fn spawn_chat_view(chat: &Arc<ChatSession>) -> JoinHandle<()> {
    let mut rx = chat.subscribe();
    let filter = chat.filter().clone();
    tokio::spawn(async move {
        let mut seen = ChatHistory::new();
        while rx.changed().await.is_ok() {
            let history = rx.borrow_and_update().clone();
            let mut out = String::new();

            for message in history.messages().iter().skip(seen.len()) {
                out.push_str(&render::message(message, &filter));
            }
            if history.is_sending() && !seen.is_sending() {
                out.push_str("Loading...\n");
            }
            // A failure on a message already printed gets its own line.
            let failed_earlier = history.last_failed().is_some_and(|i| i < seen.len());
            if let Some(error) = history.last_error() {
                if seen.is_sending() && failed_earlier {
                    out.push_str(&format!("! {} (/retry)\n", error));
                }
            }

            print!("{}", out);
            seen = history;
        }
    })
}
