//! Terminal rendering for the chat view
//!
//! Header, message list, typing indicator, session sidebar, and the
//! about page. Everything prints to stdout; logging goes to stderr.

use crate::controller::Notification;
use crate::session::{ChatSession, Message};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use prettytable::{format, Table};
use std::io::Write;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Product name shown in the header
pub const APP_TITLE: &str = "Chatbot Luật Việt Nam";

/// Attribution line shown in the header and on the about page
pub const ATTRIBUTION: &str = "Sản phẩm này là của đề tài QG.24.80";

/// Header tagline
pub const TAGLINE: &str = "Hỏi bất cứ điều gì về luật";

/// Input prompt hint
pub const INPUT_HINT: &str = "Hỏi tôi bất cứ điều gì về luật";

/// Label shown while a reply is pending
pub const TYPING_LABEL: &str = "Thinking";

const TITLE_COLUMN_CHARS: usize = 40;

/// Print the chat header
pub fn print_banner() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║  ⚖  {:<57}║", APP_TITLE);
    println!("║     {:<57}║", ATTRIBUTION);
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("  {} {}\n", "💬".cyan(), TAGLINE.cyan());
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

/// Print the about page
pub fn print_about() {
    println!("\n{}", "Luật Việt Nam".bold());
    println!("──────────────────────────────────────────");
    println!("\n    {}\n", ATTRIBUTION.bold());
}

/// Readline prompt
pub fn prompt() -> String {
    format!("{} › ", INPUT_HINT.dimmed())
}

/// Format a timestamp as local `HH:MM`
pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Header line printed above a message body
pub fn message_header(message: &Message) -> String {
    let time = format_time(&message.timestamp);
    if message.is_user {
        format!("{} {}", "Bạn".green().bold(), time.dimmed())
    } else {
        format!("{} {}", "⚖ Trợ lý".blue().bold(), time.dimmed())
    }
}

/// Print a single message
pub fn print_message(message: &Message) {
    println!("{}", message_header(message));
    println!("{}\n", message.text);
}

/// Print every message of a conversation
pub fn print_messages(messages: &[Message]) {
    println!();
    for message in messages {
        print_message(message);
    }
}

/// Print an assistant reply, optionally revealing it character by character
///
/// # Arguments
///
/// * `message` - Reply to print
/// * `delay` - Per-character delay, or `None` to print at once
///
/// # Errors
///
/// Returns error if stdout cannot be flushed
pub async fn print_reply(message: &Message, delay: Option<Duration>) -> crate::error::Result<()> {
    let Some(delay) = delay else {
        print_message(message);
        return Ok(());
    };

    println!("{}", message_header(message));
    let mut stdout = std::io::stdout();
    for ch in message.text.chars() {
        print!("{}", ch);
        stdout.flush()?;
        tokio::time::sleep(delay).await;
    }
    println!("\n");
    Ok(())
}

/// Title cell for the sidebar, truncated by characters
fn title_cell(session: &ChatSession, position: usize) -> String {
    let title = session.display_title(position);
    if title.chars().count() > TITLE_COLUMN_CHARS {
        let head: String = title.chars().take(TITLE_COLUMN_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        title
    }
}

/// Build the session list table
///
/// # Arguments
///
/// * `sessions` - Sessions in creation order
/// * `current` - Id of the active session, marked with `*`
pub fn sidebar_table(sessions: &[ChatSession], current: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "#".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Created".bold()
    ]);

    for (index, session) in sessions.iter().enumerate() {
        let position = index + 1;
        let marker = if current == Some(session.id.as_str()) {
            format!("*{}", position).green().to_string()
        } else {
            position.to_string()
        };
        let created = session
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        table.add_row(prettytable::row![
            marker,
            title_cell(session, position),
            session.messages.len(),
            created
        ]);
    }

    table
}

/// Print the session list
pub fn print_sidebar(sessions: &[ChatSession], current: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No conversation history found.".yellow());
        return;
    }

    println!("\nChats:");
    sidebar_table(sessions, current).printstd();
    println!("Use {} to switch chats.\n", "/select <n>".cyan());
}

/// Print a controller notification
pub fn print_notification(notification: &Notification) {
    eprintln!("{} {}", "⚠".yellow(), notification.to_string().yellow());
}

/// Animated indicator shown while a reply is pending
pub struct TypingIndicator {
    handle: JoinHandle<()>,
}

impl TypingIndicator {
    /// Start animating on the current line
    pub fn start() -> Self {
        let handle = tokio::spawn(async {
            let mut dots = 0usize;
            loop {
                print!("\r{}{:<3}", TYPING_LABEL.dimmed(), ".".repeat(dots));
                let _ = std::io::stdout().flush();
                dots = (dots + 1) % 4;
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
        });
        Self { handle }
    }

    /// Stop animating and clear the line
    pub fn stop(self) {
        self.handle.abort();
        print!("\r{}\r", " ".repeat(TYPING_LABEL.len() + 3));
        let _ = std::io::stdout().flush();
    }
}
