//! Special commands parser for interactive chat mode
//!
//! Commands are prefixed with `/`. The command word is case-insensitive;
//! arguments keep their case so session ids can be matched exactly.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on the chat view rather than being sent to the
/// completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new chat session
    NewChat,

    /// List stored chat sessions
    ListChats,

    /// Switch to a stored session by position or id
    SelectChat(String),

    /// Show the about page
    About,

    /// Toggle the session list shown alongside the conversation
    ToggleSidebar,

    /// Show the current session and request state
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a chat message.
    None,
}

/// Parse a user input string into a special command
///
/// # Arguments
///
/// * `input` - The user input string to parse
///
/// # Returns
///
/// Returns Ok(SpecialCommand) for valid commands or SpecialCommand::None for non-commands.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command that takes no argument receives one.
/// Returns CommandError::MissingArgument if `/select` is given no selector.
///
/// # Examples
///
/// ```
/// use luatbot::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/select 2").unwrap(),
///     SpecialCommand::SelectChat("2".to_string())
/// );
/// assert_eq!(
///     parse_special_command("Luật đất đai là gì?").unwrap(),
///     SpecialCommand::None
/// );
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    let no_arg = |command: SpecialCommand| {
        if arg.is_empty() {
            Ok(command)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: word.clone(),
                arg: arg.to_string(),
            })
        }
    };

    match word.as_str() {
        "/new" => no_arg(SpecialCommand::NewChat),
        "/chats" | "/history" => no_arg(SpecialCommand::ListChats),
        "/select" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/select".to_string(),
                    usage: "/select <number|id>".to_string(),
                })
            } else {
                Ok(SpecialCommand::SelectChat(arg.to_string()))
            }
        }
        "/about" => no_arg(SpecialCommand::About),
        "/sidebar" => no_arg(SpecialCommand::ToggleSidebar),
        "/status" => no_arg(SpecialCommand::ShowStatus),
        "/help" | "/?" => no_arg(SpecialCommand::Help),
        "/exit" | "/quit" => no_arg(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(word.clone())),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

SESSIONS:
  /new            - Start a new chat
  /chats          - List saved chats
  /select <n|id>  - Switch to chat number n (from /chats) or by id
  /sidebar        - Show or hide the chat list

INFORMATION:
  /status         - Show the current chat and request state
  /about          - About this product
  /help           - Show this help message

EXIT:
  /exit, /quit    - Leave the chat (history is kept)
  exit, quit      - Same as /exit

Anything else you type is sent as a question about Vietnamese law.
"#
    );
}
