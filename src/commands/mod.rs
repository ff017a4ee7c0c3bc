/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`    - Interactive chat view
- `about`   - Product information page
- `history` - Print the saved chat list
*/

use crate::config::Config;
use crate::error::Result;
use crate::session::SessionStore;
use crate::storage::SqliteStorage;

// Special commands parser for the chat view
pub mod special_commands;

/// Open the session store described by `config`
///
/// # Errors
///
/// Returns error if the database file cannot be created or opened
pub fn open_session_store(config: &Config) -> Result<SessionStore> {
    let backend = SqliteStorage::open(config.storage.path.as_deref())?;
    tracing::debug!(db = %backend.db_path().display(), "Opened history storage");
    Ok(SessionStore::open(
        Box::new(backend),
        config.storage.key.clone(),
        config.chat.title_max_chars,
    ))
}

// Chat command handler
pub mod chat {
    //! Interactive chat view.
    //!
    //! Builds the completion client and session store, then runs a
    //! readline loop that sends questions through the `ChatController`.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::completion::create_client;
    use crate::config::UiConfig;
    use crate::controller::ChatController;
    use crate::ui;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::IsTerminal;
    use std::time::Duration;

    /// Whether the loop should keep reading input
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LoopAction {
        /// Read the next line
        Continue,
        /// Leave the chat
        Exit,
    }

    /// Chat view state wrapped around a controller
    pub struct ChatView {
        controller: ChatController,
        sidebar_visible: bool,
        typing_delay: Option<Duration>,
        model: String,
    }

    impl ChatView {
        /// Create a view over `controller`
        ///
        /// # Arguments
        ///
        /// * `controller` - Chat controller
        /// * `typing_delay` - Per-character reveal delay for replies
        /// * `model` - Model name shown by `/status`
        pub fn new(
            controller: ChatController,
            typing_delay: Option<Duration>,
            model: impl Into<String>,
        ) -> Self {
            Self {
                controller,
                sidebar_visible: true,
                typing_delay,
                model: model.into(),
            }
        }

        /// The wrapped controller
        pub fn controller(&self) -> &ChatController {
            &self.controller
        }

        /// Whether the session list is shown on navigation
        pub fn sidebar_visible(&self) -> bool {
            self.sidebar_visible
        }

        /// Print the header, the sidebar and the current conversation
        pub fn render(&self) {
            ui::print_banner();
            self.render_sidebar();
            ui::print_messages(self.controller.messages());
        }

        fn render_sidebar(&self) {
            if self.sidebar_visible && !self.controller.sessions().is_empty() {
                ui::print_sidebar(
                    self.controller.sessions(),
                    self.controller.current_session_id(),
                );
            }
        }

        fn print_status(&self) {
            let session = self.controller.current_session();
            let title = match session {
                Some(s) => {
                    let position = self
                        .controller
                        .sessions()
                        .iter()
                        .position(|c| c.id == s.id)
                        .map(|i| i + 1)
                        .unwrap_or(0);
                    s.display_title(position)
                }
                None => "(no chat yet)".to_string(),
            };

            println!("\n╔══════════════════════════════════════════════════════════════╗");
            println!("║                     Luatbot Session Status                   ║");
            println!("╚══════════════════════════════════════════════════════════════╝\n");
            println!("Current Chat:      {}", title.cyan());
            if let Some(s) = session {
                println!("Chat ID:           {}", s.id);
            }
            println!("Messages:          {}", self.controller.messages().len());
            println!("Saved Chats:       {}", self.controller.sessions().len());
            println!("Model:             {}", self.model);
            println!(
                "State:             {}",
                if self.controller.is_loading() {
                    ui::TYPING_LABEL.yellow()
                } else {
                    "Idle".green()
                }
            );
            println!(
                "Sidebar:           {}",
                if self.sidebar_visible { "shown" } else { "hidden" }
            );
            println!();
        }

        /// Handle one line of user input
        ///
        /// # Errors
        ///
        /// Returns error only if terminal output fails
        pub async fn handle_line(&mut self, line: &str) -> Result<LoopAction> {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return Ok(LoopAction::Continue);
            }

            let command = match parse_special_command(trimmed) {
                Ok(command) => command,
                Err(e) => {
                    eprintln!("{}", e.to_string().red());
                    return Ok(LoopAction::Continue);
                }
            };

            match command {
                SpecialCommand::NewChat => {
                    self.controller.new_chat();
                    self.render_sidebar();
                    ui::print_messages(self.controller.messages());
                }
                SpecialCommand::ListChats => {
                    ui::print_sidebar(
                        self.controller.sessions(),
                        self.controller.current_session_id(),
                    );
                }
                SpecialCommand::SelectChat(selector) => self.select(&selector),
                SpecialCommand::About => ui::print_about(),
                SpecialCommand::ToggleSidebar => {
                    self.sidebar_visible = !self.sidebar_visible;
                    println!(
                        "Sidebar {}\n",
                        if self.sidebar_visible { "shown" } else { "hidden" }
                    );
                    self.render_sidebar();
                }
                SpecialCommand::ShowStatus => self.print_status(),
                SpecialCommand::Help => print_help(),
                SpecialCommand::Exit => return Ok(LoopAction::Exit),
                SpecialCommand::None => self.send(trimmed).await?,
            }

            Ok(LoopAction::Continue)
        }

        fn select(&mut self, selector: &str) {
            let target = self
                .controller
                .store()
                .resolve(selector)
                .map(|s| s.id.clone());

            match target {
                Some(id) if self.controller.select_chat(&id) => {
                    self.render_sidebar();
                    ui::print_messages(self.controller.messages());
                }
                Some(_) => {
                    println!("{}", "Please wait for the current reply.".yellow());
                }
                None => {
                    println!(
                        "{}",
                        format!("Chat not found: {}. Use /chats to list chats.", selector)
                            .yellow()
                    );
                }
            }
        }

        async fn send(&mut self, text: &str) -> Result<()> {
            let indicator = ui::TypingIndicator::start();
            let reply = self.controller.send_message(text).await;
            indicator.stop();

            if let Some(notification) = self.controller.take_notification() {
                ui::print_notification(&notification);
            }
            if let Some(reply) = reply {
                ui::print_reply(&reply, self.typing_delay).await?;
            }
            Ok(())
        }
    }

    /// Reveal delay for assistant replies
    ///
    /// Disabled by `--no-typing`, by configuration, or when stdout is
    /// not a terminal.
    pub fn typing_delay(ui: &UiConfig, no_typing: bool) -> Option<Duration> {
        if no_typing || !ui.typing_effect || !std::io::stdout().is_terminal() {
            None
        } else {
            Some(Duration::from_millis(ui.typing_delay_ms))
        }
    }

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `no_typing` - Print replies at once instead of revealing them
    ///
    /// # Errors
    ///
    /// Returns `LuatbotError::MissingCredentials` when no API key is
    /// configured, or an error if storage or the terminal cannot be opened
    pub async fn run_chat(config: Config, no_typing: bool) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let client = create_client(&config.completion)?;
        let store = open_session_store(&config)?;
        let controller = ChatController::new(store, client, &config.chat);
        let mut view = ChatView::new(
            controller,
            typing_delay(&config.ui, no_typing),
            config.completion.model.clone(),
        );

        let mut rl = DefaultEditor::new()?;
        view.render();

        let prompt = ui::prompt();
        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.trim())?;
                    }
                    if view.handle_line(&line).await? == LoopAction::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Tạm biệt!");
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::completion::MockCompletionClient;
        use crate::config::ChatConfig;
        use crate::test_utils::memory_store;
        use std::sync::Arc;

        fn view_with(client: MockCompletionClient) -> ChatView {
            let (store, _) = memory_store();
            let controller = ChatController::new(store, Arc::new(client), &ChatConfig::default());
            ChatView::new(controller, None, "qwen/qwen-turbo")
        }

        fn quiet_client() -> MockCompletionClient {
            let mut client = MockCompletionClient::new();
            client.expect_complete().never();
            client
        }

        #[tokio::test]
        async fn test_exit_command_stops_loop() {
            let mut view = view_with(quiet_client());
            assert_eq!(view.handle_line("/exit").await.unwrap(), LoopAction::Exit);
            assert_eq!(view.handle_line("quit").await.unwrap(), LoopAction::Exit);
        }

        #[tokio::test]
        async fn test_blank_and_invalid_input_continue() {
            let mut view = view_with(quiet_client());
            assert_eq!(view.handle_line("   ").await.unwrap(), LoopAction::Continue);
            assert_eq!(
                view.handle_line("/nope").await.unwrap(),
                LoopAction::Continue
            );
            assert!(view.controller().sessions().is_empty());
        }

        #[tokio::test]
        async fn test_question_is_sent_and_reply_recorded() {
            let mut client = MockCompletionClient::new();
            client
                .expect_complete()
                .times(1)
                .returning(|_| Ok("Theo Luật Đất đai 2024...".to_string()));
            let mut view = view_with(client);

            view.handle_line("Luật đất đai 2024 có gì mới?").await.unwrap();

            let messages = view.controller().messages();
            assert_eq!(messages.len(), 3);
            assert_eq!(messages[2].text, "Theo Luật Đất đai 2024...");
        }

        #[tokio::test]
        async fn test_new_and_select_commands_switch_sessions() {
            let mut view = view_with(quiet_client());

            view.handle_line("/new").await.unwrap();
            let first = view.controller().current_session_id().unwrap().to_string();
            view.handle_line("/new").await.unwrap();
            let second = view.controller().current_session_id().unwrap().to_string();
            assert_ne!(first, second);

            view.handle_line("/select 1").await.unwrap();
            assert_eq!(view.controller().current_session_id(), Some(first.as_str()));

            view.handle_line(&format!("/select {}", second)).await.unwrap();
            assert_eq!(view.controller().current_session_id(), Some(second.as_str()));

            view.handle_line("/select 9").await.unwrap();
            assert_eq!(view.controller().current_session_id(), Some(second.as_str()));
        }

        #[tokio::test]
        async fn test_sidebar_toggle() {
            let mut view = view_with(quiet_client());
            assert!(view.sidebar_visible());
            view.handle_line("/sidebar").await.unwrap();
            assert!(!view.sidebar_visible());
            view.handle_line("/sidebar").await.unwrap();
            assert!(view.sidebar_visible());
        }

        #[test]
        fn test_typing_delay_disabled_by_flag_or_config() {
            let ui = UiConfig::default();
            assert!(typing_delay(&ui, true).is_none());

            let off = UiConfig {
                typing_effect: false,
                ..UiConfig::default()
            };
            assert!(typing_delay(&off, false).is_none());
        }
    }
}

// About command handler
pub mod about {
    //! Product information page.

    use crate::ui;

    /// Print the about page
    pub fn run_about() {
        ui::print_about();
    }
}

// History command handler
pub mod history {
    //! Saved chat listing.

    use super::*;
    use crate::ui;

    /// Print the saved chat list without starting a chat
    ///
    /// # Errors
    ///
    /// Returns error if the history storage cannot be opened
    pub fn run_history(config: &Config) -> Result<()> {
        let store = open_session_store(config)?;
        ui::print_sidebar(store.sessions(), None);
        Ok(())
    }
}
