//! Chat controller
//!
//! Sequences user input, session mutation, and the completion request.
//! At most one request is outstanding at a time: sends made while a
//! reply is pending are dropped, not queued. A reply always lands on the
//! session that was current when the request was dispatched, even if the
//! user has since started a new chat.

use crate::completion::CompletionClient;
use crate::config::ChatConfig;
use crate::error::{LuatbotError, Result};
use crate::session::{ChatSession, Message, SessionStore};
use std::sync::Arc;

/// Request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    /// Ready to accept a message
    Idle,
    /// A completion request is in flight
    AwaitingReply,
}

/// A dispatched message whose reply has not yet been recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    session_id: String,
    text: String,
}

impl PendingReply {
    /// Session the reply belongs to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Trimmed user text to forward to the completion client
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ephemeral, user-facing notice raised by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The completion request failed and the fallback reply was recorded
    CompletionFailed(String),
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::CompletionFailed(reason) => {
                write!(f, "Không thể lấy câu trả lời: {}", reason)
            }
        }
    }
}

/// Drives a chat conversation over a [`SessionStore`]
pub struct ChatController {
    store: SessionStore,
    client: Arc<dyn CompletionClient>,
    greeting: Message,
    fallback_message: String,
    current_session_id: Option<String>,
    state: ChatState,
    notification: Option<Notification>,
}

impl ChatController {
    /// Create a controller with no current session
    ///
    /// # Arguments
    ///
    /// * `store` - Session store, already loaded
    /// * `client` - Completion client used for replies
    /// * `config` - Greeting and fallback texts
    pub fn new(store: SessionStore, client: Arc<dyn CompletionClient>, config: &ChatConfig) -> Self {
        Self {
            store,
            client,
            greeting: Message::assistant(config.greeting.clone()),
            fallback_message: config.fallback_message.clone(),
            current_session_id: None,
            state: ChatState::Idle,
            notification: None,
        }
    }

    /// Current request state
    pub fn state(&self) -> ChatState {
        self.state
    }

    /// Whether a reply is pending
    pub fn is_loading(&self) -> bool {
        self.state == ChatState::AwaitingReply
    }

    /// Id of the active session, if any
    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    /// The active session, if any
    pub fn current_session(&self) -> Option<&ChatSession> {
        self.current_session_id
            .as_deref()
            .and_then(|id| self.store.get(id))
    }

    /// Messages to display
    ///
    /// Always read from the store for the current session. Before any
    /// session exists only the greeting is shown.
    pub fn messages(&self) -> &[Message] {
        match self.current_session() {
            Some(session) => &session.messages,
            None => std::slice::from_ref(&self.greeting),
        }
    }

    /// All sessions in creation order
    pub fn sessions(&self) -> &[ChatSession] {
        self.store.sessions()
    }

    /// The underlying session store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Start and activate a new session seeded with the greeting
    ///
    /// Allowed while a reply is pending; that reply still lands on the
    /// session it was sent from.
    pub fn new_chat(&mut self) -> ChatSession {
        let greeting = Message::assistant(self.greeting.text.clone());
        let session = self.store.create_session(vec![greeting]);
        tracing::info!(session_id = %session.id, "Started new chat");
        self.current_session_id = Some(session.id.clone());
        session
    }

    /// Activate a stored session
    ///
    /// # Returns
    ///
    /// Returns `false` and changes nothing when `id` is unknown or a
    /// reply is pending
    pub fn select_chat(&mut self, id: &str) -> bool {
        if self.is_loading() {
            tracing::debug!(session_id = id, "Chat switch ignored while awaiting reply");
            return false;
        }
        if self.store.get(id).is_none() {
            tracing::debug!(session_id = id, "Chat switch to unknown session ignored");
            return false;
        }
        tracing::info!(session_id = id, "Selected chat");
        self.current_session_id = Some(id.to_string());
        true
    }

    /// Record a user message and enter the awaiting state
    ///
    /// Blank text and sends made while a reply is pending are dropped
    /// without any state change. A greeting-seeded session is created
    /// when none is active.
    ///
    /// # Returns
    ///
    /// Returns the pending reply to pass to [`ChatController::finish_send`]
    pub fn begin_send(&mut self, text: &str) -> Option<PendingReply> {
        let text = match validate_outgoing(text) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Ignoring message: {:#}", e);
                return None;
            }
        };
        if self.is_loading() {
            tracing::debug!("Dropping message sent while awaiting reply");
            return None;
        }

        let existing = self.current_session().map(|s| s.id.clone());
        let session_id = match existing {
            Some(id) => id,
            None => self.new_chat().id,
        };

        self.store.append_message(&session_id, Message::user(text));
        self.state = ChatState::AwaitingReply;

        Some(PendingReply {
            session_id,
            text: text.to_string(),
        })
    }

    /// Record the outcome of a pending request and return to idle
    ///
    /// A failed request records the fallback reply and raises a
    /// [`Notification`].
    ///
    /// # Returns
    ///
    /// Returns the assistant message that was recorded
    pub fn finish_send(&mut self, pending: PendingReply, result: Result<String>) -> Message {
        let reply = match result {
            Ok(text) => Message::assistant(text),
            Err(e) => {
                tracing::warn!(session_id = %pending.session_id, "Completion failed: {:#}", e);
                self.notification = Some(Notification::CompletionFailed(e.to_string()));
                Message::assistant(self.fallback_message.clone())
            }
        };

        self.store.append_message(&pending.session_id, reply.clone());
        self.state = ChatState::Idle;
        reply
    }

    /// Send `text` and wait for the reply
    ///
    /// # Returns
    ///
    /// Returns the recorded assistant message, or `None` when the send
    /// was dropped
    pub async fn send_message(&mut self, text: &str) -> Option<Message> {
        let pending = self.begin_send(text)?;
        let client = Arc::clone(&self.client);
        let result = client.complete(pending.text()).await;
        Some(self.finish_send(pending, result))
    }

    /// Take the pending notification, if any
    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }
}

/// Trim outgoing text, rejecting it when nothing is left
pub fn validate_outgoing(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LuatbotError::Validation("message is empty".into()).into());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::MockCompletionClient;
    use crate::config::ChatConfig;
    use crate::storage::{MemoryStorage, StorageBackend};
    use crate::test_utils::memory_store;

    fn controller_with(client: MockCompletionClient) -> (ChatController, MemoryStorage) {
        let (store, storage) = memory_store();
        let controller = ChatController::new(store, Arc::new(client), &ChatConfig::default());
        (controller, storage)
    }

    fn idle_client() -> MockCompletionClient {
        let mut client = MockCompletionClient::new();
        client.expect_complete().never();
        client
    }

    fn assert_displayed_matches_store(controller: &ChatController) {
        if let Some(id) = controller.current_session_id() {
            let stored = controller.store().get(id).expect("current session stored");
            assert_eq!(controller.messages(), stored.messages.as_slice());
        }
    }

    #[test]
    fn test_initial_state_shows_greeting() {
        let (controller, _) = controller_with(idle_client());
        assert_eq!(controller.state(), ChatState::Idle);
        assert!(controller.current_session_id().is_none());
        let messages = controller.messages();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].is_user);
        assert_eq!(messages[0].text, "Xin chào, bạn cần hỏi gì?");
    }

    #[tokio::test]
    async fn test_send_creates_session_and_records_reply() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .withf(|text: &str| text == "Xin chào")
            .times(1)
            .returning(|_| Ok("Chào bạn! Tôi có thể giúp gì?".to_string()));
        let (mut controller, storage) = controller_with(client);

        let reply = controller.send_message("Xin chào").await.expect("reply");

        assert_eq!(reply.text, "Chào bạn! Tôi có thể giúp gì?");
        assert!(!controller.is_loading());
        let messages = controller.messages();
        assert_eq!(messages.len(), 3);
        assert!(!messages[0].is_user);
        assert!(messages[1].is_user);
        assert_eq!(messages[1].text, "Xin chào");
        assert!(!messages[2].is_user);
        assert_eq!(controller.sessions().len(), 1);
        assert_eq!(controller.sessions()[0].title, "Xin chào");
        assert!(storage.get("chatHistory").unwrap().is_some());
        assert!(controller.take_notification().is_none());
    }

    #[tokio::test]
    async fn test_blank_send_is_ignored() {
        let (mut controller, storage) = controller_with(idle_client());

        assert!(controller.send_message("").await.is_none());
        assert!(controller.send_message("   \n\t").await.is_none());

        assert!(controller.sessions().is_empty());
        assert!(controller.current_session_id().is_none());
        assert!(storage.get("chatHistory").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_send_trims_text() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .withf(|text: &str| text == "Luật thuế")
            .times(1)
            .returning(|_| Ok("ok".to_string()));
        let (mut controller, _) = controller_with(client);

        controller.send_message("  Luật thuế  ").await;
        assert_eq!(controller.messages()[1].text, "Luật thuế");
    }

    #[test]
    fn test_send_while_awaiting_is_dropped() {
        let (mut controller, _) = controller_with(idle_client());

        let pending = controller.begin_send("Câu hỏi một").expect("pending");
        assert!(controller.is_loading());
        assert!(controller.begin_send("Câu hỏi hai").is_none());

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, "Câu hỏi một");

        controller.finish_send(pending, Ok("trả lời".to_string()));
        assert!(!controller.is_loading());
        assert_eq!(controller.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_records_fallback_and_notifies() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .times(1)
            .returning(|_| Err(LuatbotError::Network("connection refused".into()).into()));
        let (mut controller, _) = controller_with(client);

        let reply = controller.send_message("Xin chào").await.expect("reply");

        assert_eq!(reply.text, ChatConfig::default().fallback_message);
        assert!(!controller.is_loading());
        let last = controller.messages().last().expect("message");
        assert!(!last.is_user);
        assert_eq!(last.text, ChatConfig::default().fallback_message);

        let notification = controller.take_notification().expect("notification");
        assert!(matches!(notification, Notification::CompletionFailed(ref r) if r.contains("connection refused")));
        assert!(controller.take_notification().is_none());
    }

    #[test]
    fn test_select_unknown_chat_is_noop() {
        let (mut controller, _) = controller_with(idle_client());
        let id = controller.new_chat().id.clone();
        assert!(!controller.select_chat("missing"));
        assert_eq!(controller.current_session_id(), Some(id.as_str()));
    }

    #[test]
    fn test_select_chat_rejected_while_awaiting() {
        let (mut controller, _) = controller_with(idle_client());
        let first = controller.new_chat().id.clone();
        let second = controller.new_chat().id.clone();

        let _pending = controller.begin_send("hỏi").expect("pending");
        assert!(!controller.select_chat(&first));
        assert_eq!(controller.current_session_id(), Some(second.as_str()));
    }

    #[test]
    fn test_new_chat_and_select_keep_display_in_sync() {
        let (mut controller, _) = controller_with(idle_client());

        let a = controller.new_chat().id.clone();
        assert_displayed_matches_store(&controller);
        let pending = controller.begin_send("Luật đất đai").unwrap();
        controller.finish_send(pending, Ok("Trả lời A".into()));
        assert_displayed_matches_store(&controller);

        let b = controller.new_chat().id.clone();
        assert_displayed_matches_store(&controller);
        assert_eq!(controller.messages().len(), 1);

        assert!(controller.select_chat(&a));
        assert_displayed_matches_store(&controller);
        assert_eq!(controller.messages().len(), 3);

        assert!(controller.select_chat(&b));
        assert_displayed_matches_store(&controller);
        assert_eq!(controller.messages().len(), 1);
    }

    #[test]
    fn test_stale_reply_lands_on_originating_session() {
        let (mut controller, _) = controller_with(idle_client());

        let pending = controller.begin_send("Câu hỏi cũ").expect("pending");
        let origin = pending.session_id().to_string();

        let fresh = controller.new_chat().id.clone();
        controller.finish_send(pending, Ok("Trả lời cũ".into()));

        assert_eq!(controller.current_session_id(), Some(fresh.as_str()));
        assert_eq!(controller.messages().len(), 1);

        let origin_session = controller.store().get(&origin).expect("origin");
        assert_eq!(origin_session.messages.len(), 3);
        assert_eq!(origin_session.messages[2].text, "Trả lời cũ");
    }

    #[test]
    fn test_new_chat_untitled_until_first_user_message() {
        let (mut controller, _) = controller_with(idle_client());
        let id = controller.new_chat().id.clone();
        assert!(!controller.store().get(&id).unwrap().is_titled());

        let pending = controller.begin_send("Tôi muốn hỏi về luật đất đai 2024").unwrap();
        controller.finish_send(pending, Ok("ok".into()));
        assert_eq!(
            controller.store().get(&id).unwrap().title,
            "Tôi muốn hỏi về luật"
        );
    }

    #[test]
    fn test_validate_outgoing_rejects_blank_text() {
        let err = validate_outgoing(" \t\n ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LuatbotError>(),
            Some(LuatbotError::Validation(_))
        ));
        assert_eq!(validate_outgoing("  Luật thuế ").unwrap(), "Luật thuế");
    }
}
