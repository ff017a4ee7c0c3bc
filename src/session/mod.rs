//! Session store
//!
//! Owns the ordered collection of chat sessions and mirrors it to a
//! [`StorageBackend`] as a JSON array under a single key after every
//! mutation. The in-memory collection is authoritative: write failures
//! are logged and never surfaced, and unreadable stored history is
//! discarded in favour of an empty collection.

use crate::error::{LuatbotError, Result};
use crate::storage::StorageBackend;
use anyhow::Context;

pub mod types;
pub use types::{derive_title, new_id, ChatSession, Message};

/// Ordered collection of chat sessions backed by key/value storage
pub struct SessionStore {
    backend: Box<dyn StorageBackend>,
    key: String,
    title_max_chars: usize,
    sessions: Vec<ChatSession>,
}

impl SessionStore {
    /// Create an empty store. Call [`SessionStore::load`] to restore history.
    ///
    /// # Arguments
    ///
    /// * `backend` - Persistence backend
    /// * `key` - Storage key holding the serialized collection
    /// * `title_max_chars` - Title length derived from the first user message
    pub fn new(
        backend: Box<dyn StorageBackend>,
        key: impl Into<String>,
        title_max_chars: usize,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            title_max_chars,
            sessions: Vec::new(),
        }
    }

    /// Create a store and immediately restore any persisted history
    ///
    /// # Examples
    ///
    /// ```
    /// use luatbot::session::SessionStore;
    /// use luatbot::storage::MemoryStorage;
    ///
    /// let store = SessionStore::open(Box::new(MemoryStorage::new()), "chatHistory", 20);
    /// assert!(store.is_empty());
    /// ```
    pub fn open(
        backend: Box<dyn StorageBackend>,
        key: impl Into<String>,
        title_max_chars: usize,
    ) -> Self {
        let mut store = Self::new(backend, key, title_max_chars);
        store.load();
        store
    }

    /// Restore the collection from storage
    ///
    /// A missing key yields an empty collection. A stored value that is
    /// not an array of sessions is removed from storage and the store
    /// resets to empty. Read failures are logged and also yield empty.
    pub fn load(&mut self) -> &[ChatSession] {
        self.sessions = match self.read_stored() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("Discarding stored chat history: {:#}", e);
                if let Err(e) = self.backend.remove(&self.key) {
                    tracing::error!("Failed to clear stored chat history: {:#}", e);
                }
                Vec::new()
            }
        };
        tracing::debug!(count = self.sessions.len(), "Loaded chat history");
        &self.sessions
    }

    fn read_stored(&self) -> Result<Vec<ChatSession>> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                tracing::error!("Failed to read chat history: {:#}", e);
                return Ok(Vec::new());
            }
        };

        let sessions = serde_json::from_str::<Vec<ChatSession>>(&raw)
            .context("Stored chat history is not an array of sessions")
            .map_err(|e| LuatbotError::Persistence(format!("{:#}", e)))?;

        Ok(sessions)
    }

    /// Serialize the whole collection and overwrite storage
    ///
    /// Failures are logged; the in-memory collection stays authoritative.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::error!("Failed to persist chat history: {:#}", e);
        }
    }

    fn try_save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.sessions)
            .map_err(LuatbotError::from)
            .context("Failed to serialize chat history")?;
        self.backend.set(&self.key, &json)
    }

    /// Replace the whole collection and persist it
    pub fn replace(&mut self, sessions: Vec<ChatSession>) {
        self.sessions = sessions;
        self.save();
    }

    /// Append a new untitled session seeded with `seed` and persist
    ///
    /// # Returns
    ///
    /// Returns a copy of the created session
    pub fn create_session(&mut self, seed: Vec<Message>) -> ChatSession {
        let session = ChatSession::new(seed);
        tracing::debug!(session_id = %session.id, "Created chat session");
        self.sessions.push(session.clone());
        self.save();
        session
    }

    /// Append `message` to the session with `session_id` and persist
    ///
    /// The first user message of an untitled session also sets its title.
    ///
    /// # Returns
    ///
    /// Returns `false` without touching storage when no session matches
    pub fn append_message(&mut self, session_id: &str, message: Message) -> bool {
        let max_chars = self.title_max_chars;
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            tracing::debug!(session_id, "Append to unknown session ignored");
            return false;
        };

        if message.is_user && !session.is_titled() && !session.has_user_message() {
            session.title = derive_title(&message.text, max_chars);
        }
        session.messages.push(message);

        self.save();
        true
    }

    /// Look up a session by id
    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Resolve a user-supplied selector to a session
    ///
    /// Accepts a 1-based position, a full id, or a unique id prefix.
    pub fn resolve(&self, selector: &str) -> Option<&ChatSession> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }

        if let Some(session) = self.get(selector) {
            return Some(session);
        }

        if let Ok(position) = selector.parse::<usize>() {
            if position >= 1 {
                if let Some(session) = self.sessions.get(position - 1) {
                    return Some(session);
                }
            }
        }

        let mut matches = self.sessions.iter().filter(|s| s.id.starts_with(selector));
        match (matches.next(), matches.next()) {
            (Some(session), None) => Some(session),
            _ => None,
        }
    }

    /// All sessions in creation order
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
