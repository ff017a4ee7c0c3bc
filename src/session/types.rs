use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Current time at millisecond precision, the resolution stored history keeps
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Timestamps as `2024-05-01T10:00:00.000Z`
///
/// Matches the format the browser client wrote, so loading and saving
/// existing history leaves its timestamps unchanged.
pub mod millis_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Allocate a new time-ordered identifier
pub fn new_id() -> String {
    Ulid::new().to_string()
}

/// A single chat turn, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier
    pub id: String,
    /// Message body
    pub text: String,
    /// `true` for user-authored messages, `false` for assistant replies
    pub is_user: bool,
    /// Creation time
    #[serde(with = "millis_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use luatbot::session::Message;
    ///
    /// let msg = Message::user("Luật đất đai là gì?");
    /// assert!(msg.is_user);
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    /// Creates a new assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    fn new(text: impl Into<String>, is_user: bool) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            is_user,
            timestamp: now_millis(),
        }
    }
}

/// A titled conversation holding an ordered list of messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique identifier
    pub id: String,
    /// Title derived from the first user message. Empty until one exists.
    #[serde(default)]
    pub title: String,
    /// Messages in chronological order
    pub messages: Vec<Message>,
    /// Creation time
    #[serde(with = "millis_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ChatSession {
    /// Create an untitled session holding `seed`
    pub fn new(seed: Vec<Message>) -> Self {
        Self {
            id: new_id(),
            title: String::new(),
            messages: seed,
            timestamp: now_millis(),
        }
    }

    /// Whether a title has been assigned
    pub fn is_titled(&self) -> bool {
        !self.title.is_empty()
    }

    /// Whether any user message has been appended
    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.is_user)
    }

    /// Title for listings, falling back to `New Chat N` for untitled sessions
    ///
    /// # Arguments
    ///
    /// * `position` - 1-based position of the session in the collection
    pub fn display_title(&self, position: usize) -> String {
        if self.is_titled() {
            self.title.clone()
        } else {
            format!("New Chat {}", position)
        }
    }
}

/// Derive a session title from the first user message
///
/// Takes the first `max_chars` characters, counted as Unicode scalar
/// values so Vietnamese diacritics are never split.
///
/// # Examples
///
/// ```
/// use luatbot::session::derive_title;
///
/// assert_eq!(
///     derive_title("Tôi muốn hỏi về luật đất đai 2024", 20),
///     "Tôi muốn hỏi về luật"
/// );
/// assert_eq!(derive_title("Xin chào", 20), "Xin chào");
/// ```
pub fn derive_title(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_and_assistant_constructors() {
        let user = Message::user("hỏi");
        let bot = Message::assistant("trả lời");
        assert!(user.is_user);
        assert!(!bot.is_user);
        assert_ne!(user.id, bot.id);
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let msg = Message::user("x");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["isUser"], serde_json::Value::Bool(true));
        assert!(json.get("is_user").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_session_deserializes_browser_timestamps() {
        let raw = r#"{
            "id": "1714557600000",
            "title": "Luật hôn nhân",
            "messages": [
                {"id": "welcome", "text": "Xin chào", "isUser": false, "timestamp": "2024-05-01T10:00:00.000Z"}
            ],
            "timestamp": "2024-05-01T10:00:00.000Z"
        }"#;
        let session: ChatSession = serde_json::from_str(raw).unwrap();
        assert_eq!(session.id, "1714557600000");
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_browser_timestamp_format_is_preserved() {
        let raw = r#"{"id":"1","text":"Xin chào","isUser":false,"timestamp":"2024-05-01T10:00:03.500Z"}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["timestamp"], "2024-05-01T10:00:03.500Z");
    }

    #[test]
    fn test_whole_second_timestamp_keeps_milliseconds() {
        let raw = r#"{"id":"1","text":"x","isUser":true,"timestamp":"2024-05-01T10:00:00Z"}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["timestamp"], "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn test_new_message_survives_json_unchanged() {
        let msg = Message::user("Luật lao động");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_new_session_is_untitled() {
        let session = ChatSession::new(vec![Message::assistant("Xin chào")]);
        assert!(!session.is_titled());
        assert!(!session.has_user_message());
        assert_eq!(session.display_title(3), "New Chat 3");
    }

    #[test]
    fn test_display_title_prefers_stored_title() {
        let mut session = ChatSession::new(vec![]);
        session.title = "Thuế".to_string();
        assert_eq!(session.display_title(1), "Thuế");
    }

    #[test]
    fn test_derive_title_counts_characters_not_bytes() {
        let title = derive_title("Tôi muốn hỏi về luật đất đai 2024", 20);
        assert_eq!(title.chars().count(), 20);
        assert_eq!(title, "Tôi muốn hỏi về luật");
    }

    #[test]
    fn test_derive_title_short_text_is_unchanged() {
        assert_eq!(derive_title("Thuế", 20), "Thuế");
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..100).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 100);
    }
}
