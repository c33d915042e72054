use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single conversation turn: a role, text content, and a stable id.
///
/// Messages are the context unit handed to the language-model backend and the
/// append-only record threaded through a run. The id exists so that replaying
/// the same partial update is idempotent: the merge layer deduplicates by id,
/// never by content.
///
/// # Examples
///
/// ```
/// use dialogos::message::Message;
///
/// let user_msg = Message::user("What's the weather in Paris?");
/// let assistant_msg = Message::assistant("Sunny, 22°C.");
///
/// assert!(user_msg.has_role(Message::USER));
/// assert_ne!(user_msg.id, assistant_msg.id);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identifier used for merge deduplication.
    #[serde(default = "fresh_id")]
    pub id: String,
    /// The role of the sender (see the constants on [`Message`]).
    pub role: String,
    /// The text content of the turn.
    pub content: String,
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Well-known message roles.
///
/// Stored as strings on [`Message`] so custom roles stay possible; the enum
/// exists for matching and constructor ergonomics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => Message::USER,
            Role::Assistant => Message::ASSISTANT,
            Role::System => Message::SYSTEM,
            Role::Tool => Message::TOOL,
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            Message::ASSISTANT => Role::Assistant,
            Message::SYSTEM => Role::System,
            Message::TOOL => Role::Tool,
            _ => Role::User,
        }
    }
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// AI assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System prompt or instruction message role.
    pub const SYSTEM: &'static str = "system";
    /// Tool result message role.
    pub const TOOL: &'static str = "tool";

    /// Creates a new message with the specified role and content and a fresh id.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            id: fresh_id(),
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a message from a [`Role`] variant.
    #[must_use]
    pub fn with_role(role: Role, content: &str) -> Self {
        Self::new(role.as_str(), content)
    }

    /// Creates a user message.
    ///
    /// ```
    /// use dialogos::message::Message;
    ///
    /// let msg = Message::user("hello");
    /// assert_eq!(msg.role, "user");
    /// ```
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Creates a tool-result message.
    #[must_use]
    pub fn tool(content: &str) -> Self {
        Self::new(Self::TOOL, content)
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convenience_constructors_set_roles() {
        assert_eq!(Message::user("a").role, Message::USER);
        assert_eq!(Message::assistant("b").role, Message::ASSISTANT);
        assert_eq!(Message::system("c").role, Message::SYSTEM);
        assert_eq!(Message::tool("d").role, Message::TOOL);
    }

    #[test]
    fn each_message_gets_a_distinct_id() {
        let a = Message::user("same text");
        let b = Message::user("same text");
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Assistant, Role::System, Role::Tool] {
            assert_eq!(Role::from(role.as_str()), role);
        }
    }

    #[test]
    fn serde_round_trip_preserves_id() {
        let original = Message::assistant("Test message");
        let json = serde_json::to_string(&original).expect("serialize");
        let parsed: Message = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(original, parsed);
    }

    #[test]
    fn deserialization_fills_missing_id() {
        let parsed: Message =
            serde_json::from_str(r#"{"role":"user","content":"hi"}"#).expect("deserialize");
        assert!(!parsed.id.is_empty());
    }
}
