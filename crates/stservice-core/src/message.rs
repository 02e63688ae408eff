//! Chat message model.
//!
//! # Hierarchy
//!
//! ```text
//! MessageEvent (tagged by `message_type`)
//! ├── MessageEvent::Group(GroupMessage)     { sub_type, message_id, group_id, user_id, anonymous, text, font }
//! └── MessageEvent::Private(PrivateMessage) { sub_type, message_id, user_id, text, font }
//! ```
//!
//! Both message structs deserialize straight from OneBot v11 message
//! payloads; `raw_message` becomes [`text`](GroupMessage::text) and all
//! fields the dispatcher does not use (`time`, `self_id`, `sender`, …) are
//! ignored.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{EventError, EventResult};
use crate::service::{Reply, Service};

// ============================================================================
// Shared Types
// ============================================================================

/// Anonymous sender marker attached to anonymous group messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anonymous {
    /// Anonymous user ID.
    pub id: i64,
    /// Anonymous display name.
    pub name: String,
    /// Opaque flag used by the platform to act on the anonymous sender.
    pub flag: String,
}

/// The two kinds of chat message the controller routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A message posted in a group.
    Group,
    /// A one-to-one message.
    Private,
}

impl MessageKind {
    /// Returns the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// GroupMessage
// ============================================================================

/// A message posted in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessage {
    /// Sub-type ("normal", "anonymous", "notice").
    #[serde(default)]
    pub sub_type: String,
    /// Message ID.
    #[serde(default)]
    pub message_id: i32,
    /// Group the message was posted in.
    pub group_id: i64,
    /// Sender's user ID.
    pub user_id: i64,
    /// Anonymous sender marker, if the sender posted anonymously.
    #[serde(default)]
    pub anonymous: Option<Anonymous>,
    /// Message text.
    #[serde(rename = "raw_message")]
    pub text: String,
    /// Font ID (usually 0).
    #[serde(default)]
    pub font: i32,
}

impl GroupMessage {
    /// Creates a plain "normal" group message.
    pub fn new(group_id: i64, user_id: i64, text: impl Into<String>) -> Self {
        Self {
            sub_type: "normal".to_string(),
            message_id: 0,
            group_id,
            user_id,
            anonymous: None,
            text: text.into(),
            font: 0,
        }
    }
}

// ============================================================================
// PrivateMessage
// ============================================================================

/// A one-to-one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessage {
    /// Sub-type ("friend", "group", "other").
    #[serde(default)]
    pub sub_type: String,
    /// Message ID.
    #[serde(default)]
    pub message_id: i32,
    /// Sender's user ID.
    pub user_id: i64,
    /// Message text.
    #[serde(rename = "raw_message")]
    pub text: String,
    /// Font ID (usually 0).
    #[serde(default)]
    pub font: i32,
}

impl PrivateMessage {
    /// Creates a plain "friend" private message.
    pub fn new(user_id: i64, text: impl Into<String>) -> Self {
        Self {
            sub_type: "friend".to_string(),
            message_id: 0,
            user_id,
            text: text.into(),
            font: 0,
        }
    }
}

// ============================================================================
// ChatMessage
// ============================================================================

/// Common view over [`GroupMessage`] and [`PrivateMessage`].
///
/// The controller's tiered dispatch is written once against this trait;
/// [`deliver`](ChatMessage::deliver) picks the matching reaction on the
/// service.
pub trait ChatMessage: Clone {
    /// Which kind of message this is.
    const KIND: MessageKind;

    /// Message ID.
    fn message_id(&self) -> i32;

    /// Sender's user ID.
    fn user_id(&self) -> i64;

    /// Returns a copy of this message carrying `text` instead.
    fn with_text(&self, text: &str) -> Self;

    /// Hands this message to the service's matching reaction.
    fn deliver(&self, service: &dyn Service, post: bool) -> Reply;
}

impl ChatMessage for GroupMessage {
    const KIND: MessageKind = MessageKind::Group;

    fn message_id(&self) -> i32 {
        self.message_id
    }

    fn user_id(&self) -> i64 {
        self.user_id
    }

    fn with_text(&self, text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..self.clone()
        }
    }

    fn deliver(&self, service: &dyn Service, post: bool) -> Reply {
        service.on_group_message(self, post)
    }
}

impl ChatMessage for PrivateMessage {
    const KIND: MessageKind = MessageKind::Private;

    fn message_id(&self) -> i32 {
        self.message_id
    }

    fn user_id(&self) -> i64 {
        self.user_id
    }

    fn with_text(&self, text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..self.clone()
        }
    }

    fn deliver(&self, service: &dyn Service, post: bool) -> Reply {
        service.on_private_message(self, post)
    }
}

// ============================================================================
// MessageEvent
// ============================================================================

/// A decoded chat message of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "lowercase")]
pub enum MessageEvent {
    /// Group message.
    Group(GroupMessage),
    /// Private message.
    Private(PrivateMessage),
}

impl MessageEvent {
    /// Decodes a raw OneBot v11 payload.
    ///
    /// Returns `Ok(None)` for payloads that are not message events
    /// (`notice`, `request`, `meta_event`, …).
    pub fn from_json(raw: &str) -> EventResult<Option<Self>> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Decodes an already-parsed OneBot v11 payload.
    pub fn from_value(value: Value) -> EventResult<Option<Self>> {
        let post_type = value
            .get("post_type")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingPostType)?;

        if post_type != "message" {
            trace!(post_type, "Ignoring non-message event");
            return Ok(None);
        }

        Ok(Some(serde_json::from_value(value)?))
    }

    /// Returns the message kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Group(_) => MessageKind::Group,
            Self::Private(_) => MessageKind::Private,
        }
    }

    /// Returns the message text.
    pub fn text(&self) -> &str {
        match self {
            Self::Group(msg) => &msg.text,
            Self::Private(msg) => &msg.text,
        }
    }
}

impl From<GroupMessage> for MessageEvent {
    fn from(msg: GroupMessage) -> Self {
        Self::Group(msg)
    }
}

impl From<PrivateMessage> for MessageEvent {
    fn from(msg: PrivateMessage) -> Self {
        Self::Private(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP_PAYLOAD: &str = r#"{
        "time": 1700000000,
        "self_id": 10001,
        "post_type": "message",
        "message_type": "group",
        "sub_type": "anonymous",
        "message_id": 42,
        "group_id": 123456,
        "user_id": 80000000,
        "anonymous": { "id": 7, "name": "Hidden", "flag": "abc" },
        "message": [{ "type": "text", "data": { "text": "/ping" } }],
        "raw_message": "/ping",
        "font": 3,
        "sender": { "user_id": 80000000, "nickname": "anon" }
    }"#;

    const PRIVATE_PAYLOAD: &str = r#"{
        "time": 1700000000,
        "self_id": 10001,
        "post_type": "message",
        "message_type": "private",
        "sub_type": "friend",
        "message_id": 9,
        "user_id": 555,
        "message": "hello",
        "raw_message": "hello",
        "font": 0,
        "sender": { "user_id": 555 }
    }"#;

    #[test]
    fn test_decode_group_message() {
        let event = MessageEvent::from_json(GROUP_PAYLOAD).unwrap().unwrap();
        let MessageEvent::Group(msg) = event else {
            panic!("expected group message");
        };

        assert_eq!(msg.sub_type, "anonymous");
        assert_eq!(msg.message_id, 42);
        assert_eq!(msg.group_id, 123456);
        assert_eq!(msg.user_id, 80000000);
        assert_eq!(msg.text, "/ping");
        assert_eq!(msg.font, 3);
        assert_eq!(msg.anonymous.unwrap().name, "Hidden");
    }

    #[test]
    fn test_decode_private_message() {
        let event = MessageEvent::from_json(PRIVATE_PAYLOAD).unwrap().unwrap();
        assert_eq!(event.kind(), MessageKind::Private);
        assert_eq!(event.text(), "hello");
    }

    #[test]
    fn test_non_message_event_is_skipped() {
        let raw = r#"{"post_type": "meta_event", "meta_event_type": "heartbeat"}"#;
        assert!(MessageEvent::from_json(raw).unwrap().is_none());
    }

    #[test]
    fn test_missing_post_type() {
        let err = MessageEvent::from_json(r#"{"message_type": "group"}"#).unwrap_err();
        assert!(matches!(err, EventError::MissingPostType));
    }

    #[test]
    fn test_malformed_message_event() {
        let raw = r#"{"post_type": "message", "message_type": "group", "user_id": 1}"#;
        assert!(matches!(
            MessageEvent::from_json(raw),
            Err(EventError::Json(_))
        ));
    }

    #[test]
    fn test_with_text_keeps_other_fields() {
        let mut msg = GroupMessage::new(1, 2, "original");
        msg.message_id = 77;
        msg.font = 5;

        let swapped = msg.with_text("output");
        assert_eq!(swapped.text, "output");
        assert_eq!(swapped.message_id, 77);
        assert_eq!(swapped.font, 5);
        assert_eq!(swapped.group_id, 1);
        assert_eq!(msg.text, "original");
    }

    #[test]
    fn test_message_kind_display() {
        assert_eq!(GroupMessage::KIND.to_string(), "group");
        assert_eq!(PrivateMessage::KIND.as_str(), "private");
    }
}
