use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Companion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    Action,
}

/// A single chat entry. Immutable once appended to a [`MessageLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

impl Message {
    pub fn new(content: String, sender: Sender, kind: MessageKind, timestamp: DateTime<Utc>) -> Self {
        Message {
            id: Uuid::new_v4(),
            content,
            sender,
            timestamp,
            kind,
            attachment_url: None,
        }
    }

    pub fn text(content: impl Into<String>, sender: Sender, timestamp: DateTime<Utc>) -> Self {
        Self::new(content.into(), sender, MessageKind::Text, timestamp)
    }

    pub fn with_attachment(mut self, url: impl Into<String>) -> Self {
        self.attachment_url = Some(url.into());
        self
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Append-only, insertion-ordered chat history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn count_from(&self, sender: Sender) -> usize {
        self.messages.iter().filter(|m| m.sender == sender).count()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let now = Utc::now();
        let mut log = MessageLog::new();
        log.append(Message::text("first", Sender::User, now));
        log.append(Message::text("second", Sender::Companion, now));
        log.append(Message::text("third", Sender::User, now));

        let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(log.count_from(Sender::User), 2);
        assert_eq!(log.last().unwrap().content, "third");
    }

    #[test]
    fn test_message_ids_unique() {
        let now = Utc::now();
        let a = Message::text("same", Sender::User, now);
        let b = Message::text("same", Sender::User, now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_attachment_serialization() {
        let now = Utc::now();
        let plain = Message::text("hi", Sender::User, now);
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("attachment_url").is_none());
        assert_eq!(json["kind"], "text");

        let voice = Message::new("memo".to_string(), Sender::User, MessageKind::Voice, now)
            .with_attachment("file:///memo.m4a");
        let json = serde_json::to_value(&voice).unwrap();
        assert_eq!(json["attachment_url"], "file:///memo.m4a");
        assert_eq!(json["kind"], "voice");
    }
}
