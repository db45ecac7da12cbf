use chrono::{DateTime, Utc};

use crate::core::{Message, MessageLog, Sender};

/// Chat history plus the companion's typing indicator.
#[derive(Debug, Clone)]
pub struct ChatSession {
    log: MessageLog,
    is_typing: bool,
}

impl ChatSession {
    /// Starts a log seeded with the companion's welcome message.
    pub fn new(companion_name: &str, now: DateTime<Utc>) -> Self {
        let mut log = MessageLog::new();
        log.append(Message::text(welcome_message(companion_name), Sender::Companion, now));
        ChatSession {
            log,
            is_typing: false,
        }
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    /// Returns false if the flag was already in the requested state.
    pub fn set_typing(&mut self, typing: bool) -> bool {
        let changed = self.is_typing != typing;
        self.is_typing = typing;
        changed
    }

    pub fn push_user(&mut self, content: &str, now: DateTime<Utc>) -> &Message {
        self.log.append(Message::text(content, Sender::User, now))
    }

    pub fn push_companion(&mut self, content: String, now: DateTime<Utc>) -> &Message {
        self.log.append(Message::text(content, Sender::Companion, now))
    }

    pub fn total_messages(&self) -> usize {
        self.log.len()
    }
}

pub fn welcome_message(companion_name: &str) -> String {
    format!(
        "Hi! I'm {}, your AI companion. How can I help you today? 🍁",
        companion_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_message_first() {
        let chat = ChatSession::new("Maple", Utc::now());
        assert_eq!(chat.total_messages(), 1);
        let first = chat.log().get(0).unwrap();
        assert_eq!(first.sender, Sender::Companion);
        assert!(first.content.starts_with("Hi! I'm Maple"));
        assert!(!chat.is_typing());
    }

    #[test]
    fn test_typing_flag_changes() {
        let mut chat = ChatSession::new("Maple", Utc::now());
        assert!(chat.set_typing(true));
        assert!(!chat.set_typing(true));
        assert!(chat.set_typing(false));
    }

    #[test]
    fn test_push_order() {
        let now = Utc::now();
        let mut chat = ChatSession::new("Maple", now);
        chat.push_user("one", now);
        chat.push_companion("two".to_string(), now);
        let contents: Vec<_> = chat.log().iter().skip(1).map(|m| m.content.clone()).collect();
        assert_eq!(contents, vec!["one", "two"]);
    }
}
