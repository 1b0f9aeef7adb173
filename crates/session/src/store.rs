//! In-memory ordered log of exchanged messages for the active session.

use shared::chat::{ChatMessage, Role};

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    /// The last `n` messages in original order. Restartable view over the
    /// tail of the log, used to build bounded context windows.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ChatMessage> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..].iter()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_returns_tail_in_original_order() {
        let mut store = MessageStore::new();
        for i in 0..15 {
            store.append(Role::User, format!("message {i}"));
        }
        let window: Vec<_> = store.recent(10).map(|m| m.content.as_str()).collect();
        assert_eq!(window.len(), 10);
        assert_eq!(window.first(), Some(&"message 5"));
        assert_eq!(window.last(), Some(&"message 14"));
    }

    #[test]
    fn recent_larger_than_log_yields_everything() {
        let mut store = MessageStore::new();
        store.append(Role::User, "hi");
        store.append(Role::Assistant, "hello");
        assert_eq!(store.recent(10).count(), 2);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut store = MessageStore::new();
        store.append(Role::User, "hi");
        store.clear();
        assert!(store.is_empty());
    }
}
