//! Durable, bounded, multi-conversation memory.
//!
//! One JSON file mapping conversation id to a timestamped record. Writes are
//! whole-file and not crash-transactional; disk errors are logged and
//! swallowed so persistence never interrupts a chat turn.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::Local;
use serde::{Deserialize, Serialize};
use shared::chat::{ChatMessage, Role};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// "YYYY-MM-DD HH:MM:SS"; lexicographic order is chronological.
    pub timestamp: String,
    pub important: bool,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryLimits {
    pub max_conversations: usize,
    pub max_messages: usize,
    pub min_message_length: usize,
}

pub struct MemoryStore {
    path: PathBuf,
    limits: MemoryLimits,
}

impl MemoryStore {
    pub fn new(path: PathBuf, limits: MemoryLimits) -> Self {
        Self { path, limits }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Persist one conversation, merging into the existing file.
    ///
    /// Skipped when the conversation is short and unimportant, or when
    /// nothing substantial survives length filtering (system messages are
    /// exempt). Re-saving the same id overwrites its prior record. The store
    /// never holds more than `max_conversations` records afterwards.
    pub fn save(&self, conversation_id: &str, important: bool, messages: &[ChatMessage]) {
        if messages.len() < 3 && !important {
            debug!("skipping memory save: conversation too short");
            return;
        }

        let filtered: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.role == Role::System || m.content.len() > self.limits.min_message_length)
            .cloned()
            .collect();
        if filtered.is_empty() {
            debug!("skipping memory save: no significant messages");
            return;
        }

        let mut data = self.load();
        let start = filtered.len().saturating_sub(self.limits.max_messages);
        data.insert(
            conversation_id.to_string(),
            ConversationRecord {
                timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                important,
                messages: filtered[start..].to_vec(),
            },
        );
        let data = self.evict(data);

        match serde_json::to_string_pretty(&data) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!(error = %e, "failed to write memory file");
                } else {
                    debug!(messages = filtered.len(), "saved conversation to memory");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize memory"),
        }
    }

    /// Important conversations are retained over regular ones; recency breaks
    /// ties within each class.
    fn evict(
        &self,
        data: HashMap<String, ConversationRecord>,
    ) -> HashMap<String, ConversationRecord> {
        let cap = self.limits.max_conversations;
        if data.len() <= cap {
            return data;
        }

        let (mut important, mut regular): (Vec<_>, Vec<_>) =
            data.into_iter().partition(|(_, rec)| rec.important);

        if important.len() > cap {
            important.sort_by(|a, b| a.1.timestamp.cmp(&b.1.timestamp));
            return important.split_off(important.len() - cap).into_iter().collect();
        }

        let slots_left = cap - important.len();
        let mut kept: HashMap<String, ConversationRecord> = important.into_iter().collect();
        if slots_left > 0 && !regular.is_empty() {
            regular.sort_by(|a, b| a.1.timestamp.cmp(&b.1.timestamp));
            let start = regular.len().saturating_sub(slots_left);
            kept.extend(regular.split_off(start));
        }
        kept
    }

    /// The on-disk map, or empty when the file is missing or unreadable.
    pub fn load(&self) -> HashMap<String, ConversationRecord> {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    warn!(error = %e, "memory file unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        }
    }

    /// Delete the backing file. A missing file is not an error.
    pub fn wipe(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(error = %e, "failed to wipe memory file");
            } else {
                debug!("wiped all stored conversations");
            }
        }
    }

    /// Startup diagnostics mirroring what the file holds. Read-only.
    pub fn log_startup_summary(&self) {
        let data = self.load();
        if data.is_empty() {
            debug!("no memory file found, starting fresh");
            return;
        }
        let total_messages: usize = data.values().map(|rec| rec.messages.len()).sum();
        let important: usize = data.values().filter(|rec| rec.important).count();
        debug!(
            conversations = data.len(),
            total_messages, important, "loaded conversation memory"
        );
    }
}
