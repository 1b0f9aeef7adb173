//! Session controller: command dispatch, importance/save policy, mode
//! switching, prompt construction, and session reset.

use chrono::Local;
use shared::chat::Role;
use shared::config::AssistantConfig;
use tracing::debug;

use crate::memory::MemoryStore;
use crate::pending::PendingTracker;
use crate::store::MessageStore;
use crate::transcript::{Tag, Transcript};

pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";
const RESET_NOTICE: &str = "Chat has been reset and all memory has been wiped. How can I help you?";
const REMEMBER_NOTICE: &str = "I'll remember this conversation.";
const FORGET_NOTICE: &str = "This conversation won't be saved to memory.";

/// User phrases that mark the conversation important.
const IMPORTANT_KEYWORDS: &[&str] = &["remember", "important", "don't forget", "note", "save"];

const REASONING_CLOSE: &str = "</think>";
const STRAY_INSTRUCTION: &str = "[Focus on current question only]";

pub const LLM_FALLBACK: &str = "Sorry, I could not generate a response.";
pub const SEARCH_FALLBACK: &str =
    "Sorry, I could not generate a response based on the search results.";

/// Dispatch strategy for outbound queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Llm,
    WebSearch,
}

impl QueryMode {
    pub fn name(&self) -> &'static str {
        match self {
            QueryMode::Llm => "llm",
            QueryMode::WebSearch => "web_search",
        }
    }

    /// Short label for the mode toggle button.
    pub fn label(&self) -> &'static str {
        match self {
            QueryMode::Llm => "LLM",
            QueryMode::WebSearch => "Web",
        }
    }

    pub fn toggled(&self) -> QueryMode {
        match self {
            QueryMode::Llm => QueryMode::WebSearch,
            QueryMode::WebSearch => QueryMode::Llm,
        }
    }
}

/// What the caller should do after handing text to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Run an outbound query on a worker and report back via
    /// `complete_turn`/`fail_turn`.
    Query { mode: QueryMode, text: String },
    /// Fetch weather for an optional location label; bypasses the
    /// pending tracker entirely.
    Weather { location: Option<String> },
    /// A control command, handled entirely inside the controller.
    Handled,
    /// Empty or whitespace-only input; silently ignored.
    Ignored,
}

pub struct SessionController {
    config: AssistantConfig,
    memory: MemoryStore,
    store: MessageStore,
    transcript: Transcript,
    pending: PendingTracker,
    mode: QueryMode,
    conversation_id: String,
    important: bool,
    messages_since_save: usize,
}

impl SessionController {
    pub fn new(config: AssistantConfig, memory: MemoryStore) -> Self {
        let mut controller = Self {
            config,
            memory,
            store: MessageStore::new(),
            transcript: Transcript::new(),
            pending: PendingTracker::new(),
            mode: QueryMode::Llm,
            conversation_id: new_conversation_id(),
            important: false,
            messages_since_save: 0,
        };
        controller.render_assistant_notice(GREETING);
        controller
    }

    /// Recognize control commands, otherwise start a query turn. Commands
    /// never touch the pending tracker.
    pub fn submit_user_text(&mut self, text: &str) -> Dispatch {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Dispatch::Ignored;
        }

        let lower = trimmed.to_lowercase();
        if lower.starts_with("!weather") {
            let rest = trimmed
                .split_whitespace()
                .skip(1)
                .collect::<Vec<_>>()
                .join(" ");
            let location = if rest.is_empty() { None } else { Some(rest) };
            return Dispatch::Weather { location };
        }
        if lower == "!remember this" {
            self.important = true;
            self.render_system(REMEMBER_NOTICE);
            return Dispatch::Handled;
        }
        if lower == "!forget this" {
            self.important = false;
            self.render_system(FORGET_NOTICE);
            return Dispatch::Handled;
        }
        if lower == "!wipe memory" {
            self.reset(true);
            return Dispatch::Handled;
        }

        self.pending
            .submit(&mut self.store, &mut self.transcript, trimmed);
        self.after_user_append(trimmed);
        Dispatch::Query {
            mode: self.mode,
            text: trimmed.to_string(),
        }
    }

    /// Importance and periodic-save policy applied to substantial user
    /// messages.
    fn after_user_append(&mut self, text: &str) {
        if text.len() <= self.config.min_message_length {
            return;
        }
        self.messages_since_save += 1;

        let lower = text.to_lowercase();
        if IMPORTANT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            self.important = true;
        }

        if self.important || self.messages_since_save >= self.config.save_interval {
            self.save_memory();
            self.messages_since_save = 0;
        }
    }

    /// Report a successful reply for the in-flight turn.
    pub fn complete_turn(&mut self, reply: &str) {
        let elapsed = self.pending.elapsed();
        self.pending
            .complete(&mut self.store, &mut self.transcript, reply, elapsed);
        if self.important && reply.len() > self.config.min_message_length {
            self.save_memory();
        }
    }

    /// Report a failed turn. The error is rendered but never stored.
    pub fn fail_turn(&mut self, error_text: &str) {
        self.pending.fail(&mut self.transcript, error_text);
    }

    /// Flip between plain-LLM and search-augmented dispatch. Pure state
    /// change plus a transcript notice.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        let notice = format!("Switched to {} mode", self.mode.name().to_uppercase());
        self.render_system(&notice);
    }

    /// Start over. Wiping deletes the whole memory file; otherwise the
    /// current session is persisted first when it qualifies.
    pub fn reset(&mut self, wipe_memory: bool) {
        if wipe_memory {
            self.memory.wipe();
        } else if !self.store.is_empty() && (self.important || self.store.len() >= 3) {
            self.save_memory();
        }

        self.conversation_id = new_conversation_id();
        self.store.clear();
        self.important = false;
        self.messages_since_save = 0;
        self.pending.reset();
        self.transcript.clear();
        self.render_system(RESET_NOTICE);
        debug!(conversation_id = %self.conversation_id, "session reset");
    }

    /// Best-effort save on application exit; skip rules still apply.
    pub fn shutdown(&mut self) {
        self.save_memory();
    }

    fn save_memory(&self) {
        self.memory
            .save(&self.conversation_id, self.important, self.store.messages());
    }

    /// History lines for the outbound context window, most recent
    /// `context_window` messages in original order.
    pub fn context_lines(&self) -> Vec<String> {
        self.store
            .recent(self.config.context_window)
            .map(|m| match m.role {
                Role::User => format!("User: {}", m.content),
                _ => format!("Assistant: {}", m.content),
            })
            .collect()
    }

    /// Render an assistant notice outside a query turn (greeting). Recorded
    /// in the store like any assistant message.
    fn render_assistant_notice(&mut self, text: &str) {
        self.transcript
            .render(Tag::Assistant, &format!("Assistant: {text}\n"));
        self.store.append(Role::Assistant, text);
    }

    pub fn render_system(&mut self, text: &str) {
        self.transcript.render(Tag::System, &format!("System: {text}\n"));
    }

    pub fn render_error(&mut self, text: &str) {
        self.transcript.render(Tag::Error, &format!("Error: {text}\n"));
    }

    pub fn render_search_results(&mut self, text: &str) {
        self.transcript
            .render(Tag::SearchResults, &format!("Web Search Results:\n{text}\n"));
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn important(&self) -> bool {
        self.important
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }
}

fn new_conversation_id() -> String {
    Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// Prompt for plain LLM mode: system line, history window, new user line.
pub fn build_llm_prompt(system_prompt: &str, history: &[String], text: &str) -> String {
    let mut lines = Vec::with_capacity(history.len() + 1);
    lines.push(format!("System: {system_prompt}"));
    lines.extend_from_slice(history);
    format!("{}\nUser: {}", lines.join("\n"), text)
}

/// Prompt for search-augmented mode: the raw results ride along as system
/// lines ahead of the history window.
pub fn build_search_prompt(
    system_prompt: &str,
    history: &[String],
    text: &str,
    search_results: &str,
) -> String {
    let mut lines = Vec::with_capacity(history.len() + 3);
    lines.push(format!("System: {system_prompt}"));
    lines.push(
        "System: You have access to web search results. Use the information from these results to provide a comprehensive answer."
            .to_string(),
    );
    lines.push(format!(
        "System: Web search results for query: '{text}'\n{search_results}"
    ));
    lines.extend_from_slice(history);
    format!("{}\nUser: {}\nAssistant: ", lines.join("\n"), text)
}

/// Strip a leading reasoning block and a known stray instruction artifact.
/// Only text after the last close marker is kept.
pub fn clean_response(raw: &str) -> String {
    let mut out = raw;
    if out.contains("<think>") {
        if let Some(pos) = out.rfind(REASONING_CLOSE) {
            out = &out[pos + REASONING_CLOSE.len()..];
        }
    }
    let cleaned = out.replace(STRAY_INSTRUCTION, "");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLimits;
    use crate::pending::THINKING_PATTERN;
    use tempfile::TempDir;

    fn controller_in(dir: &TempDir) -> SessionController {
        let config = AssistantConfig::default();
        let memory = MemoryStore::new(
            dir.path().join("conversation_memory.json"),
            MemoryLimits {
                max_conversations: config.memory_max_conversations,
                max_messages: config.memory_max_messages,
                min_message_length: config.min_message_length,
            },
        );
        SessionController::new(config, memory)
    }

    #[test]
    fn greeting_is_rendered_and_recorded() {
        let dir = TempDir::new().unwrap();
        let c = controller_in(&dir);
        assert!(c.transcript().text().contains(GREETING));
        assert_eq!(c.store().len(), 1);
    }

    #[test]
    fn whitespace_input_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        assert_eq!(c.submit_user_text("   "), Dispatch::Ignored);
        assert_eq!(c.store().len(), 1);
        assert!(!c.is_pending());
    }

    #[test]
    fn normal_text_starts_a_query_turn() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        let dispatch = c.submit_user_text("what is rust?");
        assert_eq!(
            dispatch,
            Dispatch::Query {
                mode: QueryMode::Llm,
                text: "what is rust?".to_string()
            }
        );
        assert!(c.is_pending());
        assert_eq!(c.transcript().find_all(THINKING_PATTERN).len(), 1);
    }

    #[test]
    fn submit_then_complete_appends_user_and_assistant_in_order() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        c.submit_user_text("what is rust?");
        c.complete_turn("A systems language.");
        let messages = c.store().messages();
        // greeting, user, assistant
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "what is rust?");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "A systems language.");
        assert!(c.transcript().find_all(THINKING_PATTERN).is_empty());
    }

    #[test]
    fn failed_turn_is_display_only() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        c.submit_user_text("what is rust?");
        c.fail_turn("server down");
        assert!(c.transcript().find_all(THINKING_PATTERN).is_empty());
        assert!(c.transcript().text().contains("Error: server down"));
        assert!(!c.store().messages().iter().any(|m| m.content.contains("server down")));
    }

    #[test]
    fn weather_command_bypasses_pending_tracker() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        assert_eq!(
            c.submit_user_text("!Weather New York"),
            Dispatch::Weather {
                location: Some("New York".to_string())
            }
        );
        assert_eq!(c.submit_user_text("!weather"), Dispatch::Weather { location: None });
        assert!(!c.is_pending());
    }

    #[test]
    fn remember_and_forget_flip_importance() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        assert_eq!(c.submit_user_text("!remember this"), Dispatch::Handled);
        assert!(c.important());
        assert!(c.transcript().text().contains(REMEMBER_NOTICE));
        assert_eq!(c.submit_user_text("!FORGET THIS"), Dispatch::Handled);
        assert!(!c.important());
    }

    #[test]
    fn important_keyword_marks_conversation() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        c.submit_user_text("please remember my birthday is in June");
        assert!(c.important());
    }

    #[test]
    fn short_message_never_bumps_save_counter_or_importance() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        // "remember" keyword, but under the length threshold
        c.submit_user_text("remember");
        assert!(!c.important());
    }

    #[test]
    fn short_message_is_rendered_and_stored_but_not_persisted() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        c.submit_user_text("hi");
        c.complete_turn("hello! how can I help?");
        assert!(c.transcript().text().contains("You: hi\n"));
        assert!(c.store().messages().iter().any(|m| m.content == "hi"));

        c.submit_user_text("!remember this");
        c.submit_user_text("now something long enough to trigger a save");
        let data = c.memory.load();
        let record = &data[c.conversation_id()];
        assert!(!record.messages.iter().any(|m| m.content == "hi"));
    }

    #[test]
    fn wipe_memory_command_deletes_the_store() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        c.submit_user_text("!remember this");
        c.submit_user_text("a message long enough to persist immediately");
        assert!(!c.memory.load().is_empty());
        assert_eq!(c.submit_user_text("!wipe memory"), Dispatch::Handled);
        assert!(c.memory.load().is_empty());
    }

    #[test]
    fn toggle_mode_flips_and_announces() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        assert_eq!(c.mode(), QueryMode::Llm);
        c.toggle_mode();
        assert_eq!(c.mode(), QueryMode::WebSearch);
        assert!(c.transcript().text().contains("Switched to WEB_SEARCH mode"));
        c.toggle_mode();
        assert_eq!(c.mode(), QueryMode::Llm);
    }

    #[test]
    fn reset_clears_session_and_issues_fresh_id() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        c.submit_user_text("hello there friend");
        c.complete_turn("hi!");
        let old_transcript_len = c.transcript().text().len();
        c.reset(false);
        assert_eq!(c.store().len(), 0);
        assert!(!c.important());
        assert!(c.transcript().text().len() < old_transcript_len);
        assert!(c.transcript().text().contains("System:"));
    }

    #[test]
    fn reset_persists_qualifying_session() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        c.submit_user_text("first substantial message here");
        c.complete_turn("a substantial assistant reply");
        // greeting + user + assistant = 3 messages, qualifies on length
        let id = c.conversation_id().to_string();
        c.reset(false);
        assert!(c.memory.load().contains_key(&id));
    }

    #[test]
    fn context_lines_window_and_format() {
        let dir = TempDir::new().unwrap();
        let mut c = controller_in(&dir);
        for i in 0..7 {
            c.submit_user_text(&format!("question number {i} padded out"));
            c.complete_turn(&format!("answer number {i}"));
        }
        let lines = c.context_lines();
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| l.starts_with("User: ") || l.starts_with("Assistant: ")));
        assert_eq!(lines.last().unwrap(), "Assistant: answer number 6");
    }

    #[test]
    fn llm_prompt_shape() {
        let history = vec!["User: hi there".to_string(), "Assistant: hello".to_string()];
        let prompt = build_llm_prompt("Be helpful.", &history, "what now?");
        assert_eq!(
            prompt,
            "System: Be helpful.\nUser: hi there\nAssistant: hello\nUser: what now?"
        );
    }

    #[test]
    fn search_prompt_includes_results_and_trailing_assistant_cue() {
        let prompt = build_search_prompt("Be helpful.", &[], "rust news", "1. Rust 1.80\n");
        assert!(prompt.starts_with("System: Be helpful.\n"));
        assert!(prompt.contains("System: Web search results for query: 'rust news'\n1. Rust 1.80\n"));
        assert!(prompt.ends_with("\nUser: rust news\nAssistant: "));
    }

    #[test]
    fn clean_response_strips_reasoning_and_artifact() {
        assert_eq!(
            clean_response("<think>chain of thought</think>  the answer  "),
            "the answer"
        );
        assert_eq!(
            clean_response("the answer [Focus on current question only]"),
            "the answer"
        );
        assert_eq!(clean_response("plain"), "plain");
        assert_eq!(clean_response("<think>never closed"), "<think>never closed");
    }
}
