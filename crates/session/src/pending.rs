//! Lifecycle of the single "Thinking..." placeholder.
//!
//! Rich-text surfaces offer no stable handle to a line once more text lands
//! after it, so removal matches the literal placeholder text and deletes by
//! range, in reverse document order. Removal always deletes *every* match:
//! if a stray duplicate placeholder ever gets inserted (two submits before a
//! completion), the next complete/fail still clears the transcript of them.

use std::time::{Duration, Instant};

use shared::chat::Role;

use crate::store::MessageStore;
use crate::transcript::{Tag, Transcript};

/// Literal text of the placeholder line, matched case-insensitively.
pub const THINKING_PATTERN: &str = "Assistant: Thinking...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    Idle,
    Pending,
}

#[derive(Debug)]
pub struct PendingTracker {
    state: PendingState,
    started: Option<Instant>,
}

impl Default for PendingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingTracker {
    pub fn new() -> Self {
        Self {
            state: PendingState::Idle,
            started: None,
        }
    }

    pub fn state(&self) -> PendingState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == PendingState::Pending
    }

    /// Time since the most recent submit.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Record the user message, render it, start the latency timer, and show
    /// the placeholder. A second submit while pending restarts the timer and
    /// inserts a second placeholder; complete/fail removes them all.
    pub fn submit(&mut self, store: &mut MessageStore, transcript: &mut Transcript, text: &str) {
        store.append(Role::User, text);
        transcript.render(Tag::User, &format!("You: {text}\n"));
        self.started = Some(Instant::now());
        transcript.render(Tag::Thinking, &format!("{THINKING_PATTERN}\n"));
        self.state = PendingState::Pending;
    }

    /// Replace the placeholder with the assistant reply and its latency, and
    /// record the reply in the store.
    pub fn complete(
        &mut self,
        store: &mut MessageStore,
        transcript: &mut Transcript,
        reply: &str,
        elapsed: Duration,
    ) {
        remove_placeholders(transcript);
        transcript.render(Tag::Assistant, &format!("Assistant: {reply}"));
        transcript.render(Tag::Time, &format!(" [{:.2}s]", elapsed.as_secs_f64()));
        transcript.render(Tag::Assistant, "\n");
        store.append(Role::Assistant, reply);
        self.state = PendingState::Idle;
        self.started = None;
    }

    /// Replace the placeholder with an error block. Errors are display-only
    /// and never enter the message store.
    pub fn fail(&mut self, transcript: &mut Transcript, error_text: &str) {
        remove_placeholders(transcript);
        transcript.render(Tag::Error, &format!("Error: {error_text}\n"));
        self.state = PendingState::Idle;
        self.started = None;
    }

    /// Drop any in-flight state without touching the transcript (used by
    /// session reset, which clears the whole transcript anyway).
    pub fn reset(&mut self) {
        self.state = PendingState::Idle;
        self.started = None;
    }
}

/// Delete every placeholder line, each through its trailing newline.
/// Reverse order keeps earlier ranges valid across deletes.
fn remove_placeholders(transcript: &mut Transcript) {
    let lines: Vec<_> = transcript
        .find_all(THINKING_PATTERN)
        .into_iter()
        .map(|r| {
            let text = transcript.text();
            let end = text[r.end..]
                .find('\n')
                .map(|i| r.end + i + 1)
                .unwrap_or(text.len());
            r.start..end
        })
        .collect();
    for range in lines.into_iter().rev() {
        transcript.delete(range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (PendingTracker, MessageStore, Transcript) {
        (PendingTracker::new(), MessageStore::new(), Transcript::new())
    }

    #[test]
    fn submit_shows_placeholder_and_records_user_message() {
        let (mut tracker, mut store, mut transcript) = fixture();
        tracker.submit(&mut store, &mut transcript, "what is rust?");
        assert!(tracker.is_pending());
        assert_eq!(store.len(), 1);
        assert_eq!(transcript.find_all(THINKING_PATTERN).len(), 1);
    }

    #[test]
    fn complete_removes_placeholder_and_appends_reply() {
        let (mut tracker, mut store, mut transcript) = fixture();
        tracker.submit(&mut store, &mut transcript, "what is rust?");
        tracker.complete(
            &mut store,
            &mut transcript,
            "A systems language.",
            Duration::from_millis(1234),
        );
        assert_eq!(tracker.state(), PendingState::Idle);
        assert!(transcript.find_all(THINKING_PATTERN).is_empty());
        assert!(transcript.text().contains("Assistant: A systems language. [1.23s]\n"));

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, shared::chat::Role::User);
        assert_eq!(messages[0].content, "what is rust?");
        assert_eq!(messages[1].role, shared::chat::Role::Assistant);
        assert_eq!(messages[1].content, "A systems language.");
    }

    #[test]
    fn fail_removes_placeholder_without_recording_error() {
        let (mut tracker, mut store, mut transcript) = fixture();
        tracker.submit(&mut store, &mut transcript, "what is rust?");
        tracker.fail(&mut transcript, "server down");
        assert_eq!(tracker.state(), PendingState::Idle);
        assert!(transcript.find_all(THINKING_PATTERN).is_empty());
        assert!(transcript.text().contains("Error: server down\n"));
        // error text is display-only
        assert_eq!(store.len(), 1);
        assert!(!store.messages().iter().any(|m| m.content.contains("server down")));
    }

    #[test]
    fn double_submit_leaves_no_orphan_placeholder() {
        let (mut tracker, mut store, mut transcript) = fixture();
        tracker.submit(&mut store, &mut transcript, "first");
        tracker.submit(&mut store, &mut transcript, "second");
        assert_eq!(transcript.find_all(THINKING_PATTERN).len(), 2);
        tracker.complete(&mut store, &mut transcript, "reply", Duration::from_secs(1));
        assert!(transcript.find_all(THINKING_PATTERN).is_empty());
    }

    #[test]
    fn user_lines_survive_placeholder_removal() {
        let (mut tracker, mut store, mut transcript) = fixture();
        tracker.submit(&mut store, &mut transcript, "keep me");
        tracker.fail(&mut transcript, "boom");
        assert!(transcript.text().contains("You: keep me\n"));
    }
}
