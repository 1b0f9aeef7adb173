//! Session core: the transcript/session state machine.
//!
//! Owns the append-only message log, the tagged transcript buffer, the
//! "Thinking..." placeholder lifecycle, command dispatch, prompt construction,
//! and the bounded on-disk conversation memory. No I/O besides the memory
//! file; HTTP collaborators live in the `providers` crate.

pub mod controller;
pub mod memory;
pub mod pending;
pub mod store;
pub mod transcript;

pub use controller::{Dispatch, QueryMode, SessionController};
pub use memory::{ConversationRecord, MemoryLimits, MemoryStore};
pub use pending::{PendingState, PendingTracker, THINKING_PATTERN};
pub use store::MessageStore;
pub use transcript::{Tag, Transcript};
