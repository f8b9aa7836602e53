//! Session-level orchestration of the conversation list.

mod conversation_session;

pub use conversation_session::{ConversationSession, CycleOutcome, RowSubscription, SessionSnapshot};
