//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `model`: store documents (`ConversationRecord`) and list rows (`ConversationSummary`)
//! - `event`: session phases and the signals published to the presentation layer
//! - `repository`: the conversation query the list is built from

mod event;
mod model;
mod repository;

// Re-export public API
pub use event::{ConversationEvent, EnrichmentProgress, SessionPhase};
pub use model::{ConversationRecord, ConversationSummary};
pub use repository::ConversationRepository;
