//! Conversation list use cases.
//!
//! - `fetcher`: builds the deduplicated summary list from the store
//! - `presentation`: joins summaries with participant profiles for display

mod fetcher;
mod presentation;

pub use fetcher::{ConversationFetcher, FetchOutcome, summarize};
pub use presentation::{ConversationRow, join_rows};
