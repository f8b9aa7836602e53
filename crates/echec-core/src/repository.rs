//! Repository trait re-exports.
//!
//! Every store seam the application layer depends on, in one place.

pub use crate::conversation::ConversationRepository;
pub use crate::profile::{GameCatalogRepository, ProfileRepository};
