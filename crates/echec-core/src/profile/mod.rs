//! Profile domain module.
//!
//! # Module Structure
//!
//! - `model`: raw user documents and the editable profile view
//! - `repository`: user collection and game catalog access

mod model;
mod repository;

// Re-export public API
pub use model::{ProfileField, UserDocument, UserProfile};
pub use repository::{GameCatalogRepository, ProfileRepository};
