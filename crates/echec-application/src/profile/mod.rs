//! Profile page: own profile fields and game picks.

mod selection;
mod service;

pub use selection::{GameSelection, ToggleOutcome};
pub use service::ProfileService;
