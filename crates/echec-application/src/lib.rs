//! Application layer for EchecEtMatch.
//!
//! Use cases coordinating the domain types of `echec-core` with the
//! repositories injected by the caller:
//!
//! - [`ConversationSession`]: conversation list of the signed-in user,
//!   enriched with counterpart profiles as they arrive
//! - [`ProfileService`]: the signed-in user's own profile and game picks

pub mod conversation;
pub mod participant;
pub mod profile;
pub mod session;

pub use conversation::{ConversationFetcher, ConversationRow};
pub use participant::{ParticipantEnricher, ParticipantLookup};
pub use profile::{GameSelection, ProfileService, ToggleOutcome};
pub use session::{ConversationSession, CycleOutcome, RowSubscription, SessionSnapshot};
