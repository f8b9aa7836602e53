//! Participant domain module.
//!
//! Profiles of conversation counterparts, as cached by the participant
//! lookup.

mod model;

pub use model::ParticipantProfile;
