//! Domain layer for EchecEtMatch.
//!
//! Holds the document shapes read from the store, the repository traits the
//! application layer is written against, the shared error type and the
//! configuration model.

pub mod config;
pub mod conversation;
pub mod error;
pub mod participant;
pub mod profile;
pub mod repository;

// Re-export common error type
pub use error::EchecError;
