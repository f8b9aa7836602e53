//! Infrastructure layer for EchecEtMatch.
//!
//! Concrete repositories and configuration loading.

pub mod config_service;
pub mod document_store;
pub mod paths;

pub use config_service::ConfigService;
pub use document_store::{GameEntry, InMemoryDocumentStore, StoreExport};
pub use paths::EchecPaths;
