pub mod config;
pub mod conversations;
pub mod profile;
