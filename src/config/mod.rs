//! Shared JSON configuration

pub mod document;
pub mod lenient;
pub mod store;

pub use document::ConfigDocument;
pub use store::{AtomicConfigStore, ConfigError};
