//! Local persistence.

pub mod key_value;
pub mod toml_document;

pub use key_value::{FileKeyValueStore, MemoryKeyValueStore};
pub use toml_document::{TomlDocument, TomlDocumentError};
