//! Infrastructure layer for the Templr client.
//!
//! Local persistence (config file, interaction store, platform paths) and
//! in-process implementations of the hosted identity, document and blob
//! services used for development and testing.

pub mod config_service;
pub mod memory_blob_store;
pub mod memory_document_store;
pub mod memory_identity_provider;
pub mod paths;
pub mod push_id;
pub mod storage;

pub use config_service::ConfigService;
pub use memory_blob_store::{MemoryBlobStore, StoredObject, UploadBehavior};
pub use memory_document_store::MemoryDocumentStore;
pub use memory_identity_provider::MemoryIdentityProvider;
pub use paths::{PathError, TemplrPaths};
pub use push_id::PushIdGenerator;
pub use storage::{FileKeyValueStore, MemoryKeyValueStore, TomlDocument, TomlDocumentError};
