//! Asset storage domain module.
//!
//! # Module Structure
//!
//! - `blob`: Blob store trait, transfer events and provider errors
//! - `upload_file`: In-memory representation of a file picked for upload

mod blob;
mod upload_file;

pub use blob::{
    BlobStore, StorageError, StorageErrorCode, TransferEvent, UploadHandle, UploadMetadata,
};
pub use upload_file::{DEFAULT_CONTENT_TYPE, UploadFile};
