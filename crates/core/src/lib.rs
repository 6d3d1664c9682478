//! s3desk-core: Core library for the s3desk object storage file manager
//!
//! This crate provides:
//! - Configuration management
//! - The key/prefix model used to emulate folders on a flat key space
//! - The ObjectStore trait for provider operations
//! - The prefix-scoped operations layer ([`Explorer`]) the web UI calls
//!
//! It is independent of any specific S3 SDK and of the HTTP framework.

pub mod config;
pub mod error;
pub mod explorer;
pub mod key;
pub mod memory;
pub mod traits;

pub use config::{Config, ConfigManager, ServerConfig, StorageConfig};
pub use error::{Error, Result, StorageErrorKind};
pub use explorer::{Download, Explorer, FolderDeletion, FolderListing, TransferRequest, Upload};
pub use key::{ObjectKey, Prefix, resolve_destination_key, sanitize_filename};
pub use memory::MemoryStore;
pub use traits::{
    BatchDeleteResult, DeleteFailure, ListOptions, ListPage, MAX_DELETE_BATCH, ObjectData,
    ObjectInfo, ObjectRef, ObjectStore,
};
