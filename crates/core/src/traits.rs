//! ObjectStore trait definition
//!
//! This trait defines the primitive bucket and object calls the operations
//! layer is built from. It keeps [`crate::Explorer`] decoupled from the
//! provider SDK so it can run against the in-memory store or a mock.

use async_trait::async_trait;

use crate::error::Result;

/// Largest key count the provider accepts in one `delete_objects` call
pub const MAX_DELETE_BATCH: usize = 1000;

/// Metadata for an object or bucket
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets)
    pub size_bytes: Option<i64>,

    /// Human-readable size
    pub size_human: Option<String>,

    /// Last modified timestamp (creation date for buckets)
    pub last_modified: Option<jiff::Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    pub etag: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(
                u64::try_from(size).unwrap_or_default(),
                humansize::BINARY,
            )),
            last_modified: None,
            etag: None,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self {
            key: name.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
        }
    }
}

/// Options for a single list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Prefix to filter by
    pub prefix: Option<String>,

    /// Delimiter for grouping (usually "/"); None lists every key under the prefix
    pub delimiter: Option<String>,

    /// Continuation token from the previous page
    pub continuation_token: Option<String>,

    /// Maximum number of entries per page (provider default when None)
    pub max_keys: Option<i32>,
}

/// One page of a list call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Objects whose keys matched
    pub objects: Vec<ObjectInfo>,

    /// Common prefixes produced by the delimiter
    pub common_prefixes: Vec<String>,

    /// Whether more entries are available
    pub truncated: bool,

    /// Token for the next page, present when truncated
    pub continuation_token: Option<String>,
}

/// Object body plus the headers the browser needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectData {
    /// Raw content
    pub data: Vec<u8>,

    /// Stored content type, if any
    pub content_type: Option<String>,
}

/// A key that the provider refused to delete inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    /// Object key
    pub key: String,

    /// Provider message
    pub message: String,
}

/// Outcome of a batch delete that the provider accepted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteResult {
    /// Keys reported as deleted
    pub deleted: Vec<String>,

    /// Keys reported as failed
    pub errors: Vec<DeleteFailure>,
}

/// A (bucket, key) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Bucket name
    pub bucket: String,

    /// Object key
    pub key: String,
}

impl ObjectRef {
    /// Create a new ObjectRef
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Trait for S3-compatible storage operations
///
/// Every method is a single provider round trip; implementations never retry.
/// The handle is shared by all requests, so implementations must be safe for
/// concurrent use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// List one page of objects
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListPage>;

    /// Get object content
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectData>;

    /// Write an object, replacing any existing one
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()>;

    /// Delete a single object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete up to [`MAX_DELETE_BATCH`] objects in one call
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<BatchDeleteResult>;

    /// Server-side copy
    async fn copy_object(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_file() {
        let info = ObjectInfo::file("test.txt", 1024);
        assert_eq!(info.key, "test.txt");
        assert_eq!(info.size_bytes, Some(1024));
        assert_eq!(info.size_human.as_deref(), Some("1 KiB"));
    }

    #[test]
    fn test_object_info_bucket() {
        let info = ObjectInfo::bucket("my-bucket");
        assert_eq!(info.key, "my-bucket");
        assert!(info.size_bytes.is_none());
    }

    #[test]
    fn test_object_ref_display() {
        let r = ObjectRef::new("bucket", "a/b.txt");
        assert_eq!(r.to_string(), "bucket/a/b.txt");
    }
}
