//! Prefix-scoped object operations
//!
//! [`Explorer`] turns flat bucket/key primitives into the folder-shaped
//! operations the UI offers: delimited listing, folder markers, recursive
//! folder deletion, uploads into a folder, and copy/move with destination
//! key resolution. Every operation is one provider call or a short fixed
//! sequence of them. Nothing is retried and nothing is rolled back.

use std::sync::Arc;

use futures::{Stream, TryStreamExt, stream};
use tracing::{debug, info, warn};

use crate::error::{Error, Result, StorageErrorKind};
use crate::key::{
    DELIMITER, ObjectKey, Prefix, download_filename, resolve_destination_key, sanitize_filename,
};
use crate::traits::{ListOptions, ListPage, MAX_DELETE_BATCH, ObjectInfo, ObjectRef, ObjectStore};

/// Content type used when neither the object nor its name says otherwise
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Contents of one folder level
#[derive(Debug, Clone, PartialEq)]
pub struct FolderListing {
    /// Normalized prefix that was listed
    pub prefix: Prefix,
    /// Sub-folders (common prefixes)
    pub folders: Vec<Prefix>,
    /// Objects directly inside the folder, excluding its own marker
    pub objects: Vec<ObjectInfo>,
}

/// Result of a recursive folder delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderDeletion {
    /// Folder that was deleted
    pub prefix: Prefix,
    /// Enclosing folder, where the UI returns to
    pub parent: Prefix,
    /// Number of keys the provider reported as deleted
    pub deleted: usize,
    /// Number of keys the provider refused to delete
    pub failed: usize,
    /// Number of `delete_objects` calls issued
    pub batches: usize,
}

/// A file received from the browser
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name as sent by the browser
    pub filename: String,
    /// File content
    pub data: Vec<u8>,
    /// Content type as sent by the browser
    pub content_type: Option<String>,
}

/// An object ready to send to the browser
#[derive(Debug, Clone)]
pub struct Download {
    /// Suggested file name
    pub filename: String,
    /// Content type header value
    pub content_type: String,
    /// File content
    pub data: Vec<u8>,
}

/// Parameters of a copy or move
#[derive(Debug, Clone, Default)]
pub struct TransferRequest {
    /// Source bucket
    pub src_bucket: String,
    /// Source key
    pub src_key: String,
    /// Destination bucket
    pub dest_bucket: String,
    /// Destination hint: blank, a folder ending in `/`, or a full key
    pub dest_key: String,
}

impl TransferRequest {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("src_bucket", &self.src_bucket),
            ("src_key", &self.src_key),
            ("dest_bucket", &self.dest_bucket),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("Missing required field: {field}")));
            }
        }
        Ok(())
    }

    /// Source location
    pub fn source(&self) -> ObjectRef {
        ObjectRef::new(&self.src_bucket, &self.src_key)
    }

    /// Destination location after key resolution
    pub fn destination(&self) -> ObjectRef {
        ObjectRef::new(
            &self.dest_bucket,
            resolve_destination_key(&self.src_key, &self.dest_key),
        )
    }
}

/// Folder-aware operations over a shared [`ObjectStore`]
///
/// Cheap to clone; all clones share one provider handle.
#[derive(Clone)]
pub struct Explorer {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer").finish_non_exhaustive()
    }
}

fn require_name(kind: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation(format!("{kind} name required")));
    }
    Ok(name.to_string())
}

impl Explorer {
    /// Create an explorer over a provider handle
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// The underlying provider handle
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// All buckets visible to the configured credentials
    pub async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        self.store.list_buckets().await
    }

    /// Create a bucket; the name is trimmed and must not be empty
    pub async fn create_bucket(&self, name: &str) -> Result<String> {
        let name = require_name("Bucket", name)?;
        self.store.create_bucket(&name).await?;
        info!(bucket = %name, "bucket created");
        Ok(name)
    }

    /// Delete an empty bucket; the name is trimmed and must not be empty
    pub async fn delete_bucket(&self, name: &str) -> Result<String> {
        let name = require_name("Bucket", name)?;
        self.store.delete_bucket(&name).await?;
        info!(bucket = %name, "bucket deleted");
        Ok(name)
    }

    /// Lazy sequence of list pages under `prefix`
    ///
    /// With `delimited` set, keys are grouped into common prefixes at the next
    /// `/`. The stream follows continuation tokens and ends when the provider
    /// reports no further page; calling again restarts from the first page.
    pub fn key_pages<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a Prefix,
        delimited: bool,
    ) -> impl Stream<Item = Result<ListPage>> + Send + 'a {
        enum Cursor {
            Start,
            Next(String),
            Done,
        }

        stream::try_unfold(Cursor::Start, move |cursor| async move {
            let continuation_token = match cursor {
                Cursor::Done => return Ok(None),
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
            };

            let options = ListOptions {
                prefix: (!prefix.is_root()).then(|| prefix.to_string()),
                delimiter: delimited.then(|| DELIMITER.to_string()),
                continuation_token,
                max_keys: None,
            };
            let page = self.store.list_objects(bucket, options).await?;

            let next = match (page.truncated, &page.continuation_token) {
                (true, Some(token)) => Cursor::Next(token.clone()),
                _ => Cursor::Done,
            };
            Ok::<_, Error>(Some((page, next)))
        })
    }

    /// List one folder level
    ///
    /// The raw prefix is normalized first. The marker object whose key equals
    /// the prefix itself is left out of `objects`.
    pub async fn list_folder(&self, bucket: &str, raw_prefix: &str) -> Result<FolderListing> {
        let prefix = Prefix::new(raw_prefix);
        let mut listing = FolderListing {
            prefix: prefix.clone(),
            folders: Vec::new(),
            objects: Vec::new(),
        };

        let mut pages = std::pin::pin!(self.key_pages(bucket, &prefix, true));
        while let Some(page) = pages.try_next().await? {
            listing
                .folders
                .extend(page.common_prefixes.into_iter().map(Prefix::new));
            listing.objects.extend(
                page.objects
                    .into_iter()
                    .filter(|object| object.key != prefix.as_str()),
            );
        }

        debug!(
            bucket,
            prefix = %prefix,
            folders = listing.folders.len(),
            objects = listing.objects.len(),
            "folder listed"
        );
        Ok(listing)
    }

    /// Store an uploaded file inside the folder `raw_prefix`
    pub async fn upload(&self, bucket: &str, raw_prefix: &str, upload: Upload) -> Result<ObjectKey> {
        if upload.filename.is_empty() {
            return Err(Error::validation("No file selected"));
        }
        let filename = sanitize_filename(&upload.filename);
        if filename.is_empty() {
            return Err(Error::validation("Invalid filename"));
        }

        let key = Prefix::new(raw_prefix).join_file(&filename);
        let content_type = upload
            .content_type
            .filter(|ct| !ct.is_empty() && ct != FALLBACK_CONTENT_TYPE)
            .or_else(|| mime_guess::from_path(&filename).first_raw().map(str::to_string));
        let size = upload.data.len();

        self.store
            .put_object(bucket, key.as_str(), upload.data, content_type)
            .await?;
        info!(bucket, key = %key, size, "object uploaded");
        Ok(key)
    }

    /// Fetch an object for download
    pub async fn download(&self, bucket: &str, key: &str) -> Result<Download> {
        let object = self.store.get_object(bucket, key).await?;
        let filename = download_filename(key).to_string();
        let content_type = object
            .content_type
            .filter(|ct| !ct.is_empty())
            .or_else(|| mime_guess::from_path(&filename).first_raw().map(str::to_string))
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        Ok(Download {
            filename,
            content_type,
            data: object.data,
        })
    }

    /// Delete one object, returning the folder it lived in
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<Prefix> {
        let key = ObjectKey::parse(key);
        self.store.delete_object(bucket, key.as_str()).await?;
        info!(bucket, key = %key, "object deleted");
        Ok(key.parent_prefix())
    }

    /// Create a folder by writing a zero-byte marker
    ///
    /// A name that is empty after trimming whitespace and slashes is rejected
    /// without contacting the provider.
    pub async fn create_folder(
        &self,
        bucket: &str,
        raw_parent: &str,
        name: &str,
    ) -> Result<ObjectKey> {
        let marker = Prefix::new(raw_parent).join_folder(name)?;
        self.store
            .put_object(bucket, marker.as_str(), Vec::new(), None)
            .await?;
        info!(bucket, key = %marker, "folder created");
        Ok(marker)
    }

    /// Delete every object under a folder prefix
    ///
    /// Keys are collected page by page and flushed in batches of exactly
    /// [`MAX_DELETE_BATCH`], with one final call for the remainder. The first
    /// failing call aborts the operation; batches already sent stay deleted.
    pub async fn delete_folder(&self, bucket: &str, raw_prefix: &str) -> Result<FolderDeletion> {
        if raw_prefix.is_empty() {
            return Err(Error::validation("Folder prefix required"));
        }
        let prefix = Prefix::new(raw_prefix);

        let mut deletion = FolderDeletion {
            parent: prefix.parent(),
            prefix: prefix.clone(),
            deleted: 0,
            failed: 0,
            batches: 0,
        };
        let mut batch = Vec::with_capacity(MAX_DELETE_BATCH);

        let mut pages = std::pin::pin!(self.key_pages(bucket, &prefix, false));
        while let Some(page) = pages.try_next().await? {
            for object in page.objects {
                batch.push(object.key);
                if batch.len() == MAX_DELETE_BATCH {
                    self.flush_batch(bucket, &mut batch, &mut deletion).await?;
                }
            }
        }
        if !batch.is_empty() {
            self.flush_batch(bucket, &mut batch, &mut deletion).await?;
        }

        info!(
            bucket,
            prefix = %prefix,
            deleted = deletion.deleted,
            failed = deletion.failed,
            batches = deletion.batches,
            "folder deleted"
        );
        Ok(deletion)
    }

    async fn flush_batch(
        &self,
        bucket: &str,
        batch: &mut Vec<String>,
        deletion: &mut FolderDeletion,
    ) -> Result<()> {
        let keys = std::mem::replace(batch, Vec::with_capacity(MAX_DELETE_BATCH));
        let result = self.store.delete_objects(bucket, keys).await?;
        if !result.errors.is_empty() {
            let refused: Vec<&str> = result.errors.iter().map(|e| e.key.as_str()).collect();
            warn!(bucket, ?refused, "some objects could not be deleted");
        }
        deletion.deleted += result.deleted.len();
        deletion.failed += result.errors.len();
        deletion.batches += 1;
        Ok(())
    }

    /// Copy an object, returning where it landed
    ///
    /// Copying an object onto itself is a no-op.
    pub async fn copy_object(&self, request: &TransferRequest) -> Result<ObjectRef> {
        request.validate()?;
        let (src, dst) = (request.source(), request.destination());
        if src == dst {
            debug!(object = %src, "copy onto itself skipped");
            return Ok(dst);
        }

        self.store.copy_object(&src, &dst).await?;
        info!(from = %src, to = %dst, "object copied");
        Ok(dst)
    }

    /// Move an object by copying it and then deleting the source
    ///
    /// Not atomic: the provider offers no rename primitive. If the copy
    /// succeeds and the delete fails, the object exists at both locations and
    /// the error says so. Moving an object onto itself is a no-op.
    pub async fn move_object(&self, request: &TransferRequest) -> Result<ObjectRef> {
        request.validate()?;
        let (src, dst) = (request.source(), request.destination());
        if src == dst {
            debug!(object = %src, "move onto itself skipped");
            return Ok(dst);
        }

        self.store.copy_object(&src, &dst).await?;
        if let Err(err) = self.store.delete_object(&src.bucket, &src.key).await {
            warn!(from = %src, to = %dst, error = %err, "copied but source not deleted");
            let kind = err.storage_kind().unwrap_or(StorageErrorKind::Other);
            return Err(Error::storage(
                "move",
                kind,
                format!("object now exists at both {src} and {dst}: {err}"),
            ));
        }

        info!(from = %src, to = %dst, "object moved");
        Ok(dst)
    }
}
