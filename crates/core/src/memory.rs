//! In-memory ObjectStore
//!
//! Reproduces the listing semantics of S3 (prefix, delimiter, common
//! prefixes, page size, continuation tokens) and the 1000-key cap on batch
//! deletes. Used by the route tests and by anyone running the UI without a
//! provider. Individual operations can be made to fail on demand.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result, StorageErrorKind};
use crate::traits::{
    BatchDeleteResult, ListOptions, ListPage, MAX_DELETE_BATCH, ObjectData, ObjectInfo,
    ObjectRef, ObjectStore,
};

/// Page size used when the caller does not ask for one
const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
    last_modified: jiff::Timestamp,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, Bucket>,
    failing: HashSet<&'static str>,
    delete_batches: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct Bucket {
    created: Option<jiff::Timestamp>,
    objects: BTreeMap<String, StoredObject>,
}

/// Thread-safe in-memory object store
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cap every list page at `page_size` entries
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every call to `operation` fail until [`MemoryStore::recover`]
    pub async fn fail_on(&self, operation: &'static str) {
        self.state.write().await.failing.insert(operation);
    }

    /// Stop failing `operation`
    pub async fn recover(&self, operation: &'static str) {
        self.state.write().await.failing.remove(operation);
    }

    /// Key lists of every accepted `delete_objects` call, in order
    pub async fn delete_batches(&self) -> Vec<Vec<String>> {
        self.state.read().await.delete_batches.clone()
    }

    /// Whether an object exists
    pub async fn contains(&self, bucket: &str, key: &str) -> bool {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .is_some_and(|b| b.objects.contains_key(key))
    }

    /// All keys in a bucket, sorted
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn injected(state: &State, operation: &'static str) -> Result<()> {
    if state.failing.contains(operation) {
        return Err(Error::storage(
            operation,
            StorageErrorKind::Other,
            "InternalError: injected failure",
        ));
    }
    Ok(())
}

fn no_such_bucket(operation: &'static str, bucket: &str) -> Error {
    Error::storage(
        operation,
        StorageErrorKind::NotFound,
        format!("NoSuchBucket: {bucket}"),
    )
}

/// Continuation tokens remember the last entry handed out and whether it was
/// a common prefix, in which case everything below it is skipped too.
fn encode_token(entry: &Entry) -> String {
    match entry {
        Entry::Object(key) => format!("k:{key}"),
        Entry::Prefix(prefix) => format!("p:{prefix}"),
    }
}

fn resume_after(token: &str, key: &str) -> bool {
    if let Some(last) = token.strip_prefix("p:") {
        key > last && !key.starts_with(last)
    } else {
        key > token.strip_prefix("k:").unwrap_or(token)
    }
}

enum Entry {
    Object(String),
    Prefix(String),
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let state = self.state.read().await;
        injected(&state, "list_buckets")?;
        Ok(state
            .buckets
            .iter()
            .map(|(name, bucket)| {
                let mut info = ObjectInfo::bucket(name);
                info.last_modified = bucket.created;
                info
            })
            .collect())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.state.write().await;
        injected(&state, "create_bucket")?;
        if state.buckets.contains_key(bucket) {
            return Err(Error::storage(
                "create_bucket",
                StorageErrorKind::Conflict,
                format!("BucketAlreadyOwnedByYou: {bucket}"),
            ));
        }
        state.buckets.insert(
            bucket.to_string(),
            Bucket {
                created: Some(jiff::Timestamp::now()),
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.state.write().await;
        injected(&state, "delete_bucket")?;
        match state.buckets.get(bucket) {
            None => Err(no_such_bucket("delete_bucket", bucket)),
            Some(b) if !b.objects.is_empty() => Err(Error::storage(
                "delete_bucket",
                StorageErrorKind::Conflict,
                format!("BucketNotEmpty: {bucket}"),
            )),
            Some(_) => {
                state.buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListPage> {
        let state = self.state.read().await;
        injected(&state, "list_objects")?;
        let objects = &state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket("list_objects", bucket))?
            .objects;

        let prefix = options.prefix.unwrap_or_default();
        let delimiter = options.delimiter.filter(|d| !d.is_empty());
        let limit = options
            .max_keys
            .and_then(|m| usize::try_from(m).ok())
            .filter(|m| *m > 0)
            .map_or(self.page_size, |m| m.min(self.page_size));

        let mut page = ListPage::default();
        let mut seen_prefixes = BTreeSet::new();
        let mut emitted = 0usize;
        let mut last: Option<Entry> = None;

        let candidates = objects
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| {
                options
                    .continuation_token
                    .as_deref()
                    .is_none_or(|token| resume_after(token, key))
            });

        for (key, object) in candidates {
            let rest = &key[prefix.len()..];
            let common = delimiter
                .as_deref()
                .and_then(|d| rest.find(d).map(|pos| format!("{prefix}{}", &rest[..pos + d.len()])));

            if let Some(common) = &common {
                if seen_prefixes.contains(common) {
                    continue;
                }
            }

            if emitted == limit {
                page.truncated = true;
                page.continuation_token = last.as_ref().map(encode_token);
                break;
            }
            emitted += 1;

            match common {
                Some(common) => {
                    seen_prefixes.insert(common.clone());
                    page.common_prefixes.push(common.clone());
                    last = Some(Entry::Prefix(common));
                }
                None => {
                    let size = i64::try_from(object.data.len()).unwrap_or(i64::MAX);
                    let mut info = ObjectInfo::file(key, size);
                    info.last_modified = Some(object.last_modified);
                    page.objects.push(info);
                    last = Some(Entry::Object(key.clone()));
                }
            }
        }

        Ok(page)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectData> {
        let state = self.state.read().await;
        injected(&state, "get_object")?;
        let object = state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket("get_object", bucket))?
            .objects
            .get(key)
            .ok_or_else(|| {
                Error::storage(
                    "get_object",
                    StorageErrorKind::NotFound,
                    format!("NoSuchKey: {key}"),
                )
            })?;
        Ok(ObjectData {
            data: object.data.clone(),
            content_type: object.content_type.clone(),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        injected(&state, "put_object")?;
        state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket("put_object", bucket))?
            .objects
            .insert(
                key.to_string(),
                StoredObject {
                    data,
                    content_type,
                    last_modified: jiff::Timestamp::now(),
                },
            );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut state = self.state.write().await;
        injected(&state, "delete_object")?;
        state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket("delete_object", bucket))?
            .objects
            .remove(key);
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<BatchDeleteResult> {
        let mut state = self.state.write().await;
        injected(&state, "delete_objects")?;
        if keys.len() > MAX_DELETE_BATCH {
            return Err(Error::validation(format!(
                "Cannot delete more than {MAX_DELETE_BATCH} objects in one request"
            )));
        }
        let objects = &mut state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket("delete_objects", bucket))?
            .objects;
        for key in &keys {
            objects.remove(key);
        }
        state.delete_batches.push(keys.clone());
        Ok(BatchDeleteResult {
            deleted: keys,
            errors: Vec::new(),
        })
    }

    async fn copy_object(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()> {
        let mut state = self.state.write().await;
        injected(&state, "copy_object")?;
        let object = state
            .buckets
            .get(&src.bucket)
            .ok_or_else(|| no_such_bucket("copy_object", &src.bucket))?
            .objects
            .get(&src.key)
            .cloned()
            .ok_or_else(|| {
                Error::storage(
                    "copy_object",
                    StorageErrorKind::NotFound,
                    format!("NoSuchKey: {}", src.key),
                )
            })?;
        state
            .buckets
            .get_mut(&dst.bucket)
            .ok_or_else(|| no_such_bucket("copy_object", &dst.bucket))?
            .objects
            .insert(
                dst.key.clone(),
                StoredObject {
                    last_modified: jiff::Timestamp::now(),
                    ..object
                },
            );
        Ok(())
    }
}
