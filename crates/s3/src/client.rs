//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3desk-core.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use aws_smithy_types::error::display::DisplayErrorContext;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use s3desk_core::{
    BatchDeleteResult, DeleteFailure, Error, ListOptions, ListPage, MAX_DELETE_BATCH, ObjectData,
    ObjectInfo, ObjectRef, ObjectStore, Result, StorageConfig, StorageErrorKind,
};

/// Region that rejects an explicit LocationConstraint
const DEFAULT_REGION: &str = "us-east-1";

/// Characters left unescaped in the `x-amz-copy-source` header
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// S3 client wrapper
///
/// Holds one SDK client for the life of the process. The SDK client is
/// internally reference counted and safe to share between requests.
#[derive(Debug, Clone)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    region: String,
}

impl S3Client {
    /// Create a new S3 client from the storage configuration
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some((access_key, secret_key)) = config.static_credentials() {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "s3desk-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style())
            .build();

        tracing::debug!(
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            path_style = config.force_path_style(),
            "S3 client configured"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            region: config.region.clone(),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

/// Map a provider error code (or bare HTTP status) to a failure class
pub(crate) fn classify(code: Option<&str>, status: u16) -> StorageErrorKind {
    match code {
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => StorageErrorKind::NotFound,
        Some(
            "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "AllAccessDisabled",
        ) => StorageErrorKind::AccessDenied,
        Some(
            "BucketAlreadyExists"
            | "BucketAlreadyOwnedByYou"
            | "BucketNotEmpty"
            | "OperationAborted",
        ) => StorageErrorKind::Conflict,
        _ => match status {
            404 => StorageErrorKind::NotFound,
            401 | 403 => StorageErrorKind::AccessDenied,
            409 => StorageErrorKind::Conflict,
            _ => StorageErrorKind::Other,
        },
    }
}

fn storage_error<E>(operation: &'static str, err: SdkError<E, HttpResponse>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let kind = match &err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => StorageErrorKind::Network,
        SdkError::ServiceError(ctx) => classify(ctx.err().code(), ctx.raw().status().as_u16()),
        _ => StorageErrorKind::Other,
    };

    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_string(),
        _ => DisplayErrorContext(&err).to_string(),
    };

    tracing::debug!(operation, %kind, %message, "provider call failed");
    Error::storage(operation, kind, message)
}

/// Build the `x-amz-copy-source` value for an object
pub(crate) fn copy_source(src: &ObjectRef) -> String {
    format!("{}/{}", src.bucket, utf8_percent_encode(&src.key, COPY_SOURCE))
}

fn timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(dt.secs()).ok()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| storage_error("list_buckets", e))?;

        let buckets = response
            .buckets()
            .iter()
            .filter_map(|b| {
                let mut info = ObjectInfo::bucket(b.name()?);
                info.last_modified = b.creation_date().and_then(timestamp);
                Some(info)
            })
            .collect();

        Ok(buckets)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.inner.create_bucket().bucket(bucket);

        if self.region != DEFAULT_REGION {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build();
            request = request.create_bucket_configuration(configuration);
        }

        request
            .send()
            .await
            .map_err(|e| storage_error("create_bucket", e))?;

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| storage_error("delete_bucket", e))?;

        Ok(())
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListPage> {
        let response = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(options.prefix)
            .set_delimiter(options.delimiter)
            .set_continuation_token(options.continuation_token)
            .set_max_keys(options.max_keys)
            .send()
            .await
            .map_err(|e| storage_error("list_objects", e))?;

        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let objects = response
            .contents()
            .iter()
            .filter_map(|object| {
                let mut info = ObjectInfo::file(object.key()?, object.size().unwrap_or(0));
                info.last_modified = object.last_modified().and_then(timestamp);
                info.etag = object.e_tag().map(|etag| etag.trim_matches('"').to_string());
                Some(info)
            })
            .collect();

        Ok(ListPage {
            objects,
            common_prefixes,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectData> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("get_object", e))?;

        let content_type = response.content_type().map(str::to_string);
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::storage("get_object", StorageErrorKind::Network, e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(ObjectData { data, content_type })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()> {
        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| storage_error("put_object", e))?;

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("delete_object", e))?;

        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<BatchDeleteResult> {
        if keys.is_empty() {
            return Ok(BatchDeleteResult::default());
        }
        if keys.len() > MAX_DELETE_BATCH {
            return Err(Error::validation(format!(
                "Cannot delete more than {MAX_DELETE_BATCH} objects in one request"
            )));
        }

        let objects = keys
            .into_iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::storage("delete_objects", StorageErrorKind::Other, e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| Error::storage("delete_objects", StorageErrorKind::Other, e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| storage_error("delete_objects", e))?;

        let deleted = response
            .deleted()
            .iter()
            .filter_map(|d| d.key().map(str::to_string))
            .collect();

        let errors: Vec<DeleteFailure> = response
            .errors()
            .iter()
            .map(|e| DeleteFailure {
                key: e.key().unwrap_or_default().to_string(),
                message: e
                    .message()
                    .or(e.code())
                    .unwrap_or("unknown error")
                    .to_string(),
            })
            .collect();

        if !errors.is_empty() {
            tracing::warn!(bucket, failed = errors.len(), "delete_objects reported per-key errors");
        }

        Ok(BatchDeleteResult { deleted, errors })
    }

    async fn copy_object(&self, src: &ObjectRef, dst: &ObjectRef) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(copy_source(src))
            .bucket(&dst.bucket)
            .key(&dst.key)
            .send()
            .await
            .map_err(|e| storage_error("copy_object", e))?;

        Ok(())
    }
}
