//! Integration tests for the S3 adapter
//!
//! These tests require a running S3-compatible server.
//!
//! Run with:
//! ```bash
//! # Start RustFS container
//! docker run -d --name rustfs -p 9000:9000 -p 9001:9001 \
//!     -v rustfs-data:/data \
//!     -e RUSTFS_ACCESS_KEY=accesskey \
//!     -e RUSTFS_SECRET_KEY=secretkey \
//!     rustfs/rustfs:1.0.0-alpha.81
//!
//! # Run tests
//! TEST_S3_ENDPOINT=http://localhost:9000 TEST_S3_ACCESS_KEY=accesskey \
//!     TEST_S3_SECRET_KEY=secretkey cargo test -p s3desk-s3 --features integration
//! ```

#![cfg(feature = "integration")]

use std::sync::Arc;

use futures::TryStreamExt;
use s3desk_core::{Explorer, ObjectStore, Prefix, StorageConfig, TransferRequest, Upload};
use s3desk_s3::S3Client;

/// Get S3 test configuration from environment
fn get_test_config() -> Option<StorageConfig> {
    let endpoint = std::env::var("TEST_S3_ENDPOINT").ok()?;
    let access_key = std::env::var("TEST_S3_ACCESS_KEY").ok()?;
    let secret_key = std::env::var("TEST_S3_SECRET_KEY").ok()?;
    Some(StorageConfig {
        endpoint: Some(endpoint),
        access_key: Some(access_key),
        secret_key: Some(secret_key),
        bucket_lookup: "path".to_string(),
        ..StorageConfig::default()
    })
}

fn uuid_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:x}", duration.as_nanos() % 0xFFFFFFFF)
}

/// Test helper: create a fresh bucket and return the explorer for it
async fn setup(name: &str) -> Option<(Explorer, Arc<S3Client>, String)> {
    let config = get_test_config()?;
    let client = Arc::new(S3Client::new(&config).await.ok()?);
    let explorer = Explorer::new(client.clone());
    let bucket = format!("test-{name}-{}", uuid_suffix());
    explorer.create_bucket(&bucket).await.ok()?;
    Some((explorer, client, bucket))
}

/// Cleanup helper: delete bucket and all objects
async fn cleanup(explorer: &Explorer, client: &S3Client, bucket: &str) {
    let keys = collect_keys(explorer, bucket).await;
    for chunk in keys.chunks(s3desk_core::MAX_DELETE_BATCH) {
        let _ = client.delete_objects(bucket, chunk.to_vec()).await;
    }
    let _ = explorer.delete_bucket(bucket).await;
}

/// Every key in the bucket, in listing order
async fn collect_keys(explorer: &Explorer, bucket: &str) -> Vec<String> {
    let root = Prefix::root();
    let pages: Vec<_> = explorer
        .key_pages(bucket, &root, false)
        .try_collect()
        .await
        .unwrap_or_default();
    pages
        .into_iter()
        .flat_map(|page| page.objects.into_iter().map(|o| o.key))
        .collect()
}

#[tokio::test]
async fn test_upload_download_round_trip() {
    let Some((explorer, client, bucket)) = setup("roundtrip").await else {
        eprintln!("Skipping: S3 test config not available");
        return;
    };

    let bytes: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let key = explorer
        .upload(
            &bucket,
            "data",
            Upload {
                filename: "blob.bin".to_string(),
                data: bytes.clone(),
                content_type: None,
            },
        )
        .await
        .expect("upload");
    assert_eq!(key.as_str(), "data/blob.bin");

    let download = explorer.download(&bucket, key.as_str()).await.expect("download");
    assert_eq!(download.data, bytes);
    assert_eq!(download.filename, "blob.bin");

    cleanup(&explorer, &client, &bucket).await;
}

#[tokio::test]
async fn test_folder_lifecycle() {
    let Some((explorer, client, bucket)) = setup("folders").await else {
        eprintln!("Skipping: S3 test config not available");
        return;
    };

    explorer
        .create_folder(&bucket, "", "photos")
        .await
        .expect("create folder");
    for name in ["a.jpg", "b.jpg"] {
        explorer
            .upload(
                &bucket,
                "photos/",
                Upload {
                    filename: name.to_string(),
                    data: b"jpeg".to_vec(),
                    content_type: Some("image/jpeg".to_string()),
                },
            )
            .await
            .expect("upload");
    }
    client
        .put_object(&bucket, "photovacation/c.jpg", b"x".to_vec(), None)
        .await
        .expect("put");

    let root = explorer.list_folder(&bucket, "").await.expect("list root");
    assert!(root.folders.contains(&Prefix::new("photos/")));

    let listing = explorer.list_folder(&bucket, "photo").await.expect("list");
    assert!(listing.objects.is_empty(), "photo/ must not match photovacation/");

    let listing = explorer.list_folder(&bucket, "photos").await.expect("list");
    let keys: Vec<_> = listing.objects.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["photos/a.jpg", "photos/b.jpg"]);

    let deletion = explorer.delete_folder(&bucket, "photos").await.expect("delete");
    assert_eq!(deletion.deleted, 3);
    assert_eq!(deletion.batches, 1);
    assert!(deletion.parent.is_root());

    let remaining = collect_keys(&explorer, &bucket).await;
    assert_eq!(remaining, vec!["photovacation/c.jpg".to_string()]);

    cleanup(&explorer, &client, &bucket).await;
}

#[tokio::test]
async fn test_copy_and_move() {
    let Some((explorer, client, bucket)) = setup("transfer").await else {
        eprintln!("Skipping: S3 test config not available");
        return;
    };

    client
        .put_object(&bucket, "src/my file.txt", b"hello".to_vec(), None)
        .await
        .expect("put");

    let copied = explorer
        .copy_object(&TransferRequest {
            src_bucket: bucket.clone(),
            src_key: "src/my file.txt".to_string(),
            dest_bucket: bucket.clone(),
            dest_key: "copies/".to_string(),
        })
        .await
        .expect("copy");
    assert_eq!(copied.key, "copies/my file.txt");

    let moved = explorer
        .move_object(&TransferRequest {
            src_bucket: bucket.clone(),
            src_key: "src/my file.txt".to_string(),
            dest_bucket: bucket.clone(),
            dest_key: "renamed.txt".to_string(),
        })
        .await
        .expect("move");
    assert_eq!(moved.key, "renamed.txt");

    let keys = collect_keys(&explorer, &bucket).await;
    assert_eq!(
        keys,
        vec!["copies/my file.txt".to_string(), "renamed.txt".to_string()]
    );
    let content = explorer.download(&bucket, "renamed.txt").await.expect("get");
    assert_eq!(content.data, b"hello");

    cleanup(&explorer, &client, &bucket).await;
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let Some((explorer, client, bucket)) = setup("missing").await else {
        eprintln!("Skipping: S3 test config not available");
        return;
    };

    let err = explorer.download(&bucket, "nope.txt").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");

    cleanup(&explorer, &client, &bucket).await;
}
