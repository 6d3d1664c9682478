//! Bucket browsing and single-object routes.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::SignedCookieJar;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use s3desk_core::{Download, FolderListing, ObjectKey, Prefix, Upload};
use serde::Deserialize;
use tracing::warn;

use super::{bucket_url, redirect_with};
use crate::AppState;
use crate::flash::{self, Flash};
use crate::views::{self, BucketView};

/// Creates the bucket browsing and object routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bucket/{name}", get(view_bucket))
        .route("/bucket/{name}/upload", post(upload))
        .route("/bucket/{name}/download/{*key}", get(download))
        .route("/bucket/{name}/delete/{*key}", get(delete_object))
}

/// Query string of the bucket view.
#[derive(Debug, Default, Deserialize)]
pub struct PrefixQuery {
    #[serde(default)]
    pub prefix: String,
}

async fn view_bucket(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    Query(query): Query<PrefixQuery>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Response) {
    let (jar, mut messages) = flash::take(jar);

    let loaded = async {
        let listing = state.explorer.list_folder(&bucket, &query.prefix).await?;
        let all_buckets = state.explorer.list_buckets().await?;
        Ok::<_, s3desk_core::Error>((listing, all_buckets))
    }
    .await;

    let (listing, all_buckets) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            warn!(bucket = %bucket, error = %err, "listing objects failed");
            messages.push(Flash::danger(format!("Error listing objects: {err}")));
            let empty = FolderListing {
                prefix: Prefix::new(query.prefix.as_str()),
                folders: Vec::new(),
                objects: Vec::new(),
            };
            (empty, Vec::new())
        }
    };

    let view = BucketView::new(&bucket, &listing, &all_buckets, messages);
    (jar, views::render_template(view))
}

/// Fields of the upload form
#[derive(Debug, Default)]
struct UploadForm {
    prefix: String,
    file: Option<Upload>,
}

async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "prefix" => form.prefix = field.text().await?,
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                form.file = Some(Upload {
                    filename,
                    data,
                    content_type,
                });
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn upload(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    jar: SignedCookieJar,
    mut multipart: Multipart,
) -> (SignedCookieJar, Redirect) {
    let form = match read_upload_form(&mut multipart).await {
        Ok(form) => form,
        Err(err) => {
            warn!(bucket = %bucket, error = %err, "unreadable upload form");
            let flash = Flash::danger(format!("Upload failed: {err}"));
            return redirect_with(jar, flash, &bucket_url(&bucket, &Prefix::root()));
        }
    };

    let prefix = Prefix::new(form.prefix);
    let flash = match form.file {
        None => Flash::danger("No file selected"),
        Some(file) => match state.explorer.upload(&bucket, prefix.as_str(), file).await {
            Ok(key) => Flash::success(format!("Uploaded {}", key.basename())),
            Err(err) => Flash::failure("Upload", &err),
        },
    };
    redirect_with(jar, flash, &bucket_url(&bucket, &prefix))
}

async fn download(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    jar: SignedCookieJar,
) -> Response {
    match state.explorer.download(&bucket, &key).await {
        Ok(download) => attachment(download),
        Err(err) => redirect_with(
            jar,
            Flash::failure("Download", &err),
            &bucket_url(&bucket, &Prefix::root()),
        )
        .into_response(),
    }
}

fn attachment(download: Download) -> Response {
    let content_type = HeaderValue::from_str(&download.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&download.filename),
            ),
        ],
        download.data,
    )
        .into_response()
}

/// `attachment` disposition with an ASCII fallback and the RFC 5987 UTF-8 name
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(filename, NON_ALPHANUMERIC)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

async fn delete_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Redirect) {
    let (flash, parent) = match state.explorer.delete_object(&bucket, &key).await {
        Ok(parent) => (Flash::success(format!("Deleted {key}")), parent),
        Err(err) => (
            Flash::failure("Delete", &err),
            ObjectKey::parse(key.as_str()).parent_prefix(),
        ),
    };
    redirect_with(jar, flash, &bucket_url(&bucket, &parent))
}
