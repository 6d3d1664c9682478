//! Copy and move routes.

use axum::{Form, Router, extract::State, response::Redirect, routing::post};
use axum_extra::extract::cookie::SignedCookieJar;
use s3desk_core::{Prefix, TransferRequest};
use serde::Deserialize;

use super::{bucket_url, redirect_with};
use crate::AppState;
use crate::flash::Flash;

/// Creates the transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/copy-object", post(copy_object))
        .route("/move-object", post(move_object))
}

/// Form body shared by copy and move.
///
/// Missing fields deserialize as empty strings and are rejected by
/// [`TransferRequest::validate`].
#[derive(Debug, Deserialize)]
pub struct TransferForm {
    #[serde(default)]
    pub src_bucket: String,
    #[serde(default)]
    pub src_key: String,
    #[serde(default)]
    pub dest_bucket: String,
    #[serde(default)]
    pub dest_key: String,
}

impl From<TransferForm> for TransferRequest {
    fn from(form: TransferForm) -> Self {
        TransferRequest {
            src_bucket: form.src_bucket,
            src_key: form.src_key,
            dest_bucket: form.dest_bucket,
            dest_key: form.dest_key,
        }
    }
}

/// Copy and move both land back on the source bucket root
fn source_location(request: &TransferRequest) -> String {
    if request.src_bucket.is_empty() {
        "/buckets".to_string()
    } else {
        bucket_url(&request.src_bucket, &Prefix::root())
    }
}

async fn copy_object(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<TransferForm>,
) -> (SignedCookieJar, Redirect) {
    let request = TransferRequest::from(form);
    let flash = match state.explorer.copy_object(&request).await {
        Ok(dst) => Flash::success(format!("File copied to {dst}")),
        Err(err) => Flash::failure("Copy", &err),
    };
    redirect_with(jar, flash, &source_location(&request))
}

async fn move_object(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<TransferForm>,
) -> (SignedCookieJar, Redirect) {
    let request = TransferRequest::from(form);
    let flash = match state.explorer.move_object(&request).await {
        Ok(dst) => Flash::success(format!("File moved to {dst}")),
        Err(err) => Flash::failure("Move", &err),
    };
    redirect_with(jar, flash, &source_location(&request))
}
