//! Bucket list and bucket management routes.

use axum::{
    Form, Router,
    extract::State,
    response::{Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use tracing::warn;

use super::redirect_with;
use crate::AppState;
use crate::flash::{self, Flash};
use crate::views::{self, BucketListView};

/// Creates the bucket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/buckets", get(list_buckets))
        .route("/create-bucket", post(create_bucket))
        .route("/delete-bucket", post(delete_bucket))
}

/// Form body for bucket creation and deletion.
#[derive(Debug, Deserialize)]
pub struct BucketForm {
    #[serde(default)]
    pub bucket_name: String,
}

async fn home() -> Redirect {
    Redirect::to("/buckets")
}

async fn list_buckets(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Response) {
    let (jar, mut messages) = flash::take(jar);
    let buckets = match state.explorer.list_buckets().await {
        Ok(buckets) => buckets,
        Err(err) => {
            warn!(error = %err, "listing buckets failed");
            messages.push(Flash::danger(format!("Error listing buckets: {err}")));
            Vec::new()
        }
    };
    (jar, views::render_template(BucketListView::new(&buckets, messages)))
}

async fn create_bucket(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<BucketForm>,
) -> (SignedCookieJar, Redirect) {
    let flash = match state.explorer.create_bucket(&form.bucket_name).await {
        Ok(name) => Flash::success(format!("Bucket '{name}' created")),
        Err(err) => Flash::failure("Create bucket", &err),
    };
    redirect_with(jar, flash, "/buckets")
}

async fn delete_bucket(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<BucketForm>,
) -> (SignedCookieJar, Redirect) {
    let flash = match state.explorer.delete_bucket(&form.bucket_name).await {
        Ok(name) => Flash::success(format!("Bucket '{name}' deleted")),
        Err(err) => Flash::failure("Delete bucket", &err),
    };
    redirect_with(jar, flash, "/buckets")
}
