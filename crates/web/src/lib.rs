//! s3desk web layer
//!
//! Server-rendered pages and form handlers over the prefix-scoped operations
//! in `s3desk-core`. Exported as a library so route tests can drive the
//! router directly.

pub mod args;
pub mod flash;
pub mod routes;
pub mod views;

use axum::Router;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum_extra::extract::cookie::Key;
use s3desk_core::config::MIN_SESSION_SECRET_LEN;
use s3desk_core::{Error, Explorer, Result};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Operations layer over the process-wide provider handle.
    pub explorer: Explorer,
    /// Key used to sign the flash cookie.
    pub cookie_key: Key,
}

impl AppState {
    /// Build state from an explorer and an optional session secret
    ///
    /// Without a secret a random key is generated, so flash messages do not
    /// survive a restart.
    pub fn new(explorer: Explorer, session_secret: Option<&str>) -> Result<Self> {
        let cookie_key = match session_secret {
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => {
                return Err(Error::Config(format!(
                    "session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
                )));
            }
            Some(secret) => Key::derive_from(secret.as_bytes()),
            None => {
                warn!("no session_secret configured, using a random signing key");
                Key::generate()
            }
        };
        Ok(Self {
            explorer,
            cookie_key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(routes::buckets::routes())
        .merge(routes::objects::routes())
        .merge(routes::folders::routes())
        .merge(routes::transfer::routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
