//! Folder creation and recursive deletion routes.

use axum::{
    Form, Router,
    extract::{Path, State},
    response::Redirect,
    routing::post,
};
use axum_extra::extract::cookie::SignedCookieJar;
use s3desk_core::{FolderDeletion, Prefix};
use serde::Deserialize;

use super::{bucket_url, redirect_with};
use crate::AppState;
use crate::flash::Flash;

/// Creates the folder routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bucket/{name}/create-folder", post(create_folder))
        .route("/bucket/{name}/delete-folder", post(delete_folder))
}

/// Form body for folder creation.
#[derive(Debug, Deserialize)]
pub struct CreateFolderForm {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub folder_name: String,
}

/// Form body for folder deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteFolderForm {
    #[serde(default)]
    pub folder_prefix: String,
}

async fn create_folder(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    jar: SignedCookieJar,
    Form(form): Form<CreateFolderForm>,
) -> (SignedCookieJar, Redirect) {
    let parent = Prefix::new(form.prefix.as_str());
    let flash = match state
        .explorer
        .create_folder(&bucket, parent.as_str(), &form.folder_name)
        .await
    {
        Ok(marker) => {
            let folder = Prefix::new(marker.into_string());
            Flash::success(format!("Folder '{}' created", folder.name()))
        }
        Err(err) => Flash::failure("Create folder", &err),
    };
    redirect_with(jar, flash, &bucket_url(&bucket, &parent))
}

async fn delete_folder(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    jar: SignedCookieJar,
    Form(form): Form<DeleteFolderForm>,
) -> (SignedCookieJar, Redirect) {
    match state.explorer.delete_folder(&bucket, &form.folder_prefix).await {
        Ok(deletion) => redirect_with(
            jar,
            deletion_flash(&deletion),
            &bucket_url(&bucket, &deletion.parent),
        ),
        Err(err) => {
            let target = if form.folder_prefix.is_empty() {
                Prefix::root()
            } else {
                Prefix::new(form.folder_prefix.as_str()).parent()
            };
            redirect_with(
                jar,
                Flash::failure("Delete folder", &err),
                &bucket_url(&bucket, &target),
            )
        }
    }
}

fn objects(count: usize) -> String {
    if count == 1 {
        "1 object".to_string()
    } else {
        format!("{count} objects")
    }
}

/// Summary shown after a folder delete; refused keys turn it into an error.
fn deletion_flash(deletion: &FolderDeletion) -> Flash {
    if deletion.failed > 0 {
        return Flash::danger(format!(
            "Folder {} partially deleted: {} removed, {} could not be deleted",
            deletion.prefix,
            objects(deletion.deleted),
            objects(deletion.failed)
        ));
    }
    Flash::success(format!(
        "Folder deleted: {} ({})",
        deletion.prefix,
        objects(deletion.deleted)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::Level;

    fn deletion(deleted: usize, failed: usize) -> FolderDeletion {
        let prefix = Prefix::new("logs");
        FolderDeletion {
            parent: prefix.parent(),
            prefix,
            deleted,
            failed,
            batches: 1,
        }
    }

    #[test]
    fn test_deletion_flash_reports_count() {
        let flash = deletion_flash(&deletion(3, 0));
        assert_eq!(flash.level, Level::Success);
        assert_eq!(flash.text, "Folder deleted: logs/ (3 objects)");

        let flash = deletion_flash(&deletion(1, 0));
        assert_eq!(flash.text, "Folder deleted: logs/ (1 object)");
    }

    #[test]
    fn test_deletion_flash_reports_refused_keys() {
        let flash = deletion_flash(&deletion(2, 1));
        assert_eq!(flash.level, Level::Danger);
        assert_eq!(
            flash.text,
            "Folder logs/ partially deleted: 2 objects removed, 1 object could not be deleted"
        );
    }
}
