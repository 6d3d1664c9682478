//! Page view models
//!
//! Each page is an askama template under `templates/`. The view models hold
//! display-ready strings; URLs are built here so templates only print them.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use s3desk_core::{FolderListing, ObjectInfo, ObjectKey, Prefix};

use crate::flash::Flash;
use crate::routes::{bucket_action_url, bucket_url, object_url};

fn format_timestamp(info: &ObjectInfo) -> String {
    info.last_modified
        .map(|ts| ts.strftime("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Render a page, logging and replacing it with a plain error on failure
pub fn render_template<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template rendering error").into_response()
        }
    }
}

/// One row of the bucket table
#[derive(Debug, Clone)]
pub struct BucketRow {
    pub name: String,
    pub url: String,
    pub created: String,
}

impl From<&ObjectInfo> for BucketRow {
    fn from(bucket: &ObjectInfo) -> Self {
        Self {
            url: bucket_url(&bucket.key, &Prefix::root()),
            name: bucket.key.clone(),
            created: format_timestamp(bucket),
        }
    }
}

/// The bucket list with create and delete forms
#[derive(Template)]
#[template(path = "buckets.html")]
pub struct BucketListView {
    pub flashes: Vec<Flash>,
    pub buckets: Vec<BucketRow>,
}

impl BucketListView {
    pub fn new(buckets: &[ObjectInfo], flashes: Vec<Flash>) -> Self {
        Self {
            flashes,
            buckets: buckets.iter().map(BucketRow::from).collect(),
        }
    }
}

/// A breadcrumb link
#[derive(Debug, Clone)]
pub struct Crumb {
    pub name: String,
    pub url: String,
}

/// A subfolder row
#[derive(Debug, Clone)]
pub struct FolderRow {
    pub name: String,
    pub url: String,
    /// Full prefix, posted back by the delete form
    pub prefix: String,
}

/// An object row
#[derive(Debug, Clone)]
pub struct ObjectRow {
    pub name: String,
    pub key: String,
    pub size: String,
    pub modified: String,
    pub download_url: String,
    pub delete_url: String,
}

/// A destination bucket in the copy and move selectors
#[derive(Debug, Clone)]
pub struct BucketOption {
    pub name: String,
    pub selected: bool,
}

/// A copy or move form target
#[derive(Debug, Clone, Copy)]
pub struct TransferAction {
    pub label: &'static str,
    pub url: &'static str,
}

const TRANSFERS: [TransferAction; 2] = [
    TransferAction {
        label: "Copy",
        url: "/copy-object",
    },
    TransferAction {
        label: "Move",
        url: "/move-object",
    },
];

/// A bucket listing at one folder level
#[derive(Template)]
#[template(path = "bucket.html")]
pub struct BucketView {
    pub flashes: Vec<Flash>,
    pub bucket: String,
    pub prefix: String,
    pub crumbs: Vec<Crumb>,
    /// Parent folder link, absent at the bucket root
    pub up_url: Option<String>,
    pub upload_url: String,
    pub create_folder_url: String,
    pub delete_folder_url: String,
    pub folders: Vec<FolderRow>,
    pub objects: Vec<ObjectRow>,
    pub bucket_options: Vec<BucketOption>,
    pub transfers: [TransferAction; 2],
}

impl BucketView {
    /// `all_buckets` are the candidate destinations for copy and move
    pub fn new(
        bucket: &str,
        listing: &FolderListing,
        all_buckets: &[ObjectInfo],
        flashes: Vec<Flash>,
    ) -> Self {
        let prefix = &listing.prefix;

        let mut crumbs = vec![Crumb {
            name: bucket.to_string(),
            url: bucket_url(bucket, &Prefix::root()),
        }];
        crumbs.extend(prefix.segments().into_iter().map(|(name, segment)| Crumb {
            url: bucket_url(bucket, &segment),
            name,
        }));

        let folders = listing
            .folders
            .iter()
            .map(|folder| FolderRow {
                name: folder.name().to_string(),
                url: bucket_url(bucket, folder),
                prefix: folder.as_str().to_string(),
            })
            .collect();

        let objects = listing
            .objects
            .iter()
            .map(|object| {
                let key = ObjectKey::parse(object.key.as_str());
                ObjectRow {
                    name: key.basename().to_string(),
                    size: object.size_human.clone().unwrap_or_default(),
                    modified: format_timestamp(object),
                    download_url: object_url(bucket, "download", key.as_str()),
                    delete_url: object_url(bucket, "delete", key.as_str()),
                    key: key.as_str().to_string(),
                }
            })
            .collect();

        let bucket_options = all_buckets
            .iter()
            .map(|b| BucketOption {
                name: b.key.clone(),
                selected: b.key == bucket,
            })
            .collect();

        Self {
            flashes,
            bucket: bucket.to_string(),
            prefix: prefix.as_str().to_string(),
            crumbs,
            up_url: (!prefix.is_root()).then(|| bucket_url(bucket, &prefix.parent())),
            upload_url: bucket_action_url(bucket, "upload"),
            create_folder_url: bucket_action_url(bucket, "create-folder"),
            delete_folder_url: bucket_action_url(bucket, "delete-folder"),
            folders,
            objects,
            bucket_options,
            transfers: TRANSFERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(prefix: &str, folders: &[&str], objects: &[&str]) -> FolderListing {
        FolderListing {
            prefix: Prefix::new(prefix),
            folders: folders.iter().map(|f| Prefix::new(*f)).collect(),
            objects: objects.iter().map(|k| ObjectInfo::file(*k, 4)).collect(),
        }
    }

    #[test]
    fn test_bucket_list_renders_flashes_and_names() {
        let buckets = vec![ObjectInfo::bucket("photos"), ObjectInfo::bucket("<evil>")];
        let html = BucketListView::new(&buckets, vec![Flash::success("Bucket 'photos' created")])
            .render()
            .unwrap();
        assert!(html.contains("flash success"));
        assert!(html.contains("Bucket &#39;photos&#39; created"));
        assert!(html.contains("href=\"/bucket/photos\""));
        assert!(html.contains("&#60;evil&#62;"));
        assert!(!html.contains("<evil>"));
    }

    #[test]
    fn test_empty_bucket_list() {
        let html = BucketListView::new(&[], Vec::new()).render().unwrap();
        assert!(html.contains("No buckets."));
        assert!(!html.contains("class=\"flash"));
    }

    #[test]
    fn test_bucket_view_links() {
        let listing = listing("docs/", &["docs/old/"], &["docs/a b.txt"]);
        let buckets = vec![ObjectInfo::bucket("b"), ObjectInfo::bucket("other")];
        let view = BucketView::new("b", &listing, &buckets, Vec::new());
        assert_eq!(view.crumbs.len(), 2);
        assert_eq!(view.up_url.as_deref(), Some("/bucket/b"));

        let html = view.render().unwrap();
        assert!(html.contains("href=\"/bucket/b?prefix=docs%2Fold%2F\">old/</a>"));
        assert!(html.contains("href=\"/bucket/b/download/docs/a%20b.txt\""));
        assert!(html.contains("href=\"/bucket/b/delete/docs/a%20b.txt\""));
        assert!(html.contains("<option value=\"b\" selected>b</option>"));
        assert!(html.contains("<option value=\"other\">other</option>"));
        assert!(html.contains("name=\"prefix\" value=\"docs/\""));
        assert!(html.contains("name=\"src_key\" value=\"docs/a b.txt\""));
        assert!(html.contains("action=\"/copy-object\""));
        assert!(html.contains("action=\"/move-object\""));
        assert!(html.contains("&uarr; Up"));
    }

    #[test]
    fn test_empty_folder_message() {
        let listing = listing("", &[], &[]);
        let view = BucketView::new(
            "b",
            &listing,
            &[],
            vec![Flash::danger("Error listing objects: NoSuchBucket")],
        );
        assert!(view.up_url.is_none());

        let html = view.render().unwrap();
        assert!(html.contains("This folder is empty."));
        assert!(html.contains("flash danger"));
        assert!(!html.contains("&uarr; Up"));
    }

    #[test]
    fn test_render_template_returns_html() {
        let response = render_template(BucketListView::new(&[], Vec::new()));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[axum::http::header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
    }
}
