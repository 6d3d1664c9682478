//! Route definitions and URL helpers.

use axum::response::Redirect;
use axum_extra::extract::cookie::SignedCookieJar;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use s3desk_core::Prefix;

use crate::flash::{self, Flash};

pub mod buckets;
pub mod folders;
pub mod objects;
pub mod transfer;

/// Characters escaped in a path segment; `/` is kept so keys map onto the
/// `{*key}` wildcard unchanged.
const KEY_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters escaped in a bucket name segment
const SEGMENT: &AsciiSet = &KEY_PATH.add(b'/');

/// URL of a bucket listing at `prefix`
pub fn bucket_url(bucket: &str, prefix: &Prefix) -> String {
    let mut url = format!("/bucket/{}", utf8_percent_encode(bucket, SEGMENT));
    if !prefix.is_root() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("prefix", prefix.as_str())
            .finish();
        url.push('?');
        url.push_str(&query);
    }
    url
}

/// URL of a per-object action, e.g. `/bucket/b/download/a/b.txt`
pub fn object_url(bucket: &str, action: &str, key: &str) -> String {
    format!(
        "/bucket/{}/{action}/{}",
        utf8_percent_encode(bucket, SEGMENT),
        utf8_percent_encode(key, KEY_PATH)
    )
}

/// URL of a bucket-scoped form target, e.g. `/bucket/b/upload`
pub fn bucket_action_url(bucket: &str, action: &str) -> String {
    format!("/bucket/{}/{action}", utf8_percent_encode(bucket, SEGMENT))
}

/// Set a flash message and redirect with 303 See Other
pub(crate) fn redirect_with(
    jar: SignedCookieJar,
    flash: Flash,
    location: &str,
) -> (SignedCookieJar, Redirect) {
    (flash::push(jar, flash), Redirect::to(location))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_url() {
        assert_eq!(bucket_url("photos", &Prefix::root()), "/bucket/photos");
        assert_eq!(
            bucket_url("photos", &Prefix::new("2024/summer")),
            "/bucket/photos?prefix=2024%2Fsummer%2F"
        );
        assert_eq!(
            bucket_url("b", &Prefix::new("a b&c")),
            "/bucket/b?prefix=a+b%26c%2F"
        );
    }

    #[test]
    fn test_object_url_keeps_slashes() {
        assert_eq!(
            object_url("b", "download", "dir/my file#1.txt"),
            "/bucket/b/download/dir/my%20file%231.txt"
        );
        assert_eq!(object_url("b", "delete", "a.txt"), "/bucket/b/delete/a.txt");
    }

    #[test]
    fn test_bucket_action_url() {
        assert_eq!(bucket_action_url("my-bucket", "upload"), "/bucket/my-bucket/upload");
    }
}
