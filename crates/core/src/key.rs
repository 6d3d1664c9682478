//! Key and prefix model
//!
//! The backing store has a flat key space. Folders are emulated by key-string
//! conventions only: a [`Prefix`] scopes a listing and always ends in `/`
//! unless it is the bucket root, and an [`ObjectKey`] ending in `/` is a
//! zero-byte folder marker.

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Path delimiter used for folder emulation
pub const DELIMITER: char = '/';

/// A normalized listing prefix
///
/// Either empty (bucket root) or ending in `/`. Without the trailing slash the
/// provider would match `photo` against `photovacation/...` as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Prefix(String);

impl Prefix {
    /// The bucket root
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalize a raw prefix, appending `/` when it is non-empty and lacks one
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        if !raw.is_empty() && !raw.ends_with(DELIMITER) {
            raw.push(DELIMITER);
        }
        Self(raw)
    }

    /// Get the prefix as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the bucket root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The enclosing folder, obtained by stripping the last non-empty segment
    pub fn parent(&self) -> Self {
        let trimmed = self.0.trim_end_matches(DELIMITER);
        match trimmed.rfind(DELIMITER) {
            Some(pos) => Self(trimmed[..=pos].to_string()),
            None => Self::root(),
        }
    }

    /// Marker key for a child folder named `name`
    ///
    /// Surrounding whitespace and slashes are trimmed from the name; an empty
    /// result is rejected.
    pub fn join_folder(&self, name: &str) -> Result<ObjectKey> {
        let name = name.trim().trim_matches(DELIMITER);
        if name.is_empty() {
            return Err(Error::validation("Folder name required"));
        }
        Ok(ObjectKey::FolderMarker(format!("{}{}/", self.0, name)))
    }

    /// Key of a file named `name` directly inside this prefix
    pub fn join_file(&self, name: &str) -> ObjectKey {
        ObjectKey::parse(format!("{}{}", self.0, name))
    }

    /// Cumulative segments, e.g. `a/b/` yields `("a", "a/")` then `("b", "a/b/")`
    pub fn segments(&self) -> Vec<(String, Prefix)> {
        let mut acc = String::new();
        let mut out = Vec::new();
        for segment in self.0.split_terminator(DELIMITER) {
            acc.push_str(segment);
            acc.push(DELIMITER);
            out.push((segment.to_string(), Self(acc.clone())));
        }
        out
    }

    /// Display name of the last segment (empty for the root)
    pub fn name(&self) -> &str {
        self.0
            .trim_end_matches(DELIMITER)
            .rsplit(DELIMITER)
            .next()
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An object key, tagged by whether it is a folder marker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    /// A regular object
    File(String),
    /// A zero-byte object whose key ends in `/`
    FolderMarker(String),
}

impl ObjectKey {
    /// Classify a raw key
    pub fn parse(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.ends_with(DELIMITER) {
            ObjectKey::FolderMarker(key)
        } else {
            ObjectKey::File(key)
        }
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        match self {
            ObjectKey::File(k) | ObjectKey::FolderMarker(k) => k,
        }
    }

    /// Consume into the raw key string
    pub fn into_string(self) -> String {
        match self {
            ObjectKey::File(k) | ObjectKey::FolderMarker(k) => k,
        }
    }

    /// Whether this key is a folder marker
    pub fn is_folder_marker(&self) -> bool {
        matches!(self, ObjectKey::FolderMarker(_))
    }

    /// Substring after the last `/`, or the whole key
    pub fn basename(&self) -> &str {
        basename(self.as_str())
    }

    /// Everything up to and including the last `/`
    ///
    /// For `a/b/c.txt` this is `a/b/`; for a top-level key it is the root.
    pub fn parent_prefix(&self) -> Prefix {
        let key = self.as_str();
        match key.rfind(DELIMITER) {
            Some(pos) => Prefix(key[..=pos].to_string()),
            None => Prefix::root(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn basename(key: &str) -> &str {
    match key.rfind(DELIMITER) {
        Some(pos) => &key[pos + 1..],
        None => key,
    }
}

/// Compute the destination key for a copy or move
///
/// One text input serves both "drop into this folder" and "rename to this
/// exact path":
/// - blank hint: keep the source key
/// - hint ending in `/`: hint + basename of the source
/// - anything else: the hint verbatim
pub fn resolve_destination_key(src_key: &str, hint: &str) -> String {
    let hint = hint.trim();
    if hint.is_empty() {
        src_key.to_string()
    } else if hint.ends_with(DELIMITER) {
        format!("{hint}{}", basename(src_key))
    } else {
        hint.to_string()
    }
}

/// Device names that cannot be used as file names on Windows
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

/// Reduce an uploaded file name to a safe single path segment
///
/// The name is NFKD-decomposed so accented letters fold to their ASCII base,
/// then remaining non-ASCII characters are dropped. Separators become spaces,
/// whitespace runs are joined with `_`, and only `[A-Za-z0-9_.-]` survives. Leading and
/// trailing `.`/`_` are stripped. The result may be empty.
pub fn sanitize_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let cleaned = kept.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = cleaned.split('.').next().unwrap_or_default();
    if !cleaned.is_empty() && WINDOWS_DEVICE_NAMES.contains(&stem.to_ascii_uppercase().as_str()) {
        return format!("_{cleaned}");
    }

    cleaned
}

/// File name offered to the browser for a download
pub fn download_filename(key: &str) -> &str {
    match basename(key) {
        "" => "download",
        name => name,
    }
}
