//! Path parsing and key derivation
//!
//! Remote paths on the command line have the format `store[/name]`.
//! Object names are joined under a store's `location` prefix to produce the
//! storage key, and the prefix is removed again when keys are listed.

use crate::error::{Error, Result};

/// A parsed remote path pointing at an object (or prefix) of one store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Store name
    pub store: String,
    /// Object name relative to the store's location (empty for the root)
    pub name: String,
    /// Whether the path ends with a slash (prefix semantics)
    pub is_dir: bool,
}

impl RemotePath {
    /// Create a new RemotePath
    pub fn new(store: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let is_dir = name.ends_with('/') || name.is_empty();
        Self {
            store: store.into(),
            name,
            is_dir,
        }
    }

    /// Parse `store[/name]`
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::InvalidPath("Path cannot be empty".into()));
        }

        let (store, name) = match path.split_once('/') {
            Some((store, name)) => (store, name),
            None => (path, ""),
        };

        if !is_valid_store_name(store) {
            return Err(Error::InvalidPath(format!(
                "'{path}' does not start with a store name. Use format: store[/name]"
            )));
        }

        Ok(Self::new(store, name))
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.store)
        } else {
            write!(f, "{}/{}", self.store, self.name)
        }
    }
}

/// Check if a string can be addressed as a store on the command line
pub fn is_valid_store_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Join an object name under `location`, normalizing separators
///
/// Backslashes become `/`, empty and `.` segments are dropped and `..` pops a
/// segment. A name that would leave `location` is rejected. A trailing slash
/// on `name` is kept so prefixes stay prefixes.
pub fn join_location(location: &str, name: &str) -> Result<String> {
    let name = name.replace('\\', "/");
    let base = normalize_segments(location)
        .ok_or_else(|| Error::InvalidPath(format!("Invalid location '{location}'")))?;

    let mut segments = base.clone();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.len() <= base.len() {
                    return Err(Error::InvalidPath(format!(
                        "'{name}' is outside of location '{location}'"
                    )));
                }
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut key = segments.join("/");
    if name.ends_with('/') && !key.is_empty() {
        key.push('/');
    }
    Ok(key)
}

/// Join a name that must address an object under `location`
///
/// Unlike [`join_location`], a name that normalizes to nothing (`.`, `a/..`)
/// or ends with a slash is rejected instead of mapping onto the location.
pub fn join_object(location: &str, name: &str) -> Result<String> {
    let key = join_location(location, name)?;
    if key.ends_with('/') || key == join_location(location, "")? {
        return Err(Error::InvalidPath(format!("'{name}' does not name an object")));
    }
    Ok(key)
}

/// Remove `location` from the front of a storage key
pub fn strip_location<'a>(location: &str, key: &'a str) -> &'a str {
    let location = location.trim_matches('/');
    if location.is_empty() {
        return key;
    }
    match key.strip_prefix(location) {
        Some("") => "",
        Some(rest) => rest.strip_prefix('/').unwrap_or(key),
        None => key,
    }
}

fn normalize_segments(path: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments)
}
