//! Path normalisation, identity quoting, and backup suffix generation.

use std::borrow::Cow;

use serde_json::Value;
use shell_escape::unix::escape;
use uuid::Uuid;

use crate::defaults::BACKUP_SUFFIX_LEN;
use crate::error::ScriptError;

/// Trailing-slash policy applied to a path before it is interpolated.
///
/// The three-way split matters for `rsync`: a trailing slash syncs the
/// directory contents, no slash syncs the directory itself.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TrailingSlash {
    /// Guarantee exactly one trailing slash.
    Append,
    /// Guarantee no trailing slash.
    Strip,
    /// Leave the path untouched.
    #[default]
    Keep,
}

impl From<Option<bool>> for TrailingSlash {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Self::Append,
            Some(false) => Self::Strip,
            None => Self::Keep,
        }
    }
}

impl From<bool> for TrailingSlash {
    fn from(flag: bool) -> Self {
        Self::from(Some(flag))
    }
}

impl TryFrom<&Value> for TrailingSlash {
    type Error = ScriptError;

    fn try_from(flag: &Value) -> Result<Self, Self::Error> {
        match flag {
            Value::Null => Ok(Self::Keep),
            Value::Bool(value) => Ok(Self::from(*value)),
            other => Err(ScriptError::invalid(format!(
                "trailing slash flag must be a boolean or null, got {other}"
            ))),
        }
    }
}

/// Applies `policy` to `path`.
///
/// `Strip` never removes the slash of the filesystem root, so `/` stays `/`.
///
/// # Examples
///
/// ```
/// use stagehand::paths::{TrailingSlash, normalize_trailing_slash};
///
/// assert_eq!(normalize_trailing_slash("foo", TrailingSlash::Append), "foo/");
/// assert_eq!(normalize_trailing_slash("foo/", TrailingSlash::Strip), "foo");
/// assert_eq!(normalize_trailing_slash("foo/", TrailingSlash::Keep), "foo/");
/// ```
#[must_use]
pub fn normalize_trailing_slash(path: &str, policy: TrailingSlash) -> String {
    match policy {
        TrailingSlash::Keep => path.to_owned(),
        TrailingSlash::Append => format!("{}/", path.trim_end_matches('/')),
        TrailingSlash::Strip => {
            let trimmed = path.trim_end_matches('/');
            if trimmed.is_empty() && path.starts_with('/') {
                String::from("/")
            } else {
                trimmed.to_owned()
            }
        }
    }
}

/// Shell-escapes a connection identity component such as a user or address.
///
/// Ordinary identifiers are returned unchanged.
#[must_use]
pub fn quote_identity(value: &str) -> Cow<'_, str> {
    escape(Cow::Borrowed(value))
}

/// Source of random tokens used to name backups.
pub trait SuffixSource {
    /// Returns a fresh token; only its trailing characters are used.
    fn token(&self) -> String;
}

/// Default suffix source backed by v4 UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidSuffix;

impl SuffixSource for UuidSuffix {
    fn token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Suffix source returning the same token every time.
///
/// Useful when byte-identical output across runs matters more than backup
/// name uniqueness.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FixedSuffix(pub String);

impl SuffixSource for FixedSuffix {
    fn token(&self) -> String {
        self.0.clone()
    }
}

/// Produces a short random token from the default source.
#[must_use]
pub fn random_suffix() -> String {
    backup_suffix(&UuidSuffix.token())
}

/// Keeps the last characters of `token` for use in a backup filename.
#[must_use]
pub fn backup_suffix(token: &str) -> String {
    let count = token.chars().count();
    token
        .chars()
        .skip(count.saturating_sub(BACKUP_SUFFIX_LEN))
        .collect()
}
