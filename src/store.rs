//! JSON-backed instance definition store.
//!
//! The pipeline keeps its instance database as a JSON array of definitions.
//! The store is loaded once and then answers lookups by identifier.

use std::collections::BTreeSet;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;
use tracing::debug;

use crate::composer::InstanceLookup;
use crate::model::InstanceDefinition;

/// Errors raised while loading the instance store.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum StoreError {
    /// Raised when the store file cannot be read.
    #[error("failed to read instance store {path}: {message}")]
    Io {
        /// Path that could not be read.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when the store content is not a valid definition list.
    #[error("failed to parse instance store {path}: {message}")]
    Parse {
        /// Path of the malformed store.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when two definitions share an identifier.
    #[error("instance store {path} defines `{uuid}` more than once")]
    DuplicateInstance {
        /// Path of the store.
        path: Utf8PathBuf,
        /// Identifier defined twice.
        uuid: String,
    },
}

/// In-memory view of the instance database.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonInstanceStore {
    instances: Vec<InstanceDefinition>,
}

impl JsonInstanceStore {
    /// Reads and parses the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the file cannot be read and
    /// [`StoreError::Parse`] or [`StoreError::DuplicateInstance`] when its
    /// content is invalid.
    pub fn from_file(path: &Utf8Path) -> Result<Self, StoreError> {
        let contents = read_store(path)?;
        let store = Self::parse(path, &contents)?;
        debug!(%path, instances = store.len(), "loaded instance store");
        Ok(store)
    }

    /// Parses a store from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Parse`] when `json` is not an array of
    /// definitions and [`StoreError::DuplicateInstance`] when identifiers
    /// repeat.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Self::parse(Utf8Path::new("<inline>"), json)
    }

    /// Builds a store from already parsed definitions.
    #[must_use]
    pub const fn from_definitions(instances: Vec<InstanceDefinition>) -> Self {
        Self { instances }
    }

    /// Number of definitions held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` when the store holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Iterates the definitions in store order.
    pub fn iter(&self) -> impl Iterator<Item = &InstanceDefinition> {
        self.instances.iter()
    }

    fn parse(path: &Utf8Path, json: &str) -> Result<Self, StoreError> {
        let instances: Vec<InstanceDefinition> =
            serde_json::from_str(json).map_err(|err| StoreError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        let mut seen = BTreeSet::new();
        for instance in &instances {
            if !seen.insert(instance.uuid.as_str()) {
                return Err(StoreError::DuplicateInstance {
                    path: path.to_path_buf(),
                    uuid: instance.uuid.clone(),
                });
            }
        }
        Ok(Self { instances })
    }
}

impl InstanceLookup for JsonInstanceStore {
    fn instance(&self, uuid: &str) -> Option<&InstanceDefinition> {
        self.instances.instance(uuid)
    }
}

fn read_store(path: &Utf8Path) -> Result<String, StoreError> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().ok_or_else(|| StoreError::Io {
        path: path.to_path_buf(),
        message: String::from("store path is missing a filename"),
    })?;

    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| io_error(parent, &err))?;
    dir.read_to_string(file_name)
        .map_err(|err| io_error(path, &err))
}

fn io_error(path: &Utf8Path, err: &io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
