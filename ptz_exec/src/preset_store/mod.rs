//! # Preset Store
//!
//! Mapping from preset token to saved preset. Callers only see the [`PresetStore`] trait, the
//! shipped implementation is [`FilePresetStore`] which treats a flat record file as the source
//! of truth.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod file;
mod record;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ptz_if::{Preset, PresetEntry};
use std::{collections::BTreeMap, path::PathBuf};

pub use file::FilePresetStore;
pub use record::RecordError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Storage of presets.
///
/// Operations never fail from the caller's point of view. Persistence problems are logged by the
/// implementation and reported through [`Mutation::persisted`].
pub trait PresetStore: Send + Sync {
    /// Get a preset by token.
    fn get(&self, token: &str) -> Option<Preset>;

    /// List all presets in ascending token order.
    fn list(&self) -> Vec<Preset>;

    /// Insert or overwrite a preset.
    ///
    /// If `token` is `None` or empty the smallest positive integer not already used as a token
    /// is assigned.
    fn put(&self, token: Option<&str>, entry: PresetEntry) -> Mutation;

    /// Remove a preset. Removing an absent token is a no-op.
    fn remove(&self, token: &str) -> Mutation;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Result of a mutating store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Token the operation applied to.
    pub token: String,

    /// `true` if the token was present before the operation.
    pub existed: bool,

    /// `true` if the new state reached the backing storage.
    pub persisted: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while loading or saving the preset file.
#[derive(thiserror::Error, Debug)]
pub enum PresetStoreError {
    #[error("Could not read the preset file {0:?}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Could not create the preset directory {0:?}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Could not write the preset file {0:?}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Preset file line {line} is malformed: {err}")]
    Malformed { line: usize, err: RecordError },
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Smallest positive integer, as a string, which is not a key of `presets`.
pub(crate) fn next_free_token<V>(presets: &BTreeMap<String, V>) -> String {
    (1u64..)
        .map(|id| id.to_string())
        .find(|t| !presets.contains_key(t))
        .unwrap_or_default()
}
