//! Errors raised while resolving loader variants.
use thiserror::Error;

use crate::modes::Mode;

/// Fatal resolution failures. Every variant aborts the build pass; none are
/// retried because resolution is deterministic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error("fragment map has no `base` entry and no active mode matched (keys: {available:?})")]
    MissingBaseFragment { available: Vec<String> },
    #[error("fragment map matched several active modes at once: {modes:?}")]
    AmbiguousFragment { modes: Vec<Mode> },
    #[error("no `{category}` record named `{name}`")]
    MissingExternalRecord { category: String, name: String },
    #[error("`{category}` record `{name}` has no usable `{field}` field")]
    MalformedExternalRecord {
        category: String,
        name: String,
        field: &'static str,
    },
    #[error("unknown variant `{key}`")]
    UnknownVariant { key: String },
    #[error("variant `{key}` is declared more than once")]
    DuplicateVariant { key: String },
    #[error("variant `{key}` upgrades from undeclared variant `{from}`")]
    DanglingUpgrade { key: String, from: String },
    #[error("upgrade chain through `{key}` forms a cycle")]
    UpgradeCycle { key: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = VariantError> = std::result::Result<T, E>;
