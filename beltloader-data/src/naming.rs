//! Variant keys and the entity names derived from them.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{BASELINE_NAME, NAME_SEPARATOR};

/// Identifier of one variant in the registry. The empty key is the
/// baseline tier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct VariantKey(String);

impl VariantKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn baseline() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical entity name for this key, without scope.
    #[must_use]
    pub fn entity_name(&self) -> String {
        name_from_key(self.as_str())
    }
}

impl From<&str> for VariantKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_baseline() {
            f.write_str("<baseline>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// `""` maps to the baseline name, anything else to `<key>-<baseline>`.
#[must_use]
pub fn name_from_key(key: &str) -> String {
    if key.is_empty() {
        BASELINE_NAME.to_string()
    } else {
        format!("{key}{NAME_SEPARATOR}{BASELINE_NAME}")
    }
}

/// Prefix `name` with the caller-supplied scope, if any.
#[must_use]
pub fn scoped_name(scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(scope) if !scope.is_empty() => format!("{scope}{NAME_SEPARATOR}{name}"),
        _ => name.to_string(),
    }
}
