//! Mode-keyed fragment maps and the selector that picks one fragment.
//!
//! A fragment map carries mutually exclusive candidates for one payload
//! (an ingredient list, a prerequisite list, ...). Keys are either a plain
//! mode (`matt`) or that mode combined with [`COMBO_MODE`] (`matt_space_age`).
//!
//! Selection precedence:
//!
//! 1. every active mode other than `base` and [`COMBO_MODE`] contributes at
//!    most one match, its combination key winning over its plain key when
//!    [`COMBO_MODE`] is active;
//! 2. a single combination match is returned; a single plain match is
//!    returned unless the plain [`COMBO_MODE`] entry also applies;
//! 3. several matches, or a plain match next to an applicable plain
//!    [`COMBO_MODE`] entry, are an ambiguity error;
//! 4. with no match, the plain [`COMBO_MODE`] entry applies when active;
//! 5. otherwise `base`, which must then exist.
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{COMBO_MODE, COMBO_SUFFIX};
use crate::error::{Result, VariantError};
use crate::modes::{Mode, ModeFlags};

/// Key of one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentKey {
    mode: Mode,
    combo: bool,
}

impl FragmentKey {
    pub const BASE: Self = Self::mode(Mode::Base);

    #[must_use]
    pub const fn mode(mode: Mode) -> Self {
        Self { mode, combo: false }
    }

    #[must_use]
    pub const fn combo(mode: Mode) -> Self {
        Self { mode, combo: true }
    }

    #[must_use]
    pub const fn target_mode(self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn is_combo(self) -> bool {
        self.combo
    }

    /// Parse `matt` or `matt_space_age` style keys.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(mode) = Mode::parse(value) {
            return Some(Self::mode(mode));
        }
        value
            .strip_suffix(COMBO_SUFFIX)
            .and_then(Mode::parse)
            .map(Self::combo)
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode.as_str())?;
        if self.combo {
            f.write_str(COMBO_SUFFIX)?;
        }
        Ok(())
    }
}

/// Candidate values for one payload, keyed by mode.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentMap<T> {
    entries: BTreeMap<FragmentKey, T>,
}

impl<T> Default for FragmentMap<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> FragmentMap<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with only a `base` fragment.
    #[must_use]
    pub fn base(value: T) -> Self {
        Self::new().with_base(value)
    }

    #[must_use]
    pub fn with_base(self, value: T) -> Self {
        self.with(FragmentKey::BASE, value)
    }

    #[must_use]
    pub fn with_mode(self, mode: Mode, value: T) -> Self {
        self.with(FragmentKey::mode(mode), value)
    }

    #[must_use]
    pub fn with_combo(self, mode: Mode, value: T) -> Self {
        self.with(FragmentKey::combo(mode), value)
    }

    #[must_use]
    pub fn with(mut self, key: FragmentKey, value: T) -> Self {
        self.entries.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: FragmentKey) -> Option<&T> {
        self.entries.get(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = FragmentKey> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply `f` to every fragment, keeping keys.
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> FragmentMap<U> {
        FragmentMap {
            entries: self
                .entries
                .into_iter()
                .map(|(key, value)| (key, f(value)))
                .collect(),
        }
    }

    /// Shorthand for [`select_fragment`].
    ///
    /// # Errors
    ///
    /// See [`select_fragment`].
    pub fn select(&self, flags: &ModeFlags) -> Result<&T> {
        select_fragment(self, flags)
    }
}

/// Pick the single fragment that applies under `flags`.
///
/// # Errors
///
/// Returns [`VariantError::AmbiguousFragment`] when two independently active
/// modes both supply a fragment, and [`VariantError::MissingBaseFragment`]
/// when nothing matched and the map has no `base` entry.
pub fn select_fragment<'a, T>(map: &'a FragmentMap<T>, flags: &ModeFlags) -> Result<&'a T> {
    let combo_active = flags.is_active(COMBO_MODE);
    let combo_entry = combo_active
        .then(|| map.get(FragmentKey::mode(COMBO_MODE)))
        .flatten();
    let mut matched: SmallVec<[(FragmentKey, &T); 2]> = SmallVec::new();

    for (mode, active) in flags.iter() {
        if !active || mode == Mode::Base || mode == COMBO_MODE {
            continue;
        }
        let combo = FragmentKey::combo(mode);
        let plain = FragmentKey::mode(mode);
        if combo_active && let Some(value) = map.get(combo) {
            matched.push((combo, value));
        } else if let Some(value) = map.get(plain) {
            matched.push((plain, value));
        }
    }

    match matched.as_slice() {
        [(key, value)] if key.is_combo() || combo_entry.is_none() => return Ok(*value),
        [(key, _)] => {
            return Err(VariantError::AmbiguousFragment {
                modes: vec![key.target_mode(), COMBO_MODE],
            });
        }
        [] => {}
        many => {
            return Err(VariantError::AmbiguousFragment {
                modes: many.iter().map(|(key, _)| key.target_mode()).collect(),
            });
        }
    }

    if let Some(value) = combo_entry {
        return Ok(value);
    }

    map.get(FragmentKey::BASE)
        .ok_or_else(|| VariantError::MissingBaseFragment {
            available: map.keys().map(|key| key.to_string()).collect(),
        })
}
