//! Mode flags: which optional content packs are active for this build.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Known compatibility modes. `Base` is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Base,
    SpaceAge,
    Krastorio2,
    Bob,
    Ultimate,
    Matt,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Base,
        Mode::SpaceAge,
        Mode::Krastorio2,
        Mode::Bob,
        Mode::Ultimate,
        Mode::Matt,
    ];

    /// Identifier used in fragment keys and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Base => "base",
            Mode::SpaceAge => "space_age",
            Mode::Krastorio2 => "krastorio2",
            Mode::Bob => "bob",
            Mode::Ultimate => "ultimate",
            Mode::Matt => "matt",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps add-on identifiers to the mode they switch on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeTable {
    entries: BTreeMap<String, Mode>,
}

impl ModeTable {
    /// An empty table; every add-on is unknown.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_add_on(mut self, add_on: impl Into<String>, mode: Mode) -> Self {
        self.entries.insert(add_on.into(), mode);
        self
    }

    #[must_use]
    pub fn mode_for(&self, add_on: &str) -> Option<Mode> {
        self.entries.get(add_on).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Mode)> {
        self.entries.iter().map(|(id, mode)| (id.as_str(), *mode))
    }
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::empty()
            .with_add_on("space-age", Mode::SpaceAge)
            .with_add_on("Krastorio2", Mode::Krastorio2)
            .with_add_on("Krastorio2-spaced-out", Mode::Krastorio2)
            .with_add_on("boblogistics", Mode::Bob)
            .with_add_on("UltimateBelts", Mode::Ultimate)
            .with_add_on("UltimateBeltsSpaceAge", Mode::Ultimate)
            .with_add_on("matts-logistics", Mode::Matt)
    }
}

/// One boolean per known mode, computed once per build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeFlags {
    flags: BTreeMap<Mode, bool>,
}

impl ModeFlags {
    /// Flags with only `base` set.
    #[must_use]
    pub fn base_only() -> Self {
        Self {
            flags: Mode::ALL
                .into_iter()
                .map(|mode| (mode, mode == Mode::Base))
                .collect(),
        }
    }

    /// Derive flags from the set of active add-ons. Add-ons missing from
    /// `table` are ignored.
    pub fn from_add_ons<I, S>(active: I, table: &ModeTable) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let active: BTreeSet<String> = active
            .into_iter()
            .map(|add_on| add_on.as_ref().to_string())
            .collect();
        let mut flags = Self::base_only();
        for add_on in &active {
            if table.mode_for(add_on).is_none() {
                log::debug!("ignoring unknown add-on `{add_on}`");
            }
        }
        for (add_on, mode) in table.iter() {
            if active.contains(add_on) {
                flags.flags.insert(mode, true);
            }
        }
        flags
    }

    /// Builder-style override, mostly useful for tests and scenarios.
    #[must_use]
    pub fn with(mut self, mode: Mode, enabled: bool) -> Self {
        self.flags.insert(mode, enabled || mode == Mode::Base);
        self
    }

    #[must_use]
    pub fn is_active(&self, mode: Mode) -> bool {
        self.flags.get(&mode).copied().unwrap_or(false)
    }

    /// Every mode with its flag, in `Mode` order.
    pub fn iter(&self) -> impl Iterator<Item = (Mode, bool)> + '_ {
        self.flags.iter().map(|(mode, enabled)| (*mode, *enabled))
    }

    /// Active modes, `base` included.
    pub fn active(&self) -> impl Iterator<Item = Mode> + '_ {
        self.iter()
            .filter_map(|(mode, enabled)| enabled.then_some(mode))
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self::base_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_is_always_present_and_true() {
        let flags = ModeFlags::from_add_ons(Vec::<String>::new(), &ModeTable::default());
        assert!(flags.is_active(Mode::Base));
        assert_eq!(flags.iter().count(), Mode::ALL.len());
        assert_eq!(flags.active().collect::<Vec<_>>(), vec![Mode::Base]);
    }

    #[test]
    fn known_add_ons_switch_their_mode_on() {
        let flags = ModeFlags::from_add_ons(["space-age", "boblogistics"], &ModeTable::default());
        assert!(flags.is_active(Mode::SpaceAge));
        assert!(flags.is_active(Mode::Bob));
        assert!(!flags.is_active(Mode::Krastorio2));
    }

    #[test]
    fn unknown_add_ons_are_ignored() {
        let flags = ModeFlags::from_add_ons(["not-a-mod", "quality"], &ModeTable::default());
        assert_eq!(flags, ModeFlags::base_only());
    }

    #[test]
    fn several_add_ons_may_share_a_mode() {
        let table = ModeTable::default();
        let a = ModeFlags::from_add_ons(["Krastorio2"], &table);
        let b = ModeFlags::from_add_ons(["Krastorio2-spaced-out"], &table);
        assert_eq!(a, b);
        assert!(a.is_active(Mode::Krastorio2));
    }

    #[test]
    fn result_does_not_depend_on_input_order() {
        let table = ModeTable::default();
        let forward = ModeFlags::from_add_ons(["UltimateBelts", "space-age", "x"], &table);
        let reverse = ModeFlags::from_add_ons(["x", "space-age", "UltimateBelts"], &table);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn base_cannot_be_switched_off() {
        let flags = ModeFlags::base_only().with(Mode::Base, false);
        assert!(flags.is_active(Mode::Base));
    }

    #[test]
    fn mode_identifiers_parse_back() {
        for mode in Mode::ALL {
            assert_eq!(Mode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(Mode::parse("space-age"), None);
    }
}
