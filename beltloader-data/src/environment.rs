//! Build environment: mode flags plus externally supplied settings.
//!
//! The environment is built once at entry and handed by reference to every
//! predicate and selector; nothing in the engine reads ambient state.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::SETTING_BOB_BELT_OVERHAUL;
use crate::modes::{Mode, ModeFlags, ModeTable};

/// A single setting value. Settings are either toggles or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

/// Named settings, deserialized from a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an object of booleans and strings.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_bool(mut self, name: impl Into<String>, value: bool) -> Self {
        self.values.insert(name.into(), SettingValue::Bool(value));
        self
    }

    #[must_use]
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(name.into(), SettingValue::Text(value.into()));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.values.get(name)
    }

    /// True only for a boolean setting explicitly set to `true`.
    #[must_use]
    pub fn enabled(&self, name: &str) -> bool {
        matches!(self.get(name), Some(SettingValue::Bool(true)))
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(SettingValue::Text(value)) => Some(value),
            _ => None,
        }
    }
}

/// Everything a predicate may look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    flags: ModeFlags,
    settings: Settings,
}

impl Environment {
    #[must_use]
    pub const fn new(flags: ModeFlags, settings: Settings) -> Self {
        Self { flags, settings }
    }

    /// Derive flags from active add-ons and pair them with `settings`.
    ///
    /// Bob's content only changes recipes under the belt overhaul, so the
    /// `bob` flag stays off unless that setting is on as well.
    pub fn from_add_ons<I, S>(active: I, table: &ModeTable, settings: Settings) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = ModeFlags::from_add_ons(active, table);
        if flags.is_active(Mode::Bob) && !settings.enabled(SETTING_BOB_BELT_OVERHAUL) {
            log::debug!("bob mode off: `{SETTING_BOB_BELT_OVERHAUL}` is not enabled");
            flags = flags.with(Mode::Bob, false);
        }
        Self::new(flags, settings)
    }

    #[must_use]
    pub const fn flags(&self) -> &ModeFlags {
        &self.flags
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn is_active(&self, mode: Mode) -> bool {
        self.flags.is_active(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_booleans_and_text() {
        let settings =
            Settings::from_json(r#"{"kr-loaders": true, "mdrn-ultimate-tiers": "all"}"#).unwrap();
        assert!(settings.enabled("kr-loaders"));
        assert_eq!(settings.text("mdrn-ultimate-tiers"), Some("all"));
        assert!(!settings.enabled("mdrn-ultimate-tiers"));
    }

    #[test]
    fn missing_settings_read_as_disabled() {
        let settings = Settings::new().with_bool("present", false);
        assert!(!settings.enabled("present"));
        assert!(!settings.enabled("absent"));
        assert_eq!(settings.text("absent"), None);
    }

    #[test]
    fn text_true_is_not_a_toggle() {
        let settings = Settings::new().with_text("flag", "true");
        assert!(!settings.enabled("flag"));
    }

    #[test]
    fn bob_flag_needs_the_belt_overhaul() {
        let table = ModeTable::default();
        let env = Environment::from_add_ons(["space-age", "boblogistics"], &table, Settings::new());
        assert!(!env.is_active(Mode::Bob));
        assert!(env.is_active(Mode::SpaceAge));

        let on = Settings::new().with_bool(SETTING_BOB_BELT_OVERHAUL, true);
        let env = Environment::from_add_ons(["boblogistics"], &table, on);
        assert!(env.is_active(Mode::Bob));
    }

    #[test]
    fn environment_exposes_flags() {
        let env = Environment::from_add_ons(["space-age"], &ModeTable::default(), Settings::new());
        assert!(env.is_active(Mode::SpaceAge));
        assert!(!env.is_active(Mode::Bob));
    }
}
