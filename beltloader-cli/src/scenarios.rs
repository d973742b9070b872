use anyhow::{Result, ensure};
use beltloader_data::constants::{
    SETTING_BOB_BELT_OVERHAUL, SETTING_KR_LOADERS, SETTING_ULTIMATE_TIERS, ULTIMATE_TIERS_ALL,
};
use beltloader_data::{
    BuildRequest, FragmentMap, LoaderEngine, Mode, ModeFlags, Settings, VariantError,
    select_fragment,
};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::loader::FileLoader;

pub type Engine<'r> = LoaderEngine<'r, FileLoader>;

/// A named acceptance check run against the engine.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    check: fn(&Engine<'_>) -> Result<()>,
}

impl Scenario {
    const fn new(
        key: &'static str,
        description: &'static str,
        check: fn(&Engine<'_>) -> Result<()>,
    ) -> Self {
        Self {
            key,
            description,
            check,
        }
    }

    pub fn run(&self, engine: &Engine<'_>) -> ScenarioResult {
        let start = Instant::now();
        let outcome = (self.check)(engine);
        let duration = start.elapsed();
        match outcome {
            Ok(()) => {
                log::debug!("scenario {} passed in {duration:?}", self.key);
                ScenarioResult::new(self.key, None, duration)
            }
            Err(err) => ScenarioResult::new(self.key, Some(format!("{err:#}")), duration),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub duration_ms: f64,
}

impl ScenarioResult {
    fn new(scenario: &str, failure: Option<String>, duration: Duration) -> Self {
        Self {
            scenario: scenario.to_string(),
            passed: failure.is_none(),
            failure,
            duration_ms: duration.as_secs_f64() * 1000.0,
        }
    }
}

pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "no-add-ons",
            "Only the vanilla tiers exist without add-ons",
            no_add_ons,
        ),
        Scenario::new(
            "space-age",
            "Space Age adds turbo and stack tiers and wins over base fragments",
            space_age,
        ),
        Scenario::new(
            "missing-base",
            "A mode-only fragment map without base fails when the mode is off",
            missing_base,
        ),
        Scenario::new(
            "bob-overhaul",
            "Bob's tiers follow the belt overhaul setting",
            bob_overhaul,
        ),
        Scenario::new(
            "all-combinations",
            "Every combination of add-on modes builds",
            all_combinations,
        ),
        Scenario::new(
            "upgrade-links",
            "Every next upgrade points back at its predecessor",
            upgrade_links,
        ),
    ]
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

pub fn get_scenario(key: &str) -> Option<Scenario> {
    catalog().into_iter().find(|scenario| scenario.key == key)
}

fn keys_of(engine: &Engine<'_>, request: &BuildRequest) -> Result<Vec<String>> {
    let output = engine.build(request)?;
    Ok(output.keys().map(|key| key.as_str().to_string()).collect())
}

fn no_add_ons(engine: &Engine<'_>) -> Result<()> {
    let keys = keys_of(engine, &BuildRequest::new())?;
    ensure!(
        keys == ["", "fast", "express"],
        "expected vanilla tiers only, got {keys:?}"
    );
    Ok(())
}

fn space_age(engine: &Engine<'_>) -> Result<()> {
    let request = BuildRequest::new().with_add_ons(["space-age"]);
    let output = engine.build(&request)?;
    for key in ["turbo", "stack"] {
        ensure!(output.get(key).is_some(), "`{key}` missing with Space Age");
    }

    let map = FragmentMap::base("base").with_mode(Mode::SpaceAge, "space_age");
    let picked = select_fragment(&map, engine.environment(&request).flags())?;
    ensure!(*picked == "space_age", "base fragment chosen over space_age");
    Ok(())
}

fn missing_base(_engine: &Engine<'_>) -> Result<()> {
    let map = FragmentMap::new().with_mode(Mode::Matt, "matt");
    match select_fragment(&map, &ModeFlags::base_only()) {
        Err(VariantError::MissingBaseFragment { .. }) => Ok(()),
        other => anyhow::bail!("expected a missing base error, got {other:?}"),
    }
}

fn bob_overhaul(engine: &Engine<'_>) -> Result<()> {
    let bob_keys = |enabled: bool| {
        let settings = Settings::new().with_bool(SETTING_BOB_BELT_OVERHAUL, enabled);
        let request = BuildRequest::new()
            .with_add_ons(["boblogistics"])
            .with_settings(settings);
        engine.active_keys(&request)
    };

    let off = bob_keys(false);
    ensure!(
        !off.iter().any(|key| key.as_str() == "basic"),
        "bob tiers active without the belt overhaul"
    );
    let on = bob_keys(true);
    for key in ["basic", "ultimate"] {
        ensure!(
            on.iter().any(|active| active.as_str() == key),
            "`{key}` missing with the belt overhaul"
        );
    }
    Ok(())
}

/// One add-on per mode from the engine's mode table.
fn representative_add_ons(engine: &Engine<'_>) -> Vec<(Mode, String)> {
    let mut picked: Vec<(Mode, String)> = Vec::new();
    for (add_on, mode) in engine.mode_table().iter() {
        if !picked.iter().any(|(seen, _)| *seen == mode) {
            picked.push((mode, add_on.to_string()));
        }
    }
    picked
}

fn every_request(engine: &Engine<'_>) -> Vec<BuildRequest> {
    let add_ons = representative_add_ons(engine);
    let settings = Settings::new()
        .with_bool(SETTING_KR_LOADERS, true)
        .with_bool(SETTING_BOB_BELT_OVERHAUL, true)
        .with_text(SETTING_ULTIMATE_TIERS, ULTIMATE_TIERS_ALL);
    (0..1u32 << add_ons.len())
        .map(|bits| {
            let active = add_ons
                .iter()
                .enumerate()
                .filter(|(idx, _)| bits & (1 << idx) != 0)
                .map(|(_, (_, add_on))| add_on.clone());
            BuildRequest::new()
                .with_add_ons(active)
                .with_settings(settings.clone())
        })
        .collect()
}

fn all_combinations(engine: &Engine<'_>) -> Result<()> {
    for request in every_request(engine) {
        let output = engine.build(&request)?;
        let expected = engine.active_keys(&request);
        let built: Vec<_> = output.keys().cloned().collect();
        ensure!(
            built == expected,
            "[{}] built {built:?}, expected {expected:?}",
            request.add_ons.join(",")
        );
    }
    Ok(())
}

fn upgrade_links(engine: &Engine<'_>) -> Result<()> {
    for request in every_request(engine) {
        let output = engine.build(&request)?;
        for record in &output.records {
            let Some(next) = &record.next_upgrade else {
                continue;
            };
            let successor = output.records.iter().find(|other| &other.name == next);
            ensure!(
                successor.and_then(|other| other.upgrade_from.as_ref()) == Some(&record.name),
                "`{}` links to `{next}` which does not upgrade from it",
                record.name
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_passes_on_bundled_tables() {
        let engine = LoaderEngine::new(FileLoader::new(None));
        for scenario in catalog() {
            let result = scenario.run(&engine);
            assert!(result.passed, "{}: {:?}", result.scenario, result.failure);
        }
    }

    #[test]
    fn scenario_keys_are_unique() {
        let keys: Vec<_> = list_scenarios().into_iter().map(|(key, _)| key).collect();
        for key in &keys {
            assert_eq!(keys.iter().filter(|other| *other == key).count(), 1);
        }
        assert!(get_scenario("no-add-ons").is_some());
        assert!(get_scenario("nope").is_none());
    }

    #[test]
    fn representative_add_ons_cover_each_mode_once() {
        let engine = LoaderEngine::new(FileLoader::new(None));
        let picked = representative_add_ons(&engine);
        assert_eq!(picked.len(), 5);
        assert_eq!(every_request(&engine).len(), 32);
    }

    #[test]
    fn failures_carry_the_error_chain() {
        let failing = Scenario::new("failing", "always fails", |_| {
            anyhow::bail!("nothing to see")
        });
        let engine = LoaderEngine::new(FileLoader::new(None));
        let result = failing.run(&engine);
        assert!(!result.passed);
        assert_eq!(result.failure.as_deref(), Some("nothing to see"));
    }
}
