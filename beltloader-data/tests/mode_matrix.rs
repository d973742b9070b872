use beltloader_data::constants::{
    SETTING_BOB_BELT_OVERHAUL, SETTING_KR_LOADERS, SETTING_ULTIMATE_TIERS, ULTIMATE_TIERS_ALL,
};
use beltloader_data::{
    Category, Environment, Mode, ModeFlags, RecordTables, Settings, builtin_registry, run,
};

const OPTIONAL: [Mode; 5] = [
    Mode::SpaceAge,
    Mode::Krastorio2,
    Mode::Bob,
    Mode::Ultimate,
    Mode::Matt,
];

fn every_flag_set() -> Vec<ModeFlags> {
    (0..1u32 << OPTIONAL.len())
        .map(|bits| {
            OPTIONAL
                .iter()
                .enumerate()
                .fold(ModeFlags::base_only(), |flags, (idx, mode)| {
                    flags.with(*mode, bits & (1 << idx) != 0)
                })
        })
        .collect()
}

fn all_settings_on() -> Settings {
    Settings::new()
        .with_bool(SETTING_KR_LOADERS, true)
        .with_bool(SETTING_BOB_BELT_OVERHAUL, true)
        .with_text(SETTING_ULTIMATE_TIERS, ULTIMATE_TIERS_ALL)
}

#[test]
fn every_mode_combination_builds_against_bundled_tables() {
    for settings in [Settings::new(), all_settings_on()] {
        for flags in every_flag_set() {
            let env = Environment::new(flags.clone(), settings.clone());
            let mut tables = RecordTables::bundled();
            let output = run(builtin_registry(), &env, &mut tables, None)
                .unwrap_or_else(|err| panic!("{flags:?} / {settings:?}: {err}"));

            let expected = builtin_registry().all_active_keys(&env);
            let built: Vec<_> = output.keys().collect();
            assert_eq!(built, expected, "{flags:?}");
            assert_eq!(tables.count(Category::Loader), output.len());
        }
    }
}

#[test]
fn upgrade_links_are_mutual() {
    for flags in every_flag_set() {
        let env = Environment::new(flags, all_settings_on());
        let mut tables = RecordTables::bundled();
        let output = run(builtin_registry(), &env, &mut tables, None).unwrap();
        for record in &output.records {
            let Some(next) = &record.next_upgrade else {
                continue;
            };
            let successor = output
                .records
                .iter()
                .find(|candidate| &candidate.name == next)
                .unwrap();
            assert_eq!(successor.upgrade_from.as_ref(), Some(&record.name));
        }
    }
}

#[test]
fn every_predecessor_is_built_in_the_same_pass() {
    for flags in every_flag_set() {
        let env = Environment::new(flags, all_settings_on());
        let mut tables = RecordTables::bundled();
        let output = run(builtin_registry(), &env, &mut tables, None).unwrap();
        for record in &output.records {
            if let Some(from) = &record.upgrade_from {
                assert!(
                    output.records.iter().any(|other| &other.name == from),
                    "{} upgrades from unbuilt {from}",
                    record.name
                );
            }
        }
    }
}

#[test]
fn realized_records_serialize_to_json() {
    let env = Environment::new(
        ModeFlags::base_only().with(Mode::SpaceAge, true),
        Settings::new(),
    );
    let mut tables = RecordTables::bundled();
    let output = run(builtin_registry(), &env, &mut tables, None).unwrap();
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["records"][0]["name"], "mdrn-loader");
    assert_eq!(json["records"][4]["extras"]["max_belt_stack_size"], 4);
    assert_eq!(json["flags"]["space_age"], true);
    assert!(json.get("scope").is_none());
}
