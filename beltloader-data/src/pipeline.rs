//! One build pass over the registry.
//!
//! The pass runs in two phases. First every active variant is resolved
//! into a draft, in declaration order, and each draft's item is staged
//! next to the caller's tables. Only then are deferred fields settled, so
//! an ingredient may name any loader of the same pass. Realized records
//! are linked along their upgrade chain, and the staged tables replace
//! the caller's only once every record is realized.
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::draft::{LoaderRecord, RecordDraft};
use crate::environment::{Environment, Settings};
use crate::error::Result;
use crate::modes::{ModeFlags, ModeTable};
use crate::naming::VariantKey;
use crate::registry::{BuildContext, VariantRegistry};
use crate::tables::{Category, RecordTables};

/// What to build: active add-ons, their settings and an optional scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRequest {
    pub add_ons: Vec<String>,
    pub settings: Settings,
    pub scope: Option<String>,
}

impl BuildRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_add_ons<I, S>(mut self, add_ons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_ons = add_ons.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Scope with blank values treated as absent.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref().filter(|scope| !scope.is_empty())
    }

    #[must_use]
    pub fn environment(&self, table: &ModeTable) -> Environment {
        Environment::from_add_ons(&self.add_ons, table, self.settings.clone())
    }
}

/// Records realized by one pass, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOutput {
    pub flags: ModeFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub records: Vec<LoaderRecord>,
}

impl BuildOutput {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LoaderRecord> {
        self.records.iter().find(|record| record.key.as_str() == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &VariantKey> {
        self.records.iter().map(|record| &record.key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Run a full pass and register the results into `tables`.
///
/// # Errors
///
/// Returns the first builder, fragment or lookup error. `tables` is left
/// untouched when the pass fails.
pub fn run(
    registry: &VariantRegistry,
    env: &Environment,
    tables: &mut RecordTables,
    scope: Option<&str>,
) -> Result<BuildOutput> {
    let drafts = resolve_drafts(registry, env, tables, scope)?;
    let mut staged = tables.clone();
    for draft in &drafts {
        staged.insert(
            Category::Item,
            draft.name.clone(),
            json!({ "place_result": draft.name, "stack_size": draft.stack_size }),
        );
    }

    let mut records = drafts
        .into_iter()
        .map(|draft| draft.materialize(env.flags(), &staged, scope))
        .collect::<Result<Vec<_>>>()?;
    link_upgrades(&mut records);
    for record in &records {
        staged.register_loader(record);
    }
    *tables = staged;

    log::info!(
        "built {} of {} loader variants{}",
        records.len(),
        registry.len(),
        scope.map(|scope| format!(" in scope `{scope}`")).unwrap_or_default()
    );
    Ok(BuildOutput {
        flags: env.flags().clone(),
        scope: scope.map(str::to_string),
        records,
    })
}

/// Eager phase only: drafts of every active variant, in declaration order.
///
/// # Errors
///
/// Propagates builder errors.
pub fn resolve_drafts(
    registry: &VariantRegistry,
    env: &Environment,
    tables: &RecordTables,
    scope: Option<&str>,
) -> Result<Vec<RecordDraft>> {
    let ctx = BuildContext::new(env, tables).with_scope(scope);
    let mut drafts = Vec::new();
    for spec in registry.iter() {
        if let Some(draft) = registry.resolve(spec.key(), &ctx)? {
            drafts.push(draft);
        }
    }
    Ok(drafts)
}

/// Fill `next_upgrade` from each record's predecessor. When several
/// records upgrade from the same tier, the first declared one wins.
pub fn link_upgrades(records: &mut [LoaderRecord]) {
    let positions: BTreeMap<String, usize> = records
        .iter()
        .enumerate()
        .map(|(position, record)| (record.name.clone(), position))
        .collect();

    for successor in 0..records.len() {
        let Some(from) = records[successor].upgrade_from.clone() else {
            continue;
        };
        let Some(&predecessor) = positions.get(&from) else {
            continue;
        };
        let name = records[successor].name.clone();
        match &records[predecessor].next_upgrade {
            None => records[predecessor].next_upgrade = Some(name),
            Some(existing) => {
                log::warn!("`{from}` already upgrades to `{existing}`; ignoring `{name}`");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_registry;
    use crate::draft::{Color, ingredients};
    use crate::error::VariantError;
    use crate::fragments::FragmentMap;
    use crate::predicates;
    use crate::processors::ModeProcessors;
    use crate::registry::{LoaderTemplate, VariantSpec};

    fn names(output: &BuildOutput) -> Vec<&str> {
        output.records.iter().map(|record| record.name.as_str()).collect()
    }

    #[test]
    fn base_pass_links_and_registers_vanilla_tiers() {
        let mut tables = RecordTables::bundled();
        let output = run(builtin_registry(), &Environment::default(), &mut tables, None).unwrap();
        assert_eq!(
            names(&output),
            vec!["mdrn-loader", "fast-mdrn-loader", "express-mdrn-loader"]
        );
        assert_eq!(output.records[0].next_upgrade.as_deref(), Some("fast-mdrn-loader"));
        assert_eq!(output.records[2].next_upgrade, None);
        assert_eq!(tables.count(Category::Loader), 3);
        assert!(tables.contains(Category::Recipe, "express-mdrn-loader"));
        assert_eq!(
            tables.get(Category::Item, "fast-mdrn-loader").unwrap()["place_result"],
            "fast-mdrn-loader"
        );
    }

    #[test]
    fn predecessor_loaders_are_ingredients() {
        let mut tables = RecordTables::bundled();
        let output = run(builtin_registry(), &Environment::default(), &mut tables, None).unwrap();
        let fast = output.get("fast").unwrap();
        assert_eq!(fast.ingredients[0].name, "mdrn-loader");
        assert_eq!(fast.ingredients[0].amount, 1);
        assert!(output.get("").unwrap().ingredients.iter().all(|i| i.name != "mdrn-loader"));
    }

    #[test]
    fn first_declared_successor_wins() {
        let request = BuildRequest::new()
            .with_add_ons(["space-age", "matts-logistics"])
            .with_settings(Settings::new());
        let env = request.environment(&ModeTable::default());
        let mut tables = RecordTables::bundled();
        let output = run(builtin_registry(), &env, &mut tables, None).unwrap();
        let express = output.get("express").unwrap();
        assert_eq!(express.next_upgrade.as_deref(), Some("turbo-mdrn-loader"));
        let heavy = output.get("matt-heavy").unwrap();
        assert_eq!(heavy.upgrade_from.as_deref(), Some("express-mdrn-loader"));
        assert_eq!(heavy.next_upgrade.as_deref(), Some("matt-hyper-mdrn-loader"));
    }

    #[test]
    fn scoped_pass_needs_scoped_belts() {
        let mut tables = RecordTables::bundled();
        let err = run(
            builtin_registry(),
            &Environment::default(),
            &mut tables,
            Some("se"),
        )
        .unwrap_err();
        assert!(matches!(err, VariantError::MissingExternalRecord { .. }));
        assert_eq!(tables.count(Category::Loader), 0);
    }

    #[test]
    fn failed_materialization_leaves_tables_untouched() {
        let template = LoaderTemplate::new(
            "transport-belt",
            "d[loader]-z",
            Color::rgb(1.0, 1.0, 1.0),
        )
        .ingredients(FragmentMap::base(ingredients(&[("no-such-item", 1)])))
        .prerequisites(FragmentMap::base(Vec::new()));
        let registry = VariantRegistry::from_specs(
            vec![
                VariantSpec::new("", predicates::base(), template.clone()),
                VariantSpec::new("odd", predicates::base(), template),
            ],
            ModeProcessors::builtin(),
        )
        .unwrap();

        let mut tables = RecordTables::bundled();
        let err = run(&registry, &Environment::default(), &mut tables, None).unwrap_err();
        assert_eq!(
            err,
            VariantError::MissingExternalRecord {
                category: "item".into(),
                name: "no-such-item".into(),
            }
        );
        assert!(!tables.contains(Category::Item, "odd-mdrn-loader"));
        assert!(!tables.contains(Category::Item, "mdrn-loader"));
        assert_eq!(tables, RecordTables::bundled());
    }

    #[test]
    fn blank_scopes_are_ignored() {
        let request = BuildRequest::new().with_scope("");
        assert_eq!(request.scope(), None);
        assert_eq!(BuildRequest::new().with_scope("se").scope(), Some("se"));
    }

    #[test]
    fn requests_deserialize_with_defaults() {
        let request: BuildRequest =
            serde_json::from_str(r#"{"add_ons": ["space-age"], "settings": {"kr-loaders": true}}"#)
                .unwrap();
        assert_eq!(request.add_ons, vec!["space-age"]);
        assert!(request.settings.enabled("kr-loaders"));
        assert_eq!(request.scope, None);
    }
}
