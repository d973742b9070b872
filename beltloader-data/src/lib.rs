//! Beltloader Data Engine
//!
//! Resolves which loader tiers exist for a given set of active add-ons and
//! settings, and realizes them into records against external data tables.
//! This crate carries no I/O of its own; callers supply tables and
//! configuration through [`DataLoader`].

pub mod catalog;
pub mod constants;
pub mod draft;
pub mod environment;
pub mod error;
pub mod fragments;
pub mod modes;
pub mod naming;
pub mod pipeline;
pub mod predicates;
pub mod processors;
pub mod registry;
pub mod tables;

use anyhow::Context;

// Re-export commonly used types
pub use catalog::{builtin_registry, builtin_specs};
pub use draft::{
    Color, Deferred, Ingredient, IngredientList, LoaderRecord, RecordDraft, ingredients,
    technologies,
};
pub use environment::{Environment, SettingValue, Settings};
pub use error::{Result, VariantError};
pub use fragments::{FragmentKey, FragmentMap, select_fragment};
pub use modes::{Mode, ModeFlags, ModeTable};
pub use naming::{VariantKey, name_from_key, scoped_name};
pub use pipeline::{BuildOutput, BuildRequest, link_upgrades, resolve_drafts, run};
pub use predicates::Predicate;
pub use processors::{ModeProcessors, PostProcessor};
pub use registry::{BuildContext, LoaderTemplate, VariantRegistry, VariantSpec};
pub use tables::{Category, RecordTables};

/// Trait for abstracting data loading operations
/// Front ends provide the tables and named configuration files
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the record tables a pass reads from and registers into
    ///
    /// # Errors
    ///
    /// Returns an error if the tables cannot be loaded.
    fn load_tables(&self) -> std::result::Result<RecordTables, Self::Error>;

    /// Load a named configuration value
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> std::result::Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Runs build requests against a registry with data from a [`DataLoader`]
pub struct LoaderEngine<'r, L>
where
    L: DataLoader,
{
    data_loader: L,
    registry: &'r VariantRegistry,
    mode_table: ModeTable,
}

impl<L> LoaderEngine<'static, L>
where
    L: DataLoader,
{
    /// Create an engine over the built-in catalog
    pub fn new(data_loader: L) -> Self {
        Self::with_registry(data_loader, builtin_registry())
    }
}

impl<'r, L> LoaderEngine<'r, L>
where
    L: DataLoader,
{
    pub fn with_registry(data_loader: L, registry: &'r VariantRegistry) -> Self {
        Self {
            data_loader,
            registry,
            mode_table: ModeTable::default(),
        }
    }

    /// Replace the add-on to mode table
    #[must_use]
    pub fn with_mode_table(mut self, mode_table: ModeTable) -> Self {
        self.mode_table = mode_table;
        self
    }

    #[must_use]
    pub const fn registry(&self) -> &VariantRegistry {
        self.registry
    }

    #[must_use]
    pub const fn mode_table(&self) -> &ModeTable {
        &self.mode_table
    }

    /// Environment a request evaluates under
    #[must_use]
    pub fn environment(&self, request: &BuildRequest) -> Environment {
        request.environment(&self.mode_table)
    }

    /// Load a stored build request by name
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be loaded or parsed.
    pub fn load_request(&self, name: &str) -> anyhow::Result<BuildRequest> {
        self.data_loader
            .load_config(name)
            .with_context(|| format!("loading build request `{name}`"))
    }

    /// Keys of the variants a request would build, in declaration order
    #[must_use]
    pub fn active_keys(&self, request: &BuildRequest) -> Vec<VariantKey> {
        let env = self.environment(request);
        self.registry
            .all_active_keys(&env)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Run a request against freshly loaded tables
    ///
    /// # Errors
    ///
    /// Returns an error if the tables cannot be loaded or the pass fails.
    pub fn build(&self, request: &BuildRequest) -> anyhow::Result<BuildOutput> {
        let mut tables = self
            .data_loader
            .load_tables()
            .context("loading record tables")?;
        self.build_with(request, &mut tables)
    }

    /// Run a request against caller-owned tables, registering into them
    ///
    /// # Errors
    ///
    /// Returns an error if the pass fails.
    pub fn build_with(
        &self,
        request: &BuildRequest,
        tables: &mut RecordTables,
    ) -> anyhow::Result<BuildOutput> {
        let env = self.environment(request);
        let active: Vec<&str> = env.flags().active().map(Mode::as_str).collect();
        log::debug!("active modes: {}", active.join(", "));
        run(self.registry, &env, tables, request.scope())
            .with_context(|| format!("building loaders for [{}]", request.add_ons.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;
    use std::collections::HashMap;
    use std::convert::Infallible;

    #[derive(Clone, Default)]
    struct FixtureLoader {
        configs: HashMap<String, String>,
    }

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_tables(&self) -> std::result::Result<RecordTables, Self::Error> {
            Ok(RecordTables::bundled())
        }

        fn load_config<T>(&self, config_name: &str) -> std::result::Result<T, Self::Error>
        where
            T: DeserializeOwned,
        {
            let raw = self.configs.get(config_name).map_or("{}", String::as_str);
            Ok(serde_json::from_str(raw).unwrap())
        }
    }

    #[test]
    fn engine_builds_requests_from_config() {
        let mut loader = FixtureLoader::default();
        loader.configs.insert(
            "space".into(),
            r#"{"add_ons": ["space-age"], "settings": {}}"#.into(),
        );
        let engine = LoaderEngine::new(loader);
        let request = engine.load_request("space").unwrap();
        let output = engine.build(&request).unwrap();
        let keys: Vec<_> = output.keys().map(VariantKey::as_str).collect();
        assert_eq!(keys, vec!["", "fast", "express", "turbo", "stack"]);
        assert_eq!(
            output.get("stack").unwrap().heating_energy.as_deref(),
            Some("20kW")
        );
    }

    #[test]
    fn missing_request_defaults_to_base_game() {
        let engine = LoaderEngine::new(FixtureLoader::default());
        let request = engine.load_request("absent").unwrap();
        assert_eq!(request, BuildRequest::default());
        assert_eq!(engine.active_keys(&request).len(), 3);
    }

    #[test]
    fn custom_mode_tables_map_new_add_ons() {
        let engine = LoaderEngine::new(FixtureLoader::default())
            .with_mode_table(ModeTable::empty().with_add_on("my-space-age", Mode::SpaceAge));
        let request = BuildRequest::new().with_add_ons(["my-space-age", "space-age"]);
        let env = engine.environment(&request);
        assert!(env.is_active(Mode::SpaceAge));
        let request = BuildRequest::new().with_add_ons(["space-age"]);
        assert!(!engine.environment(&request).is_active(Mode::SpaceAge));
    }

    #[test]
    fn build_errors_carry_context() {
        let engine = LoaderEngine::new(FixtureLoader::default());
        let mut tables = RecordTables::new();
        let err = engine
            .build_with(&BuildRequest::default(), &mut tables)
            .unwrap_err();
        assert!(format!("{err:#}").contains("building loaders"));
        assert!(err.downcast_ref::<VariantError>().is_some());
    }
}
