//! Ordered registry of loader variants.
//!
//! Declaration order is part of the contract: it is the order in which
//! active variants are built and reported. Upgrade predecessors are typed
//! keys, so the chain is validated when the registry is constructed rather
//! than discovered halfway through a build.
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{DEFAULT_STACK_SIZE, DEFAULT_SUBGROUP};
use crate::draft::{Color, Deferred, Ingredient, IngredientList, RecordDraft};
use crate::environment::Environment;
use crate::error::{Result, VariantError};
use crate::fragments::FragmentMap;
use crate::naming::{VariantKey, scoped_name};
use crate::predicates::Predicate;
use crate::processors::{ModeProcessors, PostProcessor};
use crate::tables::RecordTables;

/// Inputs every builder receives.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub env: &'a Environment,
    pub tables: &'a RecordTables,
    /// Optional qualifier prefixed to entity and belt names.
    pub scope: Option<&'a str>,
}

impl<'a> BuildContext<'a> {
    #[must_use]
    pub const fn new(env: &'a Environment, tables: &'a RecordTables) -> Self {
        Self {
            env,
            tables,
            scope: None,
        }
    }

    #[must_use]
    pub const fn with_scope(mut self, scope: Option<&'a str>) -> Self {
        self.scope = scope;
        self
    }
}

/// Static description of one tier, turned into a draft by
/// [`VariantSpec::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderTemplate {
    /// Transport belt this loader matches; speed and animations come from it.
    pub belt: String,
    pub order: String,
    pub subgroup: String,
    pub tint: Color,
    pub stack_size: u32,
    /// Ingredients besides the predecessor loader.
    pub ingredients: FragmentMap<IngredientList>,
    pub prerequisites: FragmentMap<Vec<String>>,
}

impl LoaderTemplate {
    #[must_use]
    pub fn new(belt: impl Into<String>, order: impl Into<String>, tint: Color) -> Self {
        Self {
            belt: belt.into(),
            order: order.into(),
            subgroup: DEFAULT_SUBGROUP.to_string(),
            tint,
            stack_size: DEFAULT_STACK_SIZE,
            ingredients: FragmentMap::base(IngredientList::new()),
            prerequisites: FragmentMap::base(Vec::new()),
        }
    }

    #[must_use]
    pub fn subgroup(mut self, subgroup: impl Into<String>) -> Self {
        self.subgroup = subgroup.into();
        self
    }

    #[must_use]
    pub fn ingredients(mut self, ingredients: FragmentMap<IngredientList>) -> Self {
        self.ingredients = ingredients;
        self
    }

    #[must_use]
    pub fn prerequisites(mut self, prerequisites: FragmentMap<Vec<String>>) -> Self {
        self.prerequisites = prerequisites;
        self
    }
}

#[derive(Debug, Clone)]
pub struct VariantSpec {
    key: VariantKey,
    predicate: Predicate,
    upgrade_from: Option<VariantKey>,
    template: LoaderTemplate,
    post_process: Option<PostProcessor>,
}

impl VariantSpec {
    #[must_use]
    pub fn new(key: impl Into<VariantKey>, predicate: Predicate, template: LoaderTemplate) -> Self {
        Self {
            key: key.into(),
            predicate,
            upgrade_from: None,
            template,
            post_process: None,
        }
    }

    #[must_use]
    pub fn upgrades_from(mut self, key: impl Into<VariantKey>) -> Self {
        self.upgrade_from = Some(key.into());
        self
    }

    #[must_use]
    pub fn post_process(mut self, processor: PostProcessor) -> Self {
        self.post_process = Some(processor);
        self
    }

    #[must_use]
    pub const fn key(&self) -> &VariantKey {
        &self.key
    }

    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    #[must_use]
    pub const fn upgrade_from(&self) -> Option<&VariantKey> {
        self.upgrade_from.as_ref()
    }

    #[must_use]
    pub const fn template(&self) -> &LoaderTemplate {
        &self.template
    }

    /// Eager phase: look up belt data and assemble the draft. Deferred
    /// fields are left pending. Does not consult the predicate.
    ///
    /// # Errors
    ///
    /// Fails when the scoped belt is missing from the tables.
    pub fn build(&self, ctx: &BuildContext<'_>) -> Result<RecordDraft> {
        let belt = scoped_name(ctx.scope, &self.template.belt);
        let speed = ctx.tables.belt_speed(&belt)?;
        let animation_set = ctx.tables.belt_animation_set(&belt)?;

        let predecessor = self
            .upgrade_from
            .as_ref()
            .map(|key| scoped_name(ctx.scope, &key.entity_name()));
        let ingredients = self.template.ingredients.clone().map(|list| {
            let Some(predecessor) = &predecessor else {
                return list;
            };
            let mut with_predecessor = IngredientList::new();
            with_predecessor.push(Ingredient::new(predecessor.clone(), 1));
            with_predecessor.extend(list);
            with_predecessor
        });

        Ok(RecordDraft {
            key: self.key.clone(),
            name: scoped_name(ctx.scope, &self.key.entity_name()),
            order: self.template.order.clone(),
            subgroup: self.template.subgroup.clone(),
            stack_size: self.template.stack_size,
            speed,
            tint: self.template.tint,
            animation_set,
            upgrade_from: self.upgrade_from.clone(),
            heating_energy: None,
            extras: BTreeMap::new(),
            ingredients: Deferred::Pending(ingredients),
            prerequisites: Deferred::Pending(self.template.prerequisites.clone()),
            post_process: self.post_process,
        })
    }
}

/// Immutable, validated collection of variant specs.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    specs: Vec<VariantSpec>,
    index: BTreeMap<VariantKey, usize>,
    processors: ModeProcessors,
}

impl VariantRegistry {
    /// Build a registry from specs in declaration order.
    ///
    /// # Errors
    ///
    /// Fails on duplicate keys, dangling predecessors and upgrade cycles.
    pub fn from_specs(specs: Vec<VariantSpec>, processors: ModeProcessors) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (position, spec) in specs.iter().enumerate() {
            if index.insert(spec.key.clone(), position).is_some() {
                return Err(VariantError::DuplicateVariant {
                    key: spec.key.as_str().to_string(),
                });
            }
        }
        let registry = Self {
            specs,
            index,
            processors,
        };
        registry.validate()?;
        Ok(registry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &VariantKey) -> Option<&VariantSpec> {
        self.index.get(key).map(|&position| &self.specs[position])
    }

    /// Specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &VariantSpec> {
        self.specs.iter()
    }

    #[must_use]
    pub const fn processors(&self) -> &ModeProcessors {
        &self.processors
    }

    /// Keys whose predicate holds under `env`, in declaration order.
    #[must_use]
    pub fn all_active_keys(&self, env: &Environment) -> Vec<&VariantKey> {
        self.specs
            .iter()
            .filter(|spec| spec.predicate.evaluate(env))
            .map(|spec| &spec.key)
            .collect()
    }

    /// Build the draft for `key`, or `None` when its predicate is false.
    /// The predicate is checked before the builder runs, so inactive
    /// variants never fail.
    ///
    /// # Errors
    ///
    /// Fails for unknown keys and for builder errors of active variants.
    pub fn resolve(&self, key: &VariantKey, ctx: &BuildContext<'_>) -> Result<Option<RecordDraft>> {
        let spec = self.get(key).ok_or_else(|| VariantError::UnknownVariant {
            key: key.as_str().to_string(),
        })?;
        if !spec.predicate.evaluate(ctx.env) {
            log::debug!("variant `{key}` inactive: {}", spec.predicate);
            return Ok(None);
        }

        let mut draft = spec.build(ctx)?;
        self.processors.apply(&mut draft, ctx.env.flags());
        if let Some(processor) = draft.post_process {
            processor(&mut draft);
        }
        Ok(Some(draft))
    }

    /// Check that every predecessor is declared and that no chain loops.
    ///
    /// # Errors
    ///
    /// Returns the first dangling reference or cycle found.
    pub fn validate(&self) -> Result<()> {
        for spec in &self.specs {
            if let Some(from) = &spec.upgrade_from
                && !self.index.contains_key(from)
            {
                return Err(VariantError::DanglingUpgrade {
                    key: spec.key.as_str().to_string(),
                    from: from.as_str().to_string(),
                });
            }
        }
        for spec in &self.specs {
            self.upgrade_chain(&spec.key)?;
        }
        Ok(())
    }

    /// `key` followed by its predecessors, ending at a tier with none.
    ///
    /// # Errors
    ///
    /// Fails for unknown keys, dangling predecessors and cycles.
    pub fn upgrade_chain(&self, key: &VariantKey) -> Result<Vec<&VariantKey>> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = self.get(key).ok_or_else(|| VariantError::UnknownVariant {
            key: key.as_str().to_string(),
        })?;
        loop {
            if !seen.insert(&current.key) {
                return Err(VariantError::UpgradeCycle {
                    key: current.key.as_str().to_string(),
                });
            }
            chain.push(&current.key);
            let Some(from) = &current.upgrade_from else {
                return Ok(chain);
            };
            current = self.get(from).ok_or_else(|| VariantError::DanglingUpgrade {
                key: current.key.as_str().to_string(),
                from: from.as_str().to_string(),
            })?;
        }
    }
}
