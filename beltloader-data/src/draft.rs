//! Draft records, deferred fields and the realized loader record.
//!
//! Building a variant is split in two phases. The builder fills the eager
//! fields of a [`RecordDraft`] (names, belt speed, payload). Ingredients and
//! prerequisites stay [`Deferred`] until [`RecordDraft::materialize`] runs,
//! after the surrounding stage has populated the tables they refer to.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::fragments::FragmentMap;
use crate::modes::ModeFlags;
use crate::naming::{VariantKey, scoped_name};
use crate::processors::PostProcessor;
use crate::tables::{Category, RecordTables};

/// RGBA tint, passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: u32,
}

impl Ingredient {
    #[must_use]
    pub fn new(name: impl Into<String>, amount: u32) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Most recipes carry four ingredients or fewer.
pub type IngredientList = SmallVec<[Ingredient; 4]>;

/// Build an ingredient list from `(name, amount)` pairs.
#[must_use]
pub fn ingredients(pairs: &[(&str, u32)]) -> IngredientList {
    pairs
        .iter()
        .map(|(name, amount)| Ingredient::new(*name, *amount))
        .collect()
}

/// Build a prerequisite list from technology names.
#[must_use]
pub fn technologies(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// A field that is either computed or still waiting on its fragment map.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred<T> {
    Ready(T),
    Pending(FragmentMap<T>),
}

impl<T: Clone> Deferred<T> {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }

    /// The computed value, selecting the applicable fragment when pending.
    ///
    /// # Errors
    ///
    /// Propagates fragment selection failures.
    pub fn settle(self, flags: &ModeFlags) -> Result<T> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Pending(map) => map.select(flags).cloned(),
        }
    }
}

/// A variant after the eager phase.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub key: VariantKey,
    pub name: String,
    pub order: String,
    pub subgroup: String,
    pub stack_size: u32,
    pub speed: f64,
    pub tint: Color,
    pub animation_set: String,
    /// Predecessor in the upgrade chain.
    pub upgrade_from: Option<VariantKey>,
    pub heating_energy: Option<String>,
    /// Rarely used per-family attributes.
    pub extras: BTreeMap<String, Value>,
    pub ingredients: Deferred<IngredientList>,
    pub prerequisites: Deferred<Vec<String>>,
    pub post_process: Option<PostProcessor>,
}

impl RecordDraft {
    /// Scoped entity name of the upgrade predecessor.
    #[must_use]
    pub fn upgrade_from_name(&self, scope: Option<&str>) -> Option<String> {
        self.upgrade_from
            .as_ref()
            .map(|key| scoped_name(scope, &key.entity_name()))
    }

    /// Second phase: evaluate deferred fields and check every name they
    /// mention against `tables`.
    ///
    /// # Errors
    ///
    /// Fails on fragment selection errors and on ingredients or
    /// prerequisites missing from the tables.
    pub fn materialize(
        self,
        flags: &ModeFlags,
        tables: &RecordTables,
        scope: Option<&str>,
    ) -> Result<LoaderRecord> {
        let upgrade_from = self.upgrade_from_name(scope);
        let ingredients = self.ingredients.settle(flags)?;
        for ingredient in &ingredients {
            tables.require(Category::Item, &ingredient.name)?;
        }
        let prerequisites = self.prerequisites.settle(flags)?;
        for technology in &prerequisites {
            tables.require(Category::Technology, technology)?;
        }

        Ok(LoaderRecord {
            upgrade_from,
            key: self.key,
            name: self.name,
            order: self.order,
            subgroup: self.subgroup,
            stack_size: self.stack_size,
            speed: self.speed,
            tint: self.tint,
            animation_set: self.animation_set,
            next_upgrade: None,
            heating_energy: self.heating_energy,
            ingredients,
            prerequisites,
            extras: self.extras,
        })
    }
}

/// Fully realized loader, ready to be registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderRecord {
    pub key: VariantKey,
    pub name: String,
    pub order: String,
    pub subgroup: String,
    pub stack_size: u32,
    pub speed: f64,
    pub tint: Color,
    pub animation_set: String,
    #[serde(default)]
    pub upgrade_from: Option<String>,
    #[serde(default)]
    pub next_upgrade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating_energy: Option<String>,
    pub ingredients: IngredientList,
    pub prerequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, Value>,
}
