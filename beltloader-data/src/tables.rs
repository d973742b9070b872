//! External record tables, keyed by category and name.
//!
//! The tables are owned by the surrounding build stage. The engine reads
//! them for eager lookups (belt speed, animation sets) and for deferred
//! validation, and writes realized loaders back under their entity names.
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::draft::LoaderRecord;
use crate::error::{Result, VariantError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    TransportBelt,
    Item,
    Recipe,
    Technology,
    Loader,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::TransportBelt => "transport-belt",
            Category::Item => "item",
            Category::Recipe => "recipe",
            Category::Technology => "technology",
            Category::Loader => "loader",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category -> name -> opaque record. Categories the engine does not know
/// are carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordTables {
    tables: BTreeMap<String, BTreeMap<String, Value>>,
}

impl RecordTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse tables from JSON shaped as `{category: {name: record}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not have that shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Tables bundled with the crate: vanilla belts, items and technologies
    /// plus the add-on content the catalog refers to.
    #[must_use]
    pub fn bundled() -> Self {
        static BUNDLED: OnceLock<RecordTables> = OnceLock::new();
        BUNDLED
            .get_or_init(|| {
                RecordTables::from_json(include_str!("../assets/tables/bundled.json"))
                    .expect("valid bundled record tables")
            })
            .clone()
    }

    pub fn insert(&mut self, category: Category, name: impl Into<String>, record: Value) {
        self.tables
            .entry(category.as_str().to_string())
            .or_default()
            .insert(name.into(), record);
    }

    #[must_use]
    pub fn get(&self, category: Category, name: &str) -> Option<&Value> {
        self.tables.get(category.as_str())?.get(name)
    }

    #[must_use]
    pub fn contains(&self, category: Category, name: &str) -> bool {
        self.get(category, name).is_some()
    }

    /// Number of records in `category`.
    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        self.tables.get(category.as_str()).map_or(0, BTreeMap::len)
    }

    /// Look up a record that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError::MissingExternalRecord`] when it does not.
    pub fn require(&self, category: Category, name: &str) -> Result<&Value> {
        self.get(category, name)
            .ok_or_else(|| VariantError::MissingExternalRecord {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    /// Belt speed of the named transport belt.
    ///
    /// # Errors
    ///
    /// Fails when the belt is absent or has no numeric `speed`.
    pub fn belt_speed(&self, belt: &str) -> Result<f64> {
        self.require(Category::TransportBelt, belt)?
            .get("speed")
            .and_then(Value::as_f64)
            .ok_or_else(|| malformed(Category::TransportBelt, belt, "speed"))
    }

    /// Animation set of the named transport belt.
    ///
    /// # Errors
    ///
    /// Fails when the belt is absent or has no `belt_animation_set`.
    pub fn belt_animation_set(&self, belt: &str) -> Result<String> {
        self.require(Category::TransportBelt, belt)?
            .get("belt_animation_set")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| malformed(Category::TransportBelt, belt, "belt_animation_set"))
    }

    /// Write a realized loader into the `loader`, `item` and `recipe` tables.
    ///
    /// # Panics
    ///
    /// Panics if the record cannot be represented as JSON, which its
    /// string-keyed fields rule out.
    pub fn register_loader(&mut self, record: &LoaderRecord) {
        let entity = serde_json::to_value(record).expect("loader records serialize to JSON");
        self.insert(Category::Loader, record.name.clone(), entity);
        self.insert(
            Category::Item,
            record.name.clone(),
            json!({ "place_result": record.name, "stack_size": record.stack_size }),
        );
        self.insert(
            Category::Recipe,
            record.name.clone(),
            json!({
                "ingredients": record.ingredients,
                "results": [{ "name": record.name, "amount": 1 }],
                "enabled": record.prerequisites.is_empty(),
            }),
        );
    }
}

fn malformed(category: Category, name: &str, field: &'static str) -> VariantError {
    VariantError::MalformedExternalRecord {
        category: category.to_string(),
        name: name.to_string(),
        field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Color, ingredients};
    use crate::naming::VariantKey;

    fn belts() -> RecordTables {
        RecordTables::from_json(
            r#"{
                "transport-belt": {
                    "transport-belt": { "speed": 0.03125, "belt_animation_set": "basic" },
                    "broken-belt": { "belt_animation_set": "basic" }
                },
                "inserter": { "inserter": {} }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn belt_lookups_read_speed_and_animation() {
        let tables = belts();
        assert!((tables.belt_speed("transport-belt").unwrap() - 0.03125).abs() < f64::EPSILON);
        assert_eq!(tables.belt_animation_set("transport-belt").unwrap(), "basic");
    }

    #[test]
    fn absent_records_are_reported() {
        let err = belts().belt_speed("fast-transport-belt").unwrap_err();
        assert_eq!(
            err,
            VariantError::MissingExternalRecord {
                category: "transport-belt".into(),
                name: "fast-transport-belt".into(),
            }
        );
    }

    #[test]
    fn records_without_the_field_are_malformed() {
        let err = belts().belt_speed("broken-belt").unwrap_err();
        assert!(matches!(
            err,
            VariantError::MalformedExternalRecord { field: "speed", .. }
        ));
    }

    #[test]
    fn unknown_categories_survive_a_round_trip() {
        let tables = belts();
        let json = serde_json::to_string(&tables).unwrap();
        assert!(json.contains("\"inserter\""));
    }

    #[test]
    fn registered_loaders_land_in_three_tables() {
        let record = LoaderRecord {
            key: VariantKey::from("fast"),
            name: "fast-mdrn-loader".into(),
            order: "d[loader]-b".into(),
            subgroup: "belt".into(),
            stack_size: 50,
            speed: 0.0625,
            tint: Color::rgb(1.0, 0.0, 0.0),
            animation_set: "fast".into(),
            upgrade_from: Some("mdrn-loader".into()),
            next_upgrade: None,
            heating_energy: None,
            ingredients: ingredients(&[("iron-gear-wheel", 10)]),
            prerequisites: Vec::new(),
            extras: BTreeMap::new(),
        };
        let mut tables = RecordTables::new();
        tables.register_loader(&record);

        let entity = tables.get(Category::Loader, "fast-mdrn-loader").unwrap();
        assert_eq!(entity["upgrade_from"], "mdrn-loader");
        assert_eq!(entity["speed"], 0.0625);
        assert_eq!(
            tables.get(Category::Item, "fast-mdrn-loader").unwrap()["stack_size"],
            50
        );
        let recipe = tables.get(Category::Recipe, "fast-mdrn-loader").unwrap();
        assert_eq!(recipe["ingredients"][0]["name"], "iron-gear-wheel");
        assert_eq!(recipe["enabled"], true);
    }

    #[test]
    fn bundled_tables_cover_vanilla_belts() {
        let tables = RecordTables::bundled();
        for belt in ["transport-belt", "fast-transport-belt", "express-transport-belt"] {
            assert!(tables.belt_speed(belt).is_ok(), "{belt}");
        }
        assert!(tables.contains(Category::Technology, "logistics"));
        assert_eq!(tables.count(Category::Loader), 0);
    }
}
