//! Built-in loader variants.
//!
//! Declaration order: vanilla tiers, then one block per add-on family.
//! Reports and builds follow this order, so new tiers go at the end of
//! their family block.
use std::sync::OnceLock;

use crate::draft::{Color, IngredientList, ingredients, technologies};
use crate::fragments::FragmentMap;
use crate::modes::Mode;
use crate::predicates;
use crate::processors::{ModeProcessors, stack_loader};
use crate::registry::{LoaderTemplate, VariantRegistry, VariantSpec};

/// Registry of every built-in variant, constructed on first use.
///
/// # Panics
///
/// Panics if the built-in declarations fail validation.
#[must_use]
pub fn builtin_registry() -> &'static VariantRegistry {
    static REGISTRY: OnceLock<VariantRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        VariantRegistry::from_specs(builtin_specs(), ModeProcessors::builtin())
            .expect("valid built-in loader catalog")
    })
}

/// Built-in specs in declaration order.
#[must_use]
pub fn builtin_specs() -> Vec<VariantSpec> {
    let mut specs = vanilla();
    specs.extend(bob());
    specs.extend(krastorio2());
    specs.extend(ultimate_belts());
    specs.extend(matt());
    specs
}

fn only(mode: Mode, list: IngredientList) -> FragmentMap<IngredientList> {
    FragmentMap::new().with_mode(mode, list)
}

fn tech(mode: Mode, names: &[&str]) -> FragmentMap<Vec<String>> {
    FragmentMap::new().with_mode(mode, technologies(names))
}

fn vanilla() -> Vec<VariantSpec> {
    vec![
        VariantSpec::new(
            "",
            predicates::base(),
            LoaderTemplate::new(
                "transport-belt",
                "d[loader]-a[mdrn-loader]",
                Color::rgb(0.98, 0.73, 0.0),
            )
            .ingredients(
                FragmentMap::base(ingredients(&[
                    ("transport-belt", 5),
                    ("iron-plate", 5),
                    ("iron-gear-wheel", 5),
                    ("electronic-circuit", 5),
                ]))
                .with_mode(
                    Mode::Krastorio2,
                    ingredients(&[
                        ("transport-belt", 5),
                        ("iron-plate", 10),
                        ("iron-gear-wheel", 10),
                    ]),
                ),
            )
            .prerequisites(FragmentMap::base(technologies(&["logistics"]))),
        ),
        VariantSpec::new(
            "fast",
            predicates::base(),
            LoaderTemplate::new(
                "fast-transport-belt",
                "d[loader]-b[fast-mdrn-loader]",
                Color::rgb(0.98, 0.27, 0.06),
            )
            .ingredients(FragmentMap::base(ingredients(&[
                ("fast-transport-belt", 5),
                ("iron-gear-wheel", 10),
                ("electronic-circuit", 5),
            ])))
            .prerequisites(FragmentMap::base(technologies(&["logistics-2"]))),
        )
        .upgrades_from(""),
        VariantSpec::new(
            "express",
            predicates::base(),
            LoaderTemplate::new(
                "express-transport-belt",
                "d[loader]-c[express-mdrn-loader]",
                Color::rgb(0.17, 0.65, 0.92),
            )
            .ingredients(
                FragmentMap::base(ingredients(&[
                    ("express-transport-belt", 5),
                    ("iron-gear-wheel", 10),
                    ("advanced-circuit", 5),
                ]))
                .with_mode(
                    Mode::SpaceAge,
                    ingredients(&[("express-transport-belt", 5), ("advanced-circuit", 10)]),
                ),
            )
            .prerequisites(FragmentMap::base(technologies(&["logistics-3"]))),
        )
        .upgrades_from("fast"),
        // Turbo belts exist with Space Age or with Bob's overhaul.
        VariantSpec::new(
            "turbo",
            predicates::turbo_belts(),
            LoaderTemplate::new(
                "turbo-transport-belt",
                "d[loader]-d[turbo-mdrn-loader]",
                Color::rgb(0.64, 0.80, 0.10),
            )
            .ingredients(
                only(
                    Mode::SpaceAge,
                    ingredients(&[
                        ("turbo-transport-belt", 5),
                        ("tungsten-plate", 10),
                        ("processing-unit", 5),
                    ]),
                )
                .with_mode(
                    Mode::Bob,
                    ingredients(&[
                        ("turbo-transport-belt", 5),
                        ("titanium-plate", 10),
                        ("processing-unit", 5),
                    ]),
                )
                .with_combo(
                    Mode::Bob,
                    ingredients(&[
                        ("turbo-transport-belt", 5),
                        ("tungsten-plate", 5),
                        ("titanium-plate", 5),
                    ]),
                ),
            )
            .prerequisites(
                tech(Mode::SpaceAge, &["turbo-transport-belt"])
                    .with_mode(Mode::Bob, technologies(&["logistics-4"]))
                    .with_combo(Mode::Bob, technologies(&["turbo-transport-belt"])),
            ),
        )
        .upgrades_from("express"),
        VariantSpec::new(
            "stack",
            predicates::space_age(),
            LoaderTemplate::new(
                "turbo-transport-belt",
                "d[loader]-e[stack-mdrn-loader]",
                Color::rgb(0.85, 0.85, 0.85),
            )
            .ingredients(only(
                Mode::SpaceAge,
                ingredients(&[
                    ("turbo-transport-belt", 5),
                    ("carbon-fiber", 10),
                    ("processing-unit", 10),
                ]),
            ))
            .prerequisites(tech(Mode::SpaceAge, &["stack-inserter"])),
        )
        .upgrades_from("turbo")
        .post_process(stack_loader),
    ]
}

fn bob() -> Vec<VariantSpec> {
    vec![
        VariantSpec::new(
            "basic",
            predicates::bob_overhaul(),
            LoaderTemplate::new(
                "basic-transport-belt",
                "d[loader]-0[basic-mdrn-loader]",
                Color::rgb(0.45, 0.45, 0.45),
            )
            .ingredients(only(
                Mode::Bob,
                ingredients(&[
                    ("basic-transport-belt", 5),
                    ("iron-plate", 5),
                    ("iron-gear-wheel", 5),
                ]),
            ))
            .prerequisites(FragmentMap::base(Vec::new())),
        ),
        VariantSpec::new(
            "ultimate",
            predicates::bob_overhaul(),
            LoaderTemplate::new(
                "ultimate-transport-belt",
                "d[loader]-f[ultimate-mdrn-loader]",
                Color::rgb(0.12, 0.90, 0.50),
            )
            .ingredients(
                only(
                    Mode::Bob,
                    ingredients(&[
                        ("ultimate-transport-belt", 5),
                        ("nitinol-alloy", 10),
                        ("processing-unit", 10),
                    ]),
                )
                .with_combo(
                    Mode::Bob,
                    ingredients(&[
                        ("ultimate-transport-belt", 5),
                        ("nitinol-alloy", 10),
                        ("carbon-fiber", 10),
                    ]),
                ),
            )
            .prerequisites(tech(Mode::Bob, &["logistics-5"])),
        )
        .upgrades_from("turbo"),
    ]
}

fn krastorio2() -> Vec<VariantSpec> {
    vec![
        VariantSpec::new(
            "kr-advanced",
            predicates::krastorio2(),
            LoaderTemplate::new(
                "kr-advanced-transport-belt",
                "d[loader]-k[kr-advanced-mdrn-loader]",
                Color::rgb(0.25, 0.85, 0.30),
            )
            .subgroup("kr-logistics")
            .ingredients(
                only(
                    Mode::Krastorio2,
                    ingredients(&[
                        ("kr-advanced-transport-belt", 5),
                        ("kr-steel-gear-wheel", 10),
                        ("processing-unit", 5),
                    ]),
                )
                .with_combo(
                    Mode::Krastorio2,
                    ingredients(&[
                        ("kr-advanced-transport-belt", 5),
                        ("kr-steel-gear-wheel", 10),
                        ("tungsten-plate", 5),
                    ]),
                ),
            )
            .prerequisites(tech(Mode::Krastorio2, &["kr-logistic-4"])),
        )
        .upgrades_from("express"),
        VariantSpec::new(
            "kr-superior",
            predicates::krastorio2(),
            LoaderTemplate::new(
                "kr-superior-transport-belt",
                "d[loader]-k[kr-superior-mdrn-loader]",
                Color::rgb(0.70, 0.20, 0.90),
            )
            .subgroup("kr-logistics")
            .ingredients(only(
                Mode::Krastorio2,
                ingredients(&[
                    ("kr-superior-transport-belt", 5),
                    ("kr-imersium-gear-wheel", 10),
                    ("kr-ai-core", 2),
                ]),
            ))
            .prerequisites(tech(Mode::Krastorio2, &["kr-logistic-5"])),
        )
        .upgrades_from("kr-advanced"),
    ]
}

fn ultimate_belts() -> Vec<VariantSpec> {
    struct Tier {
        key: &'static str,
        belt: &'static str,
        order: &'static str,
        tint: Color,
        technology: &'static str,
        full_line: bool,
    }

    let tiers = [
        Tier {
            key: "ub-ultra-fast",
            belt: "ultra-fast-belt",
            order: "a",
            tint: Color::rgb(0.0, 0.70, 0.30),
            technology: "ultra-fast-logistics",
            full_line: false,
        },
        Tier {
            key: "ub-extreme-fast",
            belt: "extreme-fast-belt",
            order: "b",
            tint: Color::rgb(0.90, 0.10, 0.10),
            technology: "extreme-fast-logistics",
            full_line: false,
        },
        Tier {
            key: "ub-ultra-express",
            belt: "ultra-express-belt",
            order: "c",
            tint: Color::rgb(0.40, 0.0, 0.90),
            technology: "ultra-express-logistics",
            full_line: true,
        },
        Tier {
            key: "ub-extreme-express",
            belt: "extreme-express-belt",
            order: "d",
            tint: Color::rgb(0.0, 0.15, 0.85),
            technology: "extreme-express-logistics",
            full_line: true,
        },
        Tier {
            key: "ub-ultimate",
            belt: "ultimate-belt",
            order: "e",
            tint: Color::rgb(0.0, 0.85, 0.75),
            technology: "ultimate-logistics",
            full_line: true,
        },
    ];

    // Each Ultimate Belts tier upgrades from the previous one; the first
    // from vanilla express.
    let mut previous = "express";
    let mut specs = Vec::with_capacity(tiers.len());
    for tier in tiers {
        let predicate = if tier.full_line {
            predicates::ultimate_full_line()
        } else {
            predicates::ultimate()
        };
        let order = format!("d[loader]-u[{}]", tier.order);
        let template = LoaderTemplate::new(tier.belt, order, tier.tint)
            .subgroup("ub-loaders")
            .ingredients(
                only(
                    Mode::Ultimate,
                    ingredients(&[(tier.belt, 5), ("processing-unit", 5), ("steel-plate", 10)]),
                )
                .with_combo(
                    Mode::Ultimate,
                    ingredients(&[
                        (tier.belt, 5),
                        ("processing-unit", 5),
                        ("tungsten-plate", 10),
                    ]),
                ),
            )
            .prerequisites(tech(Mode::Ultimate, &[tier.technology]));
        specs.push(VariantSpec::new(tier.key, predicate, template).upgrades_from(previous));
        previous = tier.key;
    }
    specs
}

fn matt() -> Vec<VariantSpec> {
    vec![
        VariantSpec::new(
            "matt-heavy",
            predicates::matt(),
            LoaderTemplate::new(
                "matt-heavy-belt",
                "d[loader]-m[matt-heavy-mdrn-loader]",
                Color::rgb(0.55, 0.35, 0.20),
            )
            .ingredients(
                only(
                    Mode::Matt,
                    ingredients(&[
                        ("matt-heavy-belt", 5),
                        ("steel-plate", 10),
                        ("advanced-circuit", 5),
                    ]),
                )
                .with_combo(
                    Mode::Matt,
                    ingredients(&[
                        ("matt-heavy-belt", 5),
                        ("tungsten-plate", 10),
                        ("advanced-circuit", 5),
                    ]),
                ),
            )
            .prerequisites(tech(Mode::Matt, &["matt-heavy-logistics"])),
        )
        .upgrades_from("express"),
        VariantSpec::new(
            "matt-hyper",
            predicates::matt(),
            LoaderTemplate::new(
                "matt-hyper-belt",
                "d[loader]-m[matt-hyper-mdrn-loader]",
                Color::rgb(0.90, 0.50, 0.95),
            )
            .ingredients(only(
                Mode::Matt,
                ingredients(&[("matt-hyper-belt", 5), ("processing-unit", 10)]),
            ))
            .prerequisites(tech(Mode::Matt, &["matt-hyper-logistics"])),
        )
        .upgrades_from("matt-heavy"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::VariantKey;

    #[test]
    fn builtin_catalog_validates() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), builtin_specs().len());
        registry.validate().unwrap();
    }

    #[test]
    fn vanilla_tiers_lead_the_declaration_order() {
        let keys: Vec<_> = builtin_registry()
            .iter()
            .take(3)
            .map(|spec| spec.key().as_str())
            .collect();
        assert_eq!(keys, vec!["", "fast", "express"]);
    }

    #[test]
    fn every_chain_ends_at_a_leaf_tier() {
        let registry = builtin_registry();
        for spec in registry.iter() {
            let chain = registry.upgrade_chain(spec.key()).unwrap();
            let leaf = chain.last().copied().unwrap();
            let leaf_spec = registry.get(leaf).unwrap();
            assert!(leaf_spec.upgrade_from().is_none(), "{}", spec.key());
        }
        let turbo = registry.upgrade_chain(&VariantKey::from("stack")).unwrap();
        assert_eq!(turbo.last().map(|key| key.is_baseline()), Some(true));
    }
}
