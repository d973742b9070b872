//! Naming conventions, setting names and tuning values shared by the
//! catalog and the resolution engine.
//!
//! Everything an author of a new loader tier has to agree on lives here,
//! so the registry, selector and processors never hard-code strings.

use crate::modes::Mode;

// Naming ------------------------------------------------------------------
/// Entity name of the baseline tier; every other tier derives from it.
pub const BASELINE_NAME: &str = "mdrn-loader";
/// Joins a variant key (or a scope) to the name that follows it.
pub const NAME_SEPARATOR: &str = "-";

// Fragment selection --------------------------------------------------------
/// Mode whose flag turns on combination keys (`<mode>_space_age`).
pub const COMBO_MODE: Mode = Mode::SpaceAge;
/// Suffix appended to a mode identifier to form its combination key.
pub const COMBO_SUFFIX: &str = "_space_age";

// Settings ----------------------------------------------------------------
pub const SETTING_KR_LOADERS: &str = "kr-loaders";
pub const SETTING_BOB_BELT_OVERHAUL: &str = "bobmods-logistics-beltoverhaul";
pub const SETTING_ULTIMATE_TIERS: &str = "mdrn-ultimate-tiers";
pub const ULTIMATE_TIERS_ALL: &str = "all";

// Record tuning -------------------------------------------------------------
pub const DEFAULT_STACK_SIZE: u32 = 50;
pub const KRASTORIO2_STACK_SIZE: u32 = 100;
pub const SPACE_AGE_HEATING_ENERGY: &str = "20kW";
pub const STACK_LOADER_BELT_STACK_SIZE: u32 = 4;
pub(crate) const DEFAULT_SUBGROUP: &str = "belt";

// Extras keys ---------------------------------------------------------------
pub const EXTRA_MAX_BELT_STACK_SIZE: &str = "max_belt_stack_size";
pub const EXTRA_ADJUSTABLE_BELT_STACK_SIZE: &str = "adjustable_belt_stack_size";
