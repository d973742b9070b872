//! Named predicates gating each variant.
//!
//! Predicates are plain data so the registry can be inspected and reported
//! on without running anything. Evaluation is pure over [`Environment`].
use std::fmt;

use crate::constants::{
    SETTING_BOB_BELT_OVERHAUL, SETTING_KR_LOADERS, SETTING_ULTIMATE_TIERS, ULTIMATE_TIERS_ALL,
};
use crate::environment::Environment;
use crate::modes::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Always,
    Mode(Mode),
    SettingEnabled(&'static str),
    SettingEquals {
        name: &'static str,
        value: &'static str,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn evaluate(&self, env: &Environment) -> bool {
        match self {
            Self::Always => true,
            Self::Mode(mode) => env.is_active(*mode),
            Self::SettingEnabled(name) => env.settings().enabled(name),
            Self::SettingEquals { name, value } => env.settings().text(name) == Some(*value),
            Self::All(parts) => parts.iter().all(|part| part.evaluate(env)),
            Self::Any(parts) => parts.iter().any(|part| part.evaluate(env)),
        }
    }

    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::All(mut parts) => {
                parts.push(other);
                Self::All(parts)
            }
            first => Self::All(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Self::Any(mut parts) => {
                parts.push(other);
                Self::Any(parts)
            }
            first => Self::Any(vec![first, other]),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str) -> fmt::Result {
            f.write_str("(")?;
            for (idx, part) in parts.iter().enumerate() {
                if idx > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{part}")?;
            }
            f.write_str(")")
        }

        match self {
            Self::Always => f.write_str("always"),
            Self::Mode(mode) => write!(f, "{mode}"),
            Self::SettingEnabled(name) => write!(f, "setting[{name}]"),
            Self::SettingEquals { name, value } => write!(f, "setting[{name}]={value}"),
            Self::All(parts) => join(f, parts, " & "),
            Self::Any(parts) => join(f, parts, " | "),
        }
    }
}

#[must_use]
pub const fn base() -> Predicate {
    Predicate::Always
}

#[must_use]
pub const fn space_age() -> Predicate {
    Predicate::Mode(Mode::SpaceAge)
}

/// Krastorio 2 tiers only exist when its loader toggle is on.
#[must_use]
pub fn krastorio2() -> Predicate {
    Predicate::Mode(Mode::Krastorio2).and(Predicate::SettingEnabled(SETTING_KR_LOADERS))
}

/// Bob's belt tiers depend on the belt overhaul setting.
#[must_use]
pub fn bob_overhaul() -> Predicate {
    Predicate::Mode(Mode::Bob).and(Predicate::SettingEnabled(SETTING_BOB_BELT_OVERHAUL))
}

#[must_use]
pub const fn ultimate() -> Predicate {
    Predicate::Mode(Mode::Ultimate)
}

/// Upper Ultimate Belts tiers, hidden unless the full line is requested.
#[must_use]
pub fn ultimate_full_line() -> Predicate {
    ultimate().and(Predicate::SettingEquals {
        name: SETTING_ULTIMATE_TIERS,
        value: ULTIMATE_TIERS_ALL,
    })
}

#[must_use]
pub const fn matt() -> Predicate {
    Predicate::Mode(Mode::Matt)
}

/// Turbo belts come either from Space Age or from Bob's overhaul.
#[must_use]
pub fn turbo_belts() -> Predicate {
    space_age().or(bob_overhaul())
}
