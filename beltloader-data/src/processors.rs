//! Draft post-processors.
//!
//! Mode-level processors run on every draft built while their mode is
//! active; the processor attached to a variant runs afterwards. All of
//! them assign rather than accumulate, so running one twice is harmless.
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::{
    EXTRA_ADJUSTABLE_BELT_STACK_SIZE, EXTRA_MAX_BELT_STACK_SIZE, KRASTORIO2_STACK_SIZE,
    SPACE_AGE_HEATING_ENERGY, STACK_LOADER_BELT_STACK_SIZE,
};
use crate::draft::RecordDraft;
use crate::modes::{Mode, ModeFlags};

pub type PostProcessor = fn(&mut RecordDraft);

/// Processors keyed by the mode that enables them.
#[derive(Debug, Clone, Default)]
pub struct ModeProcessors {
    by_mode: BTreeMap<Mode, Vec<PostProcessor>>,
}

impl ModeProcessors {
    /// No processors at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The processors shipped with the catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self::none()
            .with(Mode::SpaceAge, space_age_heating)
            .with(Mode::Krastorio2, krastorio2_stack_size)
    }

    #[must_use]
    pub fn with(mut self, mode: Mode, processor: PostProcessor) -> Self {
        self.by_mode.entry(mode).or_default().push(processor);
        self
    }

    /// Run every processor whose mode is active.
    pub fn apply(&self, draft: &mut RecordDraft, flags: &ModeFlags) {
        for (mode, processors) in &self.by_mode {
            if !flags.is_active(*mode) {
                continue;
            }
            for processor in processors {
                processor(draft);
            }
        }
    }

    #[must_use]
    pub fn count(&self, mode: Mode) -> usize {
        self.by_mode.get(&mode).map_or(0, Vec::len)
    }
}

/// Space Age freezes unheated entities on cold planets.
pub fn space_age_heating(draft: &mut RecordDraft) {
    draft.heating_energy = Some(SPACE_AGE_HEATING_ENERGY.to_string());
}

pub fn krastorio2_stack_size(draft: &mut RecordDraft) {
    draft.stack_size = KRASTORIO2_STACK_SIZE;
}

/// Variant-level processor for loaders that place stacked items on belts.
pub fn stack_loader(draft: &mut RecordDraft) {
    draft.extras.insert(
        EXTRA_MAX_BELT_STACK_SIZE.to_string(),
        Value::from(STACK_LOADER_BELT_STACK_SIZE),
    );
    draft
        .extras
        .insert(EXTRA_ADJUSTABLE_BELT_STACK_SIZE.to_string(), Value::Bool(true));
}
