//! Two-tier decision store with pause-count cool-down.
//!
//! Each capability carries an independent decision record per tier. Reads
//! are read-modify-write: a suppressing decision decays back to `Unknown`
//! once its pause count reaches the tier's maximum, and otherwise the pause
//! count advances by one. Writes overwrite the decision and reset the pause
//! count.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::json;

use crate::error::{WorkerError, WorkerResult};
use crate::settings::SharedSettings;

use super::types::{Capability, Decision, Desire};

pub const PERSISTED_SKIPPED_MAX: u32 = 3;
pub const PERSISTED_DENIED_MAX: u32 = 10;
pub const EPHEMERAL_SKIPPED_MAX: u32 = 5;
pub const EPHEMERAL_DENIED_MAX: u32 = 12;

/// Which decision record a read or write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Survives process restarts via the settings store.
    Persisted,
    /// Lives only as long as the store instance.
    Ephemeral,
}

impl Tier {
    fn skipped_max(self) -> u32 {
        match self {
            Tier::Persisted => PERSISTED_SKIPPED_MAX,
            Tier::Ephemeral => EPHEMERAL_SKIPPED_MAX,
        }
    }

    fn denied_max(self) -> u32 {
        match self {
            Tier::Persisted => PERSISTED_DENIED_MAX,
            Tier::Ephemeral => EPHEMERAL_DENIED_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DecisionSlot {
    decision: Decision,
    pause: u32,
}

/// Per-capability decision records across both tiers.
///
/// An explicit injected instance, not a singleton; tests swap in a
/// [`crate::settings::MemorySettings`] backing.
pub struct DecisionStore {
    settings: SharedSettings,
    ephemeral: Mutex<HashMap<Capability, DecisionSlot>>,
}

impl DecisionStore {
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            settings,
            ephemeral: Mutex::new(HashMap::new()),
        }
    }

    /// Read the decision for `capability`, applying cool-down decay.
    ///
    /// A decayed record reads as [`Decision::Unknown`] with its pause count
    /// reset; any other read advances the pause count by one.
    pub fn read(&self, tier: Tier, capability: Capability) -> WorkerResult<Decision> {
        match tier {
            Tier::Persisted => self.read_persisted(capability),
            Tier::Ephemeral => self.read_ephemeral(capability),
        }
    }

    /// Overwrite the decision for `capability` and reset its pause count.
    pub fn record(&self, tier: Tier, capability: Capability, decision: Decision) -> WorkerResult<()> {
        match tier {
            Tier::Persisted => self.record_persisted(capability, decision),
            Tier::Ephemeral => self.record_ephemeral(capability, decision),
        }
    }

    /// Write `decision` into the tiers a request of `desire` governs:
    /// `WouldLike` writes both tiers, `Want` the ephemeral tier only, and
    /// `Need`/`Present` neither.
    pub fn record_for_desire(
        &self,
        desire: Desire,
        capability: Capability,
        decision: Decision,
    ) -> WorkerResult<()> {
        match desire {
            Desire::WouldLike => {
                self.record(Tier::Persisted, capability, decision)?;
                self.record(Tier::Ephemeral, capability, decision)
            }
            Desire::Want => self.record(Tier::Ephemeral, capability, decision),
            Desire::Need | Desire::Present => Ok(()),
        }
    }

    /// Current record without side effects, for diagnostics and tests.
    pub fn snapshot(&self, tier: Tier, capability: Capability) -> WorkerResult<(Decision, u32)> {
        match tier {
            Tier::Persisted => {
                let slot = self.load_persisted(capability)?;
                Ok((slot.decision, slot.pause))
            }
            Tier::Ephemeral => {
                let slots = self.lock_ephemeral()?;
                let slot = slots.get(&capability).copied().unwrap_or(DecisionSlot {
                    decision: Decision::Unknown,
                    pause: 0,
                });
                Ok((slot.decision, slot.pause))
            }
        }
    }

    fn apply_cooldown(tier: Tier, slot: DecisionSlot) -> (Decision, u32) {
        let decayed = (slot.decision == Decision::Skipped && slot.pause >= tier.skipped_max())
            || (slot.decision == Decision::Denied && slot.pause >= tier.denied_max());
        if decayed {
            (Decision::Unknown, 0)
        } else {
            (slot.decision, slot.pause + 1)
        }
    }

    fn read_ephemeral(&self, capability: Capability) -> WorkerResult<Decision> {
        let mut slots = self.lock_ephemeral()?;
        let slot = slots.entry(capability).or_insert(DecisionSlot {
            decision: Decision::Unknown,
            pause: 0,
        });
        let (decision, pause) = Self::apply_cooldown(Tier::Ephemeral, *slot);
        slot.decision = decision;
        slot.pause = pause;
        Ok(decision)
    }

    fn record_ephemeral(&self, capability: Capability, decision: Decision) -> WorkerResult<()> {
        let mut slots = self.lock_ephemeral()?;
        slots.insert(capability, DecisionSlot { decision, pause: 0 });
        Ok(())
    }

    fn read_persisted(&self, capability: Capability) -> WorkerResult<Decision> {
        if !capability.persists_decisions() {
            return Ok(Decision::Unknown);
        }
        let slot = self.load_persisted(capability)?;
        let (decision, pause) = Self::apply_cooldown(Tier::Persisted, slot);
        self.store_persisted(capability, DecisionSlot { decision, pause })?;
        Ok(decision)
    }

    fn record_persisted(&self, capability: Capability, decision: Decision) -> WorkerResult<()> {
        if !capability.persists_decisions() {
            return Ok(());
        }
        self.store_persisted(capability, DecisionSlot { decision, pause: 0 })
    }

    fn load_persisted(&self, capability: Capability) -> WorkerResult<DecisionSlot> {
        let decision = self
            .settings
            .get(&Self::decision_key(capability))?
            .and_then(|value| value.as_str().map(Decision::parse))
            .unwrap_or(Decision::Unknown);
        let pause = self
            .settings
            .get(&Self::pause_key(capability))?
            .and_then(|value| value.as_u64())
            .unwrap_or(0) as u32;
        Ok(DecisionSlot { decision, pause })
    }

    fn store_persisted(&self, capability: Capability, slot: DecisionSlot) -> WorkerResult<()> {
        self.settings
            .set(&Self::decision_key(capability), json!(slot.decision.as_str()))?;
        self.settings.set(&Self::pause_key(capability), json!(slot.pause))
    }

    fn decision_key(capability: Capability) -> String {
        format!("permissions.{}.decision", capability.key())
    }

    fn pause_key(capability: Capability) -> String {
        format!("permissions.{}.pause", capability.key())
    }

    fn lock_ephemeral(
        &self,
    ) -> WorkerResult<std::sync::MutexGuard<'_, HashMap<Capability, DecisionSlot>>> {
        self.ephemeral
            .lock()
            .map_err(|_| WorkerError::Internal("decision store lock poisoned".to_string()))
    }
}
