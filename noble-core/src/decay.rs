//! Memory decay: linear daily fading, coarse expiry and half-life decay.
//!
//! Two independent forgetting criteria run on every daily tick:
//!
//! ```text
//!   daily step:  w ← w − sign(w) × rate × modifier      (never crosses zero)
//!   expiry:      age_days × modifier × rate > 1
//! ```
//!
//! Either can remove a record. The modifier comes from the *owning* actor's
//! personality, so the same betrayal fades faster for a merciful noble.
//!
//! The maintenance pass adds a third, exponential criterion:
//!
//! ```text
//!   w ← w × 0.5^(days / half_life)
//! ```
//!
//! `never_forget` records are exempt from all three.

use crate::memory::MemoryRecord;
use crate::types::{GameTime, TraitSnapshot};

/// Records with `|weight|` below this are dead and get pruned.
pub const PRUNE_EPSILON: f32 = 0.001;

/// Personality scaling of forgetting speed.
///
/// Mercy and generosity forgive faster; negative honor and a calculating
/// mind hold grudges longer.
#[must_use]
pub fn decay_modifier(traits: &TraitSnapshot) -> f32 {
    let mut modifier = 1.0_f32;
    if traits.mercy > 0 {
        modifier *= 1.25;
    }
    if traits.honor < 0 {
        modifier *= 0.85;
    }
    if traits.generosity > 0 {
        modifier *= 1.1;
    }
    if traits.calculating > 0 {
        modifier *= 0.9;
    }
    modifier
}

/// Apply one day of linear decay to `record`.
///
/// The weight moves toward zero by `decay_rate × modifier` and is snapped to
/// exactly zero once within [`PRUNE_EPSILON`].
pub fn decay_weight(record: &mut MemoryRecord, modifier: f32) {
    if record.never_forget {
        return;
    }

    let step = record.decay_rate * modifier;
    if record.weight > 0.0 {
        record.weight = (record.weight - step).max(0.0);
    } else if record.weight < 0.0 {
        record.weight = (record.weight + step).min(0.0);
    }

    if record.weight.abs() < PRUNE_EPSILON {
        record.weight = 0.0;
    }
}

/// Coarse age-based forgetting, independent of the current weight.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn is_expired(record: &MemoryRecord, now: GameTime, modifier: f32) -> bool {
    if record.never_forget {
        return false;
    }
    let days_since = record.age_days(now) as f32;
    days_since * modifier * record.decay_rate > 1.0
}

/// Whether the daily prune removes `record`.
#[must_use]
pub fn should_prune(record: &MemoryRecord, now: GameTime, modifier: f32) -> bool {
    is_expired(record, now, modifier) || record.weight.abs() < PRUNE_EPSILON
}

/// Exponential retention factor after `days` with the given half-life.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn half_life_factor(days: f64, half_life_days: f64) -> f32 {
    if half_life_days <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(days.max(0.0) / half_life_days) as f32
}

/// Run one day of linear decay and the daily prune over `memories`.
///
/// Returns the number of records removed.
pub fn decay_and_prune(memories: &mut Vec<MemoryRecord>, now: GameTime, modifier: f32) -> usize {
    for record in memories.iter_mut() {
        decay_weight(record, modifier);
    }
    let before = memories.len();
    memories.retain(|record| !should_prune(record, now, modifier));
    before - memories.len()
}
