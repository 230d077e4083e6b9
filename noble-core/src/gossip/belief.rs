//! Belief formation: when does a repeated rumour become fact?
//!
//! ```text
//! score = trust / 10
//!       + (affinity(listener, kind) - 1)
//!       + 0.3 × valor  -  0.2 × calculating
//!       + [severe]      0.3 × honor + 0.5
//!       - [low stakes]  0.2
//!       - [negative, about own clan] 0.5
//! ```
//!
//! A rumour is promoted once it has been heard at least twice and the score
//! reaches [`BELIEF_THRESHOLD`]. The weights are fixed reference values.

use crate::memory::MemoryKind;
use crate::types::TraitSnapshot;

/// Score at or above which a repeated rumour is believed.
pub const BELIEF_THRESHOLD: f32 = 1.0;

/// Minimum hearings before a rumour can be believed.
pub const MIN_REPEATS_FOR_BELIEF: u32 = 2;

const TRUST_SCALE: f32 = 10.0;
const VALOR_TRUST: f32 = 0.3;
const CALCULATING_DOUBT: f32 = 0.2;
const HONOR_OUTRAGE: f32 = 0.3;
const DARK_RUMOUR_BIAS: f32 = 0.5;
const LOW_STAKES_DISCOUNT: f32 = 0.2;
const CLAN_LOYALTY_PENALTY: f32 = 0.5;

/// Everything the belief score depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeliefInputs {
    /// Speaker's relation toward the listener.
    pub trust: i32,
    /// Listener's personality.
    pub listener: TraitSnapshot,
    /// The underlying kind of the rumour.
    pub kind: MemoryKind,
    /// The rumour's subject is in the listener's own clan.
    pub about_own_clan: bool,
}

/// Compute the belief score.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn belief_score(inputs: &BeliefInputs) -> f32 {
    let traits = &inputs.listener;
    let profile = inputs.kind.profile();

    let mut score = inputs.trust as f32 / TRUST_SCALE;
    score += inputs.kind.trait_affinity(traits) - 1.0;
    score += VALOR_TRUST * traits.valor as f32;
    score -= CALCULATING_DOUBT * traits.calculating as f32;

    if profile.severe {
        score += HONOR_OUTRAGE * traits.honor as f32 + DARK_RUMOUR_BIAS;
    }
    if profile.low_stakes {
        score -= LOW_STAKES_DISCOUNT;
    }
    if profile.negative && inputs.about_own_clan {
        score -= CLAN_LOYALTY_PENALTY;
    }
    score
}

/// Whether a rumour heard `repeat_count` times with `score` is believed.
#[must_use]
pub fn should_promote(repeat_count: u32, score: f32) -> bool {
    repeat_count >= MIN_REPEATS_FOR_BELIEF && score >= BELIEF_THRESHOLD
}
