//! Relationship consequences of hearing a story, as a static rule table.
//!
//! Each rule is a trait gate on the *listener*, an optional roll, who the
//! listener's feelings change toward, and a small signed delta. Every
//! matching rule fires independently; the rate limiter then decides how
//! much of each delta actually lands.

use rand::Rng;

use crate::memory::MemoryKind;
use crate::types::{PersonalityTrait, TraitSnapshot};

/// Comparison used by a trait gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Strictly greater than.
    Gt,
    /// Strictly less than.
    Lt,
    /// Greater than or equal.
    Ge,
}

/// `level(axis) <cmp> level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitGate {
    /// Trait being tested.
    pub axis: PersonalityTrait,
    /// Comparison.
    pub cmp: Comparison,
    /// Right-hand side.
    pub level: i32,
}

impl TraitGate {
    /// Whether `traits` pass this gate.
    #[must_use]
    pub fn passes(&self, traits: &TraitSnapshot) -> bool {
        let value = traits.level(self.axis);
        match self.cmp {
            Comparison::Gt => value > self.level,
            Comparison::Lt => value < self.level,
            Comparison::Ge => value >= self.level,
        }
    }
}

/// Whose relation the listener changes toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The actor the shared memory came from.
    MemorySource,
    /// Whoever is telling the story.
    Speaker,
}

/// One row of the consequence table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsequenceRule {
    /// Listener trait condition.
    pub gate: TraitGate,
    /// Probability of firing once the gate passes; `None` means always.
    pub chance: Option<f64>,
    /// Who the change is toward.
    pub recipient: Recipient,
    /// Signed relation change.
    pub delta: i32,
    /// Rate-limiter reason key.
    pub reason: &'static str,
}

impl ConsequenceRule {
    /// Evaluate the gate, then roll if the rule is probabilistic.
    pub fn fires<R: Rng + ?Sized>(&self, listener: &TraitSnapshot, rng: &mut R) -> bool {
        if !self.gate.passes(listener) {
            return false;
        }
        self.chance.is_none_or(|p| rng.gen_bool(p.clamp(0.0, 1.0)))
    }
}

const fn rule(
    axis: PersonalityTrait,
    cmp: Comparison,
    level: i32,
    chance: Option<f64>,
    recipient: Recipient,
    delta: i32,
    reason: &'static str,
) -> ConsequenceRule {
    ConsequenceRule {
        gate: TraitGate { axis, cmp, level },
        chance,
        recipient,
        delta,
        reason,
    }
}

use Comparison::{Ge, Gt, Lt};
use PersonalityTrait::{Calculating, Generosity, Honor, Mercy, Valor};
use Recipient::{MemorySource, Speaker};

const RELEASED: &[ConsequenceRule] = &[
    rule(Mercy, Gt, 0, None, MemorySource, 1, "Released+Mercy"),
    rule(Mercy, Lt, 0, None, MemorySource, -1, "Released-Mercy"),
];

const VICTORY: &[ConsequenceRule] = &[
    rule(Valor, Gt, 0, None, MemorySource, 1, "Victory+Valor"),
    rule(Calculating, Gt, 0, None, MemorySource, -1, "Victory-Calc"),
];

const DEFEAT: &[ConsequenceRule] = &[
    rule(Calculating, Gt, 0, None, MemorySource, -1, "Defeat-Calc"),
    rule(Honor, Ge, 2, Some(0.25), MemorySource, 1, "Defeat+Honor"),
];

const LOST_SOLDIERS: &[ConsequenceRule] = &[
    rule(Honor, Ge, 2, Some(0.33), MemorySource, 1, "Lost+Honor"),
    rule(Mercy, Ge, 1, Some(0.33), MemorySource, -1, "Lost-Mercy"),
];

const MURDER: &[ConsequenceRule] = &[rule(Mercy, Gt, 0, None, MemorySource, -1, "Murder-Mercy")];

const TRADE: &[ConsequenceRule] = &[
    rule(Generosity, Gt, 2, Some(0.5), Speaker, 1, "Trade+Gen"),
    rule(Calculating, Gt, 1, Some(0.25), Speaker, -1, "Trade-Calc"),
];

const AID: &[ConsequenceRule] = &[
    rule(Valor, Gt, 0, Some(0.66), Speaker, 1, "Aid+Valor"),
    rule(Honor, Lt, 0, Some(0.25), Speaker, -1, "Aid-Honor"),
];

const BETRAYAL: &[ConsequenceRule] = &[
    rule(Honor, Gt, 0, None, Speaker, -1, "Betrayal-Honor"),
    rule(Calculating, Ge, 2, Some(0.2), Speaker, 1, "Betrayal+Calc"),
];

const REFUSED: &[ConsequenceRule] = &[
    rule(Mercy, Lt, 0, None, Speaker, 1, "Refused+Mercy"),
    rule(Honor, Gt, 0, Some(0.5), Speaker, -1, "Refused-Honor"),
];

/// The consequence rules for a kind (empty for kinds with none).
#[must_use]
pub fn rules_for(kind: MemoryKind) -> &'static [ConsequenceRule] {
    match kind {
        MemoryKind::ReleasedAfterBattle => RELEASED,
        MemoryKind::BattleVictory => VICTORY,
        MemoryKind::BattleDefeat => DEFEAT,
        MemoryKind::LostSoldiersTo => LOST_SOLDIERS,
        MemoryKind::Murder => MURDER,
        MemoryKind::TradeDeal => TRADE,
        MemoryKind::MilitaryAid | MemoryKind::MinorFavor => AID,
        MemoryKind::Betrayal => BETRAYAL,
        MemoryKind::FavorRefused => REFUSED,
        _ => &[],
    }
}
