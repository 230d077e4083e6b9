//! Core type definitions for the noble society simulation.
//!
//! Identity newtypes, simulated time, and the personality trait snapshot
//! that drives decay, gossip affinity and ripple strength.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for an actor (a noble) in the campaign world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Create a new random actor ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a clan (an actor's immediate affiliation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClanId(pub Uuid);

impl ClanId {
    /// Create a new random clan ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClanId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a kingdom (the top-level faction above clans).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KingdomId(pub Uuid);

impl KingdomId {
    /// Create a new random kingdom ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KingdomId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a settlement (town, castle, village).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    /// Create a new random settlement ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SettlementId {
    fn default() -> Self {
        Self::new()
    }
}

/// A structured key for two actors.
///
/// [`ActorPair::ordered`] keeps the direction (observer → target);
/// [`ActorPair::unordered`] normalises so `(a, b)` and `(b, a)` collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorPair(pub ActorId, pub ActorId);

impl ActorPair {
    /// Directional pair: `from` acts on / feels about `to`.
    #[must_use]
    pub fn ordered(from: ActorId, to: ActorId) -> Self {
        Self(from, to)
    }

    /// Direction-free pair.
    #[must_use]
    pub fn unordered(a: ActorId, b: ActorId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Campaign ticks per simulated day.
pub const TICKS_PER_DAY: u64 = 24_000;

/// Simulated campaign time, measured in ticks since campaign start.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GameTime {
    /// Campaign tick (monotonically increasing).
    pub tick: u64,
}

impl GameTime {
    /// Campaign start.
    pub const ZERO: Self = Self { tick: 0 };

    /// Time at an exact tick.
    #[must_use]
    pub const fn from_ticks(tick: u64) -> Self {
        Self { tick }
    }

    /// Time at a (possibly fractional) day. Negative days clamp to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn from_days(days: f64) -> Self {
        Self {
            tick: (days.max(0.0) * TICKS_PER_DAY as f64).round() as u64,
        }
    }

    /// This time expressed in days.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn days(self) -> f64 {
        self.tick as f64 / TICKS_PER_DAY as f64
    }

    /// Days elapsed since `earlier`. Zero if `earlier` is in the future.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn days_since(self, earlier: Self) -> f64 {
        self.tick.saturating_sub(earlier.tick) as f64 / TICKS_PER_DAY as f64
    }

    /// A time `days` later than this one.
    #[must_use]
    pub fn plus_days(self, days: f64) -> Self {
        Self::from_days(self.days() + days)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {:.2}", self.days())
    }
}

// ---------------------------------------------------------------------------
// Personality Traits
// ---------------------------------------------------------------------------

/// The personality axes this simulation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonalityTrait {
    /// Bravery in battle.
    Valor,
    /// Leniency toward the defeated.
    Mercy,
    /// Keeping one's word.
    Honor,
    /// Open-handedness.
    Generosity,
    /// Cold, strategic thinking.
    Calculating,
}

/// Per-actor integer trait levels, typically in `-2..=2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraitSnapshot {
    /// Valor level.
    pub valor: i32,
    /// Mercy level.
    pub mercy: i32,
    /// Honor level.
    pub honor: i32,
    /// Generosity level.
    pub generosity: i32,
    /// Calculating level.
    pub calculating: i32,
}

impl TraitSnapshot {
    /// Level of a single trait.
    #[must_use]
    pub fn level(&self, which: PersonalityTrait) -> i32 {
        match which {
            PersonalityTrait::Valor => self.valor,
            PersonalityTrait::Mercy => self.mercy,
            PersonalityTrait::Honor => self.honor,
            PersonalityTrait::Generosity => self.generosity,
            PersonalityTrait::Calculating => self.calculating,
        }
    }

    /// Sum of the four "virtue" traits (honor, valor, generosity, mercy).
    #[must_use]
    pub fn virtue_sum(&self) -> i32 {
        self.honor + self.valor + self.generosity + self.mercy
    }
}
