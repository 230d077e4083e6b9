//! The host-world boundary.
//!
//! The society never stores relationship scores, family trees or map
//! positions itself. Everything it reads about the world, and the single
//! primitive it uses to change it, goes through [`World`].

pub mod sandbox;

pub use sandbox::SandboxWorld;

use crate::types::{ActorId, ClanId, GameTime, KingdomId, SettlementId, TraitSnapshot};

/// Lowest possible relationship score.
pub const MIN_RELATION: i32 = -100;
/// Highest possible relationship score.
pub const MAX_RELATION: i32 = 100;

/// Static facts about an actor used for eligibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorProfile {
    /// Still alive.
    pub alive: bool,
    /// Of age.
    pub adult: bool,
    /// Of the noble class that trades gossip.
    pub lord: bool,
}

impl ActorProfile {
    /// A living adult lord.
    pub const LORD: Self = Self {
        alive: true,
        adult: true,
        lord: true,
    };

    /// Alive, adult and a lord.
    #[must_use]
    pub fn can_gossip(&self) -> bool {
        self.alive && self.adult && self.lord
    }
}

/// Immediate family of one actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyLinks {
    /// Current spouse.
    pub spouse: Option<ActorId>,
    /// Father.
    pub father: Option<ActorId>,
    /// Mother.
    pub mother: Option<ActorId>,
    /// Children.
    pub children: Vec<ActorId>,
}

impl FamilyLinks {
    /// Both parents, where known.
    pub fn parents(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.father.into_iter().chain(self.mother)
    }
}

/// Read-only world snapshot plus the relationship-change primitive.
///
/// Unknown actors are answered with empty values rather than errors.
pub trait World {
    /// Current simulated time.
    fn now(&self) -> GameTime;

    /// Eligibility facts, or `None` for an unknown actor.
    fn profile(&self, actor: ActorId) -> Option<ActorProfile>;

    /// Personality levels (all zero for an unknown actor).
    fn traits(&self, actor: ActorId) -> TraitSnapshot;

    /// Relationship score of `a` toward `b`, in `-100..=100`.
    fn relation(&self, a: ActorId, b: ActorId) -> i32;

    /// The sole relationship mutator.
    fn apply_relation_delta(&mut self, a: ActorId, b: ActorId, delta: i32, notify: bool);

    /// Settlement the actor is currently in.
    fn current_settlement(&self, actor: ActorId) -> Option<SettlementId>;

    /// Heroes present in a settlement.
    fn settlement_heroes(&self, settlement: SettlementId) -> Vec<ActorId>;

    /// Leaders of every party in the actor's army (empty if not in one).
    fn army_leaders(&self, actor: ActorId) -> Vec<ActorId>;

    /// Heroes travelling in the actor's party.
    fn party_heroes(&self, actor: ActorId) -> Vec<ActorId>;

    /// Immediate family links.
    fn family(&self, actor: ActorId) -> FamilyLinks;

    /// The actor's clan.
    fn clan_of(&self, actor: ActorId) -> Option<ClanId>;

    /// Lords belonging to a clan.
    fn clan_lords(&self, clan: ClanId) -> Vec<ActorId>;

    /// The actor's kingdom.
    fn kingdom_of(&self, actor: ActorId) -> Option<KingdomId>;

    /// Ruler of a kingdom.
    fn kingdom_leader(&self, kingdom: KingdomId) -> Option<ActorId>;

    /// Clans sworn to a kingdom.
    fn kingdom_clans(&self, kingdom: KingdomId) -> Vec<ClanId>;

    /// Every living hero.
    fn living_actors(&self) -> Vec<ActorId>;
}
