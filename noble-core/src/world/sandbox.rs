//! An in-memory [`World`] for tests, benchmarks and headless simulation.
//!
//! Relationships are symmetric and clamped to `-100..=100`. Every call to
//! [`World::apply_relation_delta`] is also appended to an inspection log.

use std::collections::{BTreeMap, HashMap};

use super::{ActorProfile, FamilyLinks, MAX_RELATION, MIN_RELATION, World};
use crate::types::{ActorId, ActorPair, ClanId, GameTime, KingdomId, SettlementId, TraitSnapshot};

/// One call to the relationship primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationCall {
    /// First actor.
    pub a: ActorId,
    /// Second actor.
    pub b: ActorId,
    /// Requested change.
    pub delta: i32,
    /// Whether the host was asked to notify the player.
    pub notify: bool,
}

#[derive(Debug, Clone)]
struct ActorEntry {
    profile: ActorProfile,
    traits: TraitSnapshot,
    clan: Option<ClanId>,
    settlement: Option<SettlementId>,
    family: FamilyLinks,
}

/// A small mutable world.
#[derive(Debug, Clone, Default)]
pub struct SandboxWorld {
    now: GameTime,
    actors: BTreeMap<ActorId, ActorEntry>,
    relations: HashMap<ActorPair, i32>,
    clans: BTreeMap<ClanId, Option<KingdomId>>,
    kingdoms: BTreeMap<KingdomId, Option<ActorId>>,
    /// Parties as member lists; the first member leads.
    parties: Vec<Vec<ActorId>>,
    /// Armies as lists of party leaders.
    armies: Vec<Vec<ActorId>>,
    calls: Vec<RelationCall>,
}

impl SandboxWorld {
    /// An empty world at day zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------

    /// Add a living adult lord.
    pub fn add_lord(&mut self, traits: TraitSnapshot) -> ActorId {
        self.add_actor(ActorProfile::LORD, traits)
    }

    /// Add an actor with an explicit profile.
    pub fn add_actor(&mut self, profile: ActorProfile, traits: TraitSnapshot) -> ActorId {
        let id = ActorId::new();
        self.actors.insert(
            id,
            ActorEntry {
                profile,
                traits,
                clan: None,
                settlement: None,
                family: FamilyLinks::default(),
            },
        );
        id
    }

    /// Overwrite an actor's traits.
    pub fn set_traits(&mut self, actor: ActorId, traits: TraitSnapshot) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.traits = traits;
        }
    }

    /// Mark an actor dead.
    pub fn kill(&mut self, actor: ActorId) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.profile.alive = false;
        }
    }

    /// Create a kingdom, optionally with a ruler.
    pub fn add_kingdom(&mut self, leader: Option<ActorId>) -> KingdomId {
        let id = KingdomId::new();
        self.kingdoms.insert(id, leader);
        id
    }

    /// Create a clan, optionally sworn to a kingdom.
    pub fn add_clan(&mut self, kingdom: Option<KingdomId>) -> ClanId {
        let id = ClanId::new();
        self.clans.insert(id, kingdom);
        id
    }

    /// Put an actor in a clan.
    pub fn join_clan(&mut self, actor: ActorId, clan: ClanId) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.clan = Some(clan);
        }
    }

    /// Move an actor into (or out of) a settlement.
    pub fn place(&mut self, actor: ActorId, settlement: Option<SettlementId>) {
        if let Some(entry) = self.actors.get_mut(&actor) {
            entry.settlement = settlement;
        }
    }

    /// Marry two actors.
    pub fn marry(&mut self, a: ActorId, b: ActorId) {
        if let Some(entry) = self.actors.get_mut(&a) {
            entry.family.spouse = Some(b);
        }
        if let Some(entry) = self.actors.get_mut(&b) {
            entry.family.spouse = Some(a);
        }
    }

    /// Record `child`'s parents and add the child to theirs.
    pub fn set_parents(&mut self, child: ActorId, father: Option<ActorId>, mother: Option<ActorId>) {
        if let Some(entry) = self.actors.get_mut(&child) {
            entry.family.father = father;
            entry.family.mother = mother;
        }
        for parent in father.into_iter().chain(mother) {
            if let Some(entry) = self.actors.get_mut(&parent) {
                if !entry.family.children.contains(&child) {
                    entry.family.children.push(child);
                }
            }
        }
    }

    /// Form a travelling party; the first member leads.
    pub fn form_party(&mut self, members: Vec<ActorId>) {
        self.parties.push(members);
    }

    /// Gather party leaders into an army.
    pub fn form_army(&mut self, leaders: Vec<ActorId>) {
        self.armies.push(leaders);
    }

    /// Set a relationship score directly (no log entry).
    pub fn set_relation(&mut self, a: ActorId, b: ActorId, value: i32) {
        self.relations
            .insert(ActorPair::unordered(a, b), value.clamp(MIN_RELATION, MAX_RELATION));
    }

    // ------------------------------------------------------------------
    // Clock and inspection
    // ------------------------------------------------------------------

    /// Jump to an absolute time.
    pub fn set_now(&mut self, now: GameTime) {
        self.now = now;
    }

    /// Advance the clock.
    pub fn advance_days(&mut self, days: f64) {
        self.now = self.now.plus_days(days);
    }

    /// Every relationship call so far, in order.
    #[must_use]
    pub fn relation_calls(&self) -> &[RelationCall] {
        &self.calls
    }

    /// Forget the call log.
    pub fn clear_relation_calls(&mut self) {
        self.calls.clear();
    }

    fn entry(&self, actor: ActorId) -> Option<&ActorEntry> {
        self.actors.get(&actor)
    }
}

impl World for SandboxWorld {
    fn now(&self) -> GameTime {
        self.now
    }

    fn profile(&self, actor: ActorId) -> Option<ActorProfile> {
        self.entry(actor).map(|e| e.profile)
    }

    fn traits(&self, actor: ActorId) -> TraitSnapshot {
        self.entry(actor).map(|e| e.traits).unwrap_or_default()
    }

    fn relation(&self, a: ActorId, b: ActorId) -> i32 {
        self.relations.get(&ActorPair::unordered(a, b)).copied().unwrap_or(0)
    }

    fn apply_relation_delta(&mut self, a: ActorId, b: ActorId, delta: i32, notify: bool) {
        self.calls.push(RelationCall { a, b, delta, notify });
        let current = self.relation(a, b);
        self.set_relation(a, b, current.saturating_add(delta));
    }

    fn current_settlement(&self, actor: ActorId) -> Option<SettlementId> {
        self.entry(actor).and_then(|e| e.settlement)
    }

    fn settlement_heroes(&self, settlement: SettlementId) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, e)| e.settlement == Some(settlement))
            .map(|(id, _)| *id)
            .collect()
    }

    fn army_leaders(&self, actor: ActorId) -> Vec<ActorId> {
        let leader = self
            .parties
            .iter()
            .find(|party| party.contains(&actor))
            .and_then(|party| party.first().copied())
            .unwrap_or(actor);
        self.armies
            .iter()
            .find(|army| army.contains(&leader))
            .cloned()
            .unwrap_or_default()
    }

    fn party_heroes(&self, actor: ActorId) -> Vec<ActorId> {
        self.parties
            .iter()
            .find(|party| party.contains(&actor))
            .cloned()
            .unwrap_or_default()
    }

    fn family(&self, actor: ActorId) -> FamilyLinks {
        self.entry(actor).map(|e| e.family.clone()).unwrap_or_default()
    }

    fn clan_of(&self, actor: ActorId) -> Option<ClanId> {
        self.entry(actor).and_then(|e| e.clan)
    }

    fn clan_lords(&self, clan: ClanId) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, e)| e.clan == Some(clan) && e.profile.lord)
            .map(|(id, _)| *id)
            .collect()
    }

    fn kingdom_of(&self, actor: ActorId) -> Option<KingdomId> {
        self.clan_of(actor).and_then(|clan| self.clans.get(&clan).copied().flatten())
    }

    fn kingdom_leader(&self, kingdom: KingdomId) -> Option<ActorId> {
        self.kingdoms.get(&kingdom).copied().flatten()
    }

    fn kingdom_clans(&self, kingdom: KingdomId) -> Vec<ClanId> {
        self.clans
            .iter()
            .filter(|(_, k)| **k == Some(kingdom))
            .map(|(id, _)| *id)
            .collect()
    }

    fn living_actors(&self) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, e)| e.profile.alive)
            .map(|(id, _)| *id)
            .collect()
    }
}
