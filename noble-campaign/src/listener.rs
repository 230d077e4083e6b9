//! A [`World`] wrapper that forwards material relation changes into the
//! ripple service.
//!
//! ```text
//!   hook / gossip ──▶ ListeningWorld::apply_relation_delta
//!                        ├──▶ inner.apply_relation_delta
//!                        └──▶ |Δ| ≥ threshold ──▶ RippleService ──▶ self (notify = false)
//! ```
//!
//! Ripple writes come back through the same wrapper. They are small and
//! the service ignores re-entrant passes, so they never ripple again.

use std::rc::Rc;

use tracing::trace;

use noble_core::ripple::AppliedRipple;
use noble_core::world::{ActorProfile, FamilyLinks};
use noble_core::{
    ActorId, ClanId, GameTime, KingdomId, RelationChange, RippleService, SettlementId, TraitSnapshot, World,
};

/// Wraps a host world and ripples every material relation change.
#[derive(Debug)]
pub struct ListeningWorld<W> {
    inner: W,
    ripple: Rc<RippleService>,
    threshold: i32,
    ripples: Vec<AppliedRipple>,
}

impl<W: World> ListeningWorld<W> {
    /// Wrap `inner`; changes with `|delta| >= threshold` ripple.
    #[must_use]
    pub fn new(inner: W, ripple: Rc<RippleService>, threshold: i32) -> Self {
        Self {
            inner,
            ripple,
            threshold,
            ripples: Vec::new(),
        }
    }

    /// The wrapped world.
    #[must_use]
    pub fn inner(&self) -> &W {
        &self.inner
    }

    /// The wrapped world, mutably. Changes made here bypass the listener.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwrap.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Drain the ripples applied since the last call.
    pub fn take_ripples(&mut self) -> Vec<AppliedRipple> {
        std::mem::take(&mut self.ripples)
    }

    /// Apply a fully described change (e.g. an emissary's) and ripple it.
    pub fn apply_relation_change(&mut self, change: RelationChange) {
        if change.delta == 0 {
            return;
        }
        self.inner
            .apply_relation_delta(change.a, change.b, change.delta, change.notify);

        if change.delta.abs() < self.threshold || self.ripple.is_rippling() {
            return;
        }
        let ripple = Rc::clone(&self.ripple);
        let applied = ripple.on_relation_changed(self, &change);
        trace!(a = %change.a, b = %change.b, delta = change.delta, applied = applied.len(), "Relation change heard");
        self.ripples.extend(applied);
    }
}

impl<W: World> World for ListeningWorld<W> {
    fn now(&self) -> GameTime {
        self.inner.now()
    }

    fn profile(&self, actor: ActorId) -> Option<ActorProfile> {
        self.inner.profile(actor)
    }

    fn traits(&self, actor: ActorId) -> TraitSnapshot {
        self.inner.traits(actor)
    }

    fn relation(&self, a: ActorId, b: ActorId) -> i32 {
        self.inner.relation(a, b)
    }

    fn apply_relation_delta(&mut self, a: ActorId, b: ActorId, delta: i32, notify: bool) {
        self.apply_relation_change(RelationChange {
            notify,
            ..RelationChange::new(a, b, delta)
        });
    }

    fn current_settlement(&self, actor: ActorId) -> Option<SettlementId> {
        self.inner.current_settlement(actor)
    }

    fn settlement_heroes(&self, settlement: SettlementId) -> Vec<ActorId> {
        self.inner.settlement_heroes(settlement)
    }

    fn army_leaders(&self, actor: ActorId) -> Vec<ActorId> {
        self.inner.army_leaders(actor)
    }

    fn party_heroes(&self, actor: ActorId) -> Vec<ActorId> {
        self.inner.party_heroes(actor)
    }

    fn family(&self, actor: ActorId) -> FamilyLinks {
        self.inner.family(actor)
    }

    fn clan_of(&self, actor: ActorId) -> Option<ClanId> {
        self.inner.clan_of(actor)
    }

    fn clan_lords(&self, clan: ClanId) -> Vec<ActorId> {
        self.inner.clan_lords(clan)
    }

    fn kingdom_of(&self, actor: ActorId) -> Option<KingdomId> {
        self.inner.kingdom_of(actor)
    }

    fn kingdom_leader(&self, kingdom: KingdomId) -> Option<ActorId> {
        self.inner.kingdom_leader(kingdom)
    }

    fn kingdom_clans(&self, kingdom: KingdomId) -> Vec<ClanId> {
        self.inner.kingdom_clans(kingdom)
    }

    fn living_actors(&self) -> Vec<ActorId> {
        self.inner.living_actors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noble_core::world::SandboxWorld;
    use noble_core::{RelationChangeDetail, Society};

    use crate::events::CampaignEvent;
    use crate::hooks::on_event;

    struct Court {
        world: ListeningWorld<SandboxWorld>,
        owner: ActorId,
        besieger: ActorId,
        owner_wife: ActorId,
        besieger_kin: ActorId,
    }

    fn court(society: &Society) -> Court {
        let mut world = SandboxWorld::new();
        let owner = world.add_lord(TraitSnapshot::default());
        let besieger = world.add_lord(TraitSnapshot::default());
        let owner_wife = world.add_lord(TraitSnapshot::default());
        let besieger_kin = world.add_lord(TraitSnapshot::default());
        world.marry(owner, owner_wife);
        let clan = world.add_clan(None);
        world.join_clan(besieger, clan);
        world.join_clan(besieger_kin, clan);
        Court {
            world: ListeningWorld::new(world, society.ripple_service(), 10),
            owner,
            besieger,
            owner_wife,
            besieger_kin,
        }
    }

    #[test]
    fn siege_penalty_ripples_through_the_listener() {
        let mut society = Society::default();
        let mut c = court(&society);

        let event = CampaignEvent::SiegeStarted {
            owner: c.owner,
            besieger: c.besieger,
            settlement: "Epicrotea".into(),
        };
        on_event(&mut society, &mut c.world, &event);

        let ripples = c.world.take_ripples();
        assert!(!ripples.is_empty());
        // negative change: everyone turns against the first party
        assert!(ripples.iter().all(|r| r.target == c.owner && r.delta < 0));
        let observers: Vec<ActorId> = ripples.iter().map(|r| r.observer).collect();
        assert!(observers.contains(&c.besieger_kin));
        assert!(observers.contains(&c.owner_wife));

        let calls = c.world.inner().relation_calls();
        assert_eq!(calls[0].delta, -30);
        assert!(calls[0].notify);
        assert!(calls[1..].iter().all(|call| !call.notify && call.delta.abs() <= 5));
        assert_eq!(calls.len(), 1 + ripples.len());
        assert!(c.world.take_ripples().is_empty());
    }

    #[test]
    fn small_changes_pass_straight_through() {
        let society = Society::default();
        let mut c = court(&society);
        c.world.apply_relation_delta(c.owner, c.besieger, 9, false);
        assert_eq!(c.world.inner().relation_calls().len(), 1);
        assert!(c.world.take_ripples().is_empty());
        assert_eq!(c.world.relation(c.owner, c.besieger), 9);
    }

    #[test]
    fn emissary_detail_is_carried_to_the_ripple() {
        let society = Society::default();
        let mut plain = court(&society);
        let mut envoy = court(&society);

        plain
            .world
            .apply_relation_change(RelationChange::new(plain.owner, plain.besieger, 12));
        envoy.world.apply_relation_change(
            RelationChange::new(envoy.owner, envoy.besieger, 12).with_detail(RelationChangeDetail::Emissary),
        );

        let total = |ripples: Vec<AppliedRipple>| ripples.iter().map(|r| r.delta).sum::<i32>();
        assert!(total(envoy.world.take_ripples()) >= total(plain.world.take_ripples()));
    }

    #[test]
    fn zero_change_is_ignored() {
        let society = Society::default();
        let mut c = court(&society);
        c.world.apply_relation_delta(c.owner, c.besieger, 0, true);
        assert!(c.world.into_inner().relation_calls().is_empty());
    }
}
