//! Relationship ripples: bounded second-order effects of one relation change.
//!
//! When A's relation with B moves materially, people close to either of them
//! react a little toward whichever side the change favours:
//!
//! ```text
//! ripple = base × ring × context(detail, |base|) × temperament(observer)
//!        × attenuation(|relation(observer, target)|)
//! ```
//!
//! Rings (highest weight wins when an actor is in several): family, clan,
//! close friends, kingdom. Results below 0.5 are dropped, the rest are
//! rounded half away from zero and clamped to the per-observer cap.
//!
//! Applying a ripple is itself a relation change. A host that forwards every
//! change back into [`RippleService::on_relation_changed`] would recurse, so
//! the service holds an in-progress flag for the duration of a pass and
//! ignores calls made while it is set.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, debug_span, trace};

use crate::config::RippleConfig;
use crate::metrics::{SocietyCounters, spans};
use crate::types::ActorId;
use crate::world::World;

const CONTEXT_BASE: f32 = 0.30;
const CONTEXT_PER_POINT: f32 = 0.02;
const CONTEXT_POINT_CAP: f32 = 15.0;
const EMISSARY_CONTEXT_BOOST: f32 = 1.15;
const TEMPERAMENT_PER_LEVEL: f32 = 0.03;
const SATURATION_KNEE: f32 = 20.0;
const SATURATION_SPAN: f32 = 80.0;
const SATURATION_MAX: f32 = 0.9;

/// Why the primary change happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationChangeDetail {
    /// Any ordinary cause.
    #[default]
    Default,
    /// A diplomatic mission; ripples harder and engages calculating minds.
    Emissary,
}

/// A primary relation change between two actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationChange {
    /// One side.
    pub a: ActorId,
    /// The other side.
    pub b: ActorId,
    /// Signed change; positive favours `b`, negative favours `a`.
    pub delta: i32,
    /// Cause.
    pub detail: RelationChangeDetail,
    /// Whether the primary change was announced to the player.
    pub notify: bool,
}

impl RelationChange {
    /// An ordinary, unannounced change.
    #[must_use]
    pub fn new(a: ActorId, b: ActorId, delta: i32) -> Self {
        Self {
            a,
            b,
            delta,
            detail: RelationChangeDetail::Default,
            notify: false,
        }
    }

    /// Same change with a different cause.
    #[must_use]
    pub fn with_detail(mut self, detail: RelationChangeDetail) -> Self {
        self.detail = detail;
        self
    }

    /// The actor the change is directed at.
    #[must_use]
    pub fn target(&self) -> ActorId {
        if self.delta >= 0 { self.b } else { self.a }
    }
}

/// One secondary change applied to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedRipple {
    /// Who reacted.
    pub observer: ActorId,
    /// Toward whom.
    pub target: ActorId,
    /// Rounded, capped change.
    pub delta: i32,
}

/// Computes and applies ripples; holds the re-entrancy flag.
#[derive(Debug)]
pub struct RippleService {
    config: RippleConfig,
    in_progress: Cell<bool>,
    counters: Arc<SocietyCounters>,
}

/// Clears the in-progress flag on drop, including on unwind.
struct RippleGuard<'a>(&'a Cell<bool>);

impl Drop for RippleGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl RippleService {
    /// Create a service.
    #[must_use]
    pub fn new(config: RippleConfig, counters: Arc<SocietyCounters>) -> Self {
        Self {
            config,
            in_progress: Cell::new(false),
            counters,
        }
    }

    /// Whether a ripple pass is currently running.
    #[must_use]
    pub fn is_rippling(&self) -> bool {
        self.in_progress.get()
    }

    fn enter(&self) -> Option<RippleGuard<'_>> {
        if self.in_progress.replace(true) {
            None
        } else {
            Some(RippleGuard(&self.in_progress))
        }
    }

    /// Relationship-change hook: ripples only material changes.
    pub fn on_relation_changed<W: World + ?Sized>(
        &self,
        world: &mut W,
        change: &RelationChange,
    ) -> Vec<AppliedRipple> {
        if change.delta.abs() < self.config.materiality_threshold {
            return Vec::new();
        }
        self.apply_ripples(world, change)
    }

    /// Propagate `change` to the observers around both parties.
    ///
    /// Returns the deltas applied. Calls made while a pass is already
    /// running return nothing.
    pub fn apply_ripples<W: World + ?Sized>(
        &self,
        world: &mut W,
        change: &RelationChange,
    ) -> Vec<AppliedRipple> {
        let Some(_guard) = self.enter() else {
            trace!(a = %change.a, b = %change.b, delta = change.delta, "Ripple suppressed (re-entrant)");
            return Vec::new();
        };
        let _span = debug_span!(spans::RIPPLE, a = %change.a, b = %change.b, delta = change.delta).entered();

        let target = change.target();
        let observers = self.observers(world, change);
        let context = self.context_multiplier(change);
        let mut applied = Vec::new();

        for (observer, ring_weight) in observers {
            if observer == target || !world.profile(observer).is_some_and(|p| p.alive) {
                continue;
            }
            let traits = world.traits(observer);
            let temperament = temperament(&traits, change.detail);
            let attenuation = saturation_attenuation(world.relation(observer, target));

            #[allow(clippy::cast_precision_loss)]
            let raw = change.delta as f32 * ring_weight * context * temperament * attenuation;
            let Some(delta) = self.finalize(raw) else {
                trace!(%observer, raw, "Ripple below threshold");
                continue;
            };

            world.apply_relation_delta(observer, target, delta, false);
            applied.push(AppliedRipple {
                observer,
                target,
                delta,
            });
        }

        SocietyCounters::add(&self.counters.ripples_applied, applied.len());
        debug!(
            a = %change.a,
            b = %change.b,
            delta = change.delta,
            notify_primary = change.notify,
            applied = applied.len(),
            "Ripple pass complete"
        );
        applied
    }

    /// Observers with their ring weight, capped and ordered by influence.
    pub fn observers<W: World + ?Sized>(&self, world: &W, change: &RelationChange) -> Vec<(ActorId, f32)> {
        let rings = &self.config.rings;
        let mut weights: BTreeMap<ActorId, f32> = BTreeMap::new();
        let mut offer = |actor: ActorId, weight: f32| {
            let slot = weights.entry(actor).or_insert(weight);
            if weight > *slot {
                *slot = weight;
            }
        };

        let living = world.living_actors();
        for (me, other) in [(change.a, change.b), (change.b, change.a)] {
            let family = world.family(me);
            for relative in family.spouse.into_iter().chain(family.parents()).chain(family.children.iter().copied()) {
                offer(relative, rings.family);
            }
            for parent in family.parents() {
                for sibling in world.family(parent).children {
                    offer(sibling, rings.family);
                }
            }

            if let Some(clan) = world.clan_of(me) {
                for mate in world.clan_lords(clan).into_iter().filter(|&m| m != other) {
                    offer(mate, rings.clan);
                }
            }

            for &friend in &living {
                if friend != other && friend != me && world.relation(me, friend) >= self.config.friend_threshold {
                    offer(friend, rings.friends);
                }
            }

            if let Some(kingdom) = world.kingdom_of(me) {
                if let Some(leader) = world.kingdom_leader(kingdom) {
                    offer(leader, rings.hierarchy);
                }
                for clan in world.kingdom_clans(kingdom) {
                    for lord in world.clan_lords(clan) {
                        offer(lord, rings.hierarchy);
                    }
                }
            }
        }

        weights.remove(&change.a);
        weights.remove(&change.b);

        let mut ranked: Vec<(ActorId, f32, i32)> = weights
            .into_iter()
            .filter(|&(id, _)| world.profile(id).is_some_and(|p| p.alive))
            .map(|(id, w)| {
                let closeness = world.relation(change.a, id).max(world.relation(change.b, id));
                (id, w, closeness)
            })
            .collect();
        ranked.sort_by(|x, y| y.1.total_cmp(&x.1).then(y.2.cmp(&x.2)));
        ranked.truncate(self.config.max_observers);
        ranked.into_iter().map(|(id, w, _)| (id, w)).collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn context_multiplier(&self, change: &RelationChange) -> f32 {
        let magnitude = (change.delta.abs() as f32).min(CONTEXT_POINT_CAP);
        let context = CONTEXT_BASE + CONTEXT_PER_POINT * magnitude;
        match change.detail {
            RelationChangeDetail::Emissary => context * EMISSARY_CONTEXT_BOOST,
            RelationChangeDetail::Default => context,
        }
    }

    /// Threshold, round half away from zero, clamp.
    #[allow(clippy::cast_possible_truncation)]
    fn finalize(&self, raw: f32) -> Option<i32> {
        if !raw.is_finite() || raw.abs() < self.config.min_abs_threshold {
            return None;
        }
        let cap = self.config.cap_per_observer;
        let delta = (raw.round() as i32).clamp(-cap, cap);
        (delta != 0).then_some(delta)
    }
}

/// Emotional reactivity of an observer.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn temperament(traits: &crate::types::TraitSnapshot, detail: RelationChangeDetail) -> f32 {
    let feeling = (traits.mercy.abs() + traits.honor.abs()) as f32;
    let mut modifier = 1.0 + TEMPERAMENT_PER_LEVEL * feeling;
    if detail == RelationChangeDetail::Emissary {
        modifier *= 1.0 + TEMPERAMENT_PER_LEVEL * traits.calculating.abs() as f32;
    }
    modifier
}

/// Ripple damping as the observer's relation with the target nears ±100.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn saturation_attenuation(relation: i32) -> f32 {
    let excess = (relation.abs() as f32 - SATURATION_KNEE) / SATURATION_SPAN;
    1.0 - excess.clamp(0.0, SATURATION_MAX)
}
