//! Anti-drift limiter for gossip-driven relation changes.
//!
//! Two independent checks guard every (listener, actor) pair:
//!
//! - a per-reason cooldown, so the same story cannot nudge the same pair
//!   twice within a few days;
//! - a rolling seven-day budget on the *total absolute* change. Requests
//!   that would overrun the budget are clipped to what remains, keeping
//!   their sign.

use std::collections::{HashMap, VecDeque};

use crate::types::{ActorId, ActorPair, GameTime};

/// Length of the rolling budget window.
pub const WINDOW_DAYS: f64 = 7.0;

/// What the limiter decided for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    /// Applied in full.
    Applied(i32),
    /// Partially applied.
    Clipped {
        /// The requested delta.
        requested: i32,
        /// The delta actually granted (same sign, smaller magnitude).
        applied: i32,
    },
    /// Same reason applied to this pair too recently.
    CoolingDown,
    /// Nothing left in this week's budget.
    BudgetExhausted,
    /// Zero delta, or an actor feeling something about themself.
    Ignored,
}

impl RateLimitOutcome {
    /// The delta to hand to the world, if any.
    #[must_use]
    pub fn granted(self) -> Option<i32> {
        match self {
            Self::Applied(delta) | Self::Clipped { applied: delta, .. } => Some(delta),
            Self::CoolingDown | Self::BudgetExhausted | Self::Ignored => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReasonKey {
    pair: ActorPair,
    reason: String,
}

/// Per-pair cooldown and weekly budget ledgers.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    cooldown_days: f64,
    weekly_cap: i32,
    last_applied: HashMap<ReasonKey, GameTime>,
    spent: HashMap<ActorPair, VecDeque<(GameTime, i32)>>,
}

impl RateLimiter {
    /// A limiter with the given same-reason cooldown and weekly cap.
    #[must_use]
    pub fn new(cooldown_days: f64, weekly_cap: u32) -> Self {
        Self {
            cooldown_days,
            weekly_cap: i32::try_from(weekly_cap).unwrap_or(i32::MAX),
            last_applied: HashMap::new(),
            spent: HashMap::new(),
        }
    }

    /// Decide how much of `delta` may be applied from `listener` toward
    /// `actor` for `reason` at `now`, and book it if anything is granted.
    pub fn admit(
        &mut self,
        listener: ActorId,
        actor: ActorId,
        delta: i32,
        reason: &str,
        now: GameTime,
    ) -> RateLimitOutcome {
        if delta == 0 || listener == actor {
            return RateLimitOutcome::Ignored;
        }

        let pair = ActorPair::ordered(listener, actor);
        let key = ReasonKey {
            pair,
            reason: reason.to_owned(),
        };
        if let Some(&last) = self.last_applied.get(&key) {
            if now.days_since(last) < self.cooldown_days {
                return RateLimitOutcome::CoolingDown;
            }
        }

        let window = self.spent.entry(pair).or_default();
        while window
            .front()
            .is_some_and(|&(at, _)| now.days_since(at) >= WINDOW_DAYS)
        {
            window.pop_front();
        }

        let used: i32 = window.iter().map(|&(_, amount)| amount).sum();
        let remaining = self.weekly_cap - used;
        if remaining <= 0 {
            return RateLimitOutcome::BudgetExhausted;
        }

        let magnitude = delta.abs().min(remaining);
        let applied = magnitude * delta.signum();
        window.push_back((now, magnitude));
        self.last_applied.insert(key, now);

        if applied == delta {
            RateLimitOutcome::Applied(applied)
        } else {
            RateLimitOutcome::Clipped {
                requested: delta,
                applied,
            }
        }
    }

    /// Forget cooldowns that have lapsed and bookings that have left the
    /// window. Returns the number of ledger entries dropped.
    pub fn prune(&mut self, now: GameTime) -> usize {
        let before = self.tracked_entries();
        let cooldown = self.cooldown_days;
        self.last_applied.retain(|_, last| now.days_since(*last) < cooldown);
        self.spent.retain(|_, window| {
            while window
                .front()
                .is_some_and(|&(at, _)| now.days_since(at) >= WINDOW_DAYS)
            {
                window.pop_front();
            }
            !window.is_empty()
        });
        before - self.tracked_entries()
    }

    /// Reason cooldowns plus pair windows currently held.
    #[must_use]
    pub fn tracked_entries(&self) -> usize {
        self.last_applied.len() + self.spent.len()
    }

    /// Total absolute change booked for the pair in the current window.
    #[must_use]
    pub fn spent_this_week(&self, listener: ActorId, actor: ActorId, now: GameTime) -> i32 {
        self.spent
            .get(&ActorPair::ordered(listener, actor))
            .map_or(0, |window| {
                window
                    .iter()
                    .filter(|&&(at, _)| now.days_since(at) < WINDOW_DAYS)
                    .map(|&(_, amount)| amount)
                    .sum()
            })
    }
}
