//! Memory kinds and the per-kind profile table.
//!
//! Everything that depends on *what* a memory is about (how fast it fades,
//! which personality leanings amplify it, whether it counts as a dark rumour)
//! is looked up here as data instead of being branched on at each call site.

use serde::{Deserialize, Serialize};

use crate::config::DecayRates;
use crate::types::{PersonalityTrait, TraitSnapshot};

/// The category of a remembered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryKind {
    /// Set free by a captor after a battle.
    ReleasedAfterBattle,
    /// Asked for a favour and was refused.
    FavorRefused,
    /// Concluded a trade agreement.
    TradeDeal,
    /// Was insulted.
    Insult,
    /// Received or gave military aid.
    MilitaryAid,
    /// Was betrayed.
    Betrayal,
    /// Received a marriage proposal.
    MarriageProposal,
    /// Was backed in council.
    SupportInCouncil,
    /// Had a council proposal rejected.
    RejectedCouncilProposal,
    /// Heard a rumour from another actor.
    GossipHeard,
    /// Won a tournament bout.
    TournamentWin,
    /// Lost a tournament bout.
    TournamentLoss,
    /// Received a small favour.
    MinorFavor,
    /// Witnessed or suffered a murder.
    Murder,
    /// Won a field battle.
    BattleVictory,
    /// Lost a field battle.
    BattleDefeat,
    /// Lost soldiers to someone.
    LostSoldiersTo,
    /// A child was born.
    ChildBorn,
    /// Won a whole tournament.
    TournamentVictory,
    /// Showed or saw cowardice in battle.
    CowardiceInBattle,
    /// Was swayed politically.
    InfluencedBy,
    /// Lost a settlement.
    LostSettlement,
    /// A siege was laid.
    SiegeStarted,
    /// Was threatened by bandits.
    BanditThreat,
    /// Was taken prisoner.
    Imprisoned,
}

/// How a kind's records fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayClass {
    /// The default moderate rate.
    Standard,
    /// Short-term: fades faster.
    Fast,
    /// Fades slower than standard.
    Slow,
    /// Defining events: exempt from decay and expiry.
    NeverForget,
}

impl DecayClass {
    /// Per-day rate for this class. `NeverForget` keeps the standard rate on
    /// record, but the rate is never applied.
    #[must_use]
    pub fn rate(self, rates: &DecayRates) -> f32 {
        match self {
            Self::Standard | Self::NeverForget => rates.default,
            Self::Fast => rates.fast,
            Self::Slow => rates.slow,
        }
    }
}

/// Linear trait affinity: `base + per_level × level(trait)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affinity {
    /// The trait that amplifies this kind, if any.
    pub axis: Option<PersonalityTrait>,
    /// Affinity at trait level zero.
    pub base: f32,
    /// Affinity gained per trait level.
    pub per_level: f32,
}

impl Affinity {
    /// No leaning either way.
    pub const NEUTRAL: Self = Self {
        axis: None,
        base: 1.0,
        per_level: 0.0,
    };

    const fn on(axis: PersonalityTrait, base: f32, per_level: f32) -> Self {
        Self {
            axis: Some(axis),
            base,
            per_level,
        }
    }

    /// Evaluate against an actor's traits.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate(&self, traits: &TraitSnapshot) -> f32 {
        match self.axis {
            Some(axis) => self.base + self.per_level * traits.level(axis) as f32,
            None => self.base,
        }
    }
}

/// Everything the simulation needs to know about a kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindProfile {
    /// Decay behaviour assigned at construction.
    pub decay: DecayClass,
    /// Trait affinity used for gossip ranking and belief.
    pub affinity: Affinity,
    /// Severe dark rumour (murder, betrayal): honor-driven belief bias.
    pub severe: bool,
    /// Low-stakes kind (trade, minor favour): belief discount.
    pub low_stakes: bool,
    /// Negative kind: smears against the listener's own clan are discounted.
    pub negative: bool,
}

impl KindProfile {
    const fn new(decay: DecayClass, affinity: Affinity) -> Self {
        Self {
            decay,
            affinity,
            severe: false,
            low_stakes: false,
            negative: false,
        }
    }

    const fn severe(mut self) -> Self {
        self.severe = true;
        self.negative = true;
        self
    }

    const fn negative(mut self) -> Self {
        self.negative = true;
        self
    }

    const fn low_stakes(mut self) -> Self {
        self.low_stakes = true;
        self
    }
}

impl MemoryKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 25] = [
        Self::ReleasedAfterBattle,
        Self::FavorRefused,
        Self::TradeDeal,
        Self::Insult,
        Self::MilitaryAid,
        Self::Betrayal,
        Self::MarriageProposal,
        Self::SupportInCouncil,
        Self::RejectedCouncilProposal,
        Self::GossipHeard,
        Self::TournamentWin,
        Self::TournamentLoss,
        Self::MinorFavor,
        Self::Murder,
        Self::BattleVictory,
        Self::BattleDefeat,
        Self::LostSoldiersTo,
        Self::ChildBorn,
        Self::TournamentVictory,
        Self::CowardiceInBattle,
        Self::InfluencedBy,
        Self::LostSettlement,
        Self::SiegeStarted,
        Self::BanditThreat,
        Self::Imprisoned,
    ];

    /// Look up this kind's profile.
    #[must_use]
    pub const fn profile(self) -> KindProfile {
        use DecayClass::{Fast, NeverForget, Slow, Standard};
        use PersonalityTrait::{Generosity, Honor, Mercy, Valor};

        let valor = Affinity::on(Valor, 1.0, 0.25);
        let mercy = Affinity::on(Mercy, 1.0, 0.25);
        let honor = Affinity::on(Honor, 1.0, 0.25);
        let generosity = Affinity::on(Generosity, 0.5, 0.15);

        match self {
            Self::BattleVictory | Self::MilitaryAid | Self::LostSoldiersTo => {
                KindProfile::new(Standard, valor)
            }
            Self::TournamentWin => KindProfile::new(Slow, valor),
            Self::Murder => KindProfile::new(NeverForget, mercy).severe(),
            Self::ReleasedAfterBattle => KindProfile::new(Standard, mercy),
            Self::Betrayal => KindProfile::new(NeverForget, honor).severe(),
            Self::FavorRefused => KindProfile::new(Standard, honor),
            Self::TradeDeal => KindProfile::new(Slow, generosity).low_stakes(),
            Self::MinorFavor => KindProfile::new(Fast, generosity).low_stakes(),
            Self::TournamentLoss => KindProfile::new(Fast, Affinity::NEUTRAL),
            Self::ChildBorn => KindProfile::new(NeverForget, Affinity::NEUTRAL),
            Self::BattleDefeat => KindProfile::new(Standard, Affinity::NEUTRAL).negative(),
            Self::Insult
            | Self::MarriageProposal
            | Self::SupportInCouncil
            | Self::RejectedCouncilProposal
            | Self::GossipHeard
            | Self::TournamentVictory
            | Self::CowardiceInBattle
            | Self::InfluencedBy
            | Self::LostSettlement
            | Self::SiegeStarted
            | Self::BanditThreat
            | Self::Imprisoned => KindProfile::new(Standard, Affinity::NEUTRAL),
        }
    }

    /// How strongly an actor with `traits` is drawn to this kind.
    #[must_use]
    pub fn trait_affinity(self, traits: &TraitSnapshot) -> f32 {
        self.profile().affinity.evaluate(traits)
    }

    /// Stable display name (used as gossip topic).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ReleasedAfterBattle => "ReleasedAfterBattle",
            Self::FavorRefused => "FavorRefused",
            Self::TradeDeal => "TradeDeal",
            Self::Insult => "Insult",
            Self::MilitaryAid => "MilitaryAid",
            Self::Betrayal => "Betrayal",
            Self::MarriageProposal => "MarriageProposal",
            Self::SupportInCouncil => "SupportInCouncil",
            Self::RejectedCouncilProposal => "RejectedCouncilProposal",
            Self::GossipHeard => "GossipHeard",
            Self::TournamentWin => "TournamentWin",
            Self::TournamentLoss => "TournamentLoss",
            Self::MinorFavor => "MinorFavor",
            Self::Murder => "Murder",
            Self::BattleVictory => "BattleVictory",
            Self::BattleDefeat => "BattleDefeat",
            Self::LostSoldiersTo => "LostSoldiersTo",
            Self::ChildBorn => "ChildBorn",
            Self::TournamentVictory => "TournamentVictory",
            Self::CowardiceInBattle => "CowardiceInBattle",
            Self::InfluencedBy => "InfluencedBy",
            Self::LostSettlement => "LostSettlement",
            Self::SiegeStarted => "SiegeStarted",
            Self::BanditThreat => "BanditThreat",
            Self::Imprisoned => "Imprisoned",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
