//! Campaign events that produce noble memories.
//!
//! The host detects these (battle resolution, captivity, sieges, settlement
//! transfers, tournaments) and hands them to [`crate::hooks::on_event`].

use noble_core::ActorId;

/// A campaign-map event worth remembering.
#[derive(Debug, Clone, PartialEq)]
pub enum CampaignEvent {
    /// A field battle ended with a winning side.
    FieldBattleEnded {
        /// Lords leading parties on the winning side.
        winners: Vec<ActorId>,
        /// Lords leading parties on the losing side.
        losers: Vec<ActorId>,
    },

    /// A lord was taken captive.
    PrisonerTaken {
        /// The captive.
        captive: ActorId,
        /// Leader of the capturing party.
        captor: ActorId,
    },

    /// A captive lord was set free.
    PrisonerReleased {
        /// The released lord.
        captive: ActorId,
        /// Leader of the party that held them.
        captor: ActorId,
    },

    /// A siege began.
    SiegeStarted {
        /// Leader of the clan owning the settlement.
        owner: ActorId,
        /// Leader of the besieging party.
        besieger: ActorId,
        /// Settlement name, for notes.
        settlement: String,
    },

    /// A town changed hands.
    SettlementLost {
        /// Previous owner.
        old_owner: ActorId,
        /// Who took it.
        capturer: ActorId,
        /// Settlement name, for notes.
        settlement: String,
        /// Whether it fell to a siege (other transfers are not remembered).
        by_siege: bool,
    },

    /// A tournament was decided.
    TournamentFinished {
        /// The champion.
        winner: ActorId,
        /// Every hero who entered, winner included.
        participants: Vec<ActorId>,
        /// Host town name, for notes.
        town: String,
        /// The player fought; per-bout relation changes were already applied.
        player_participated: bool,
    },
}

impl CampaignEvent {
    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::FieldBattleEnded { .. } => "field_battle",
            Self::PrisonerTaken { .. } => "prisoner_taken",
            Self::PrisonerReleased { .. } => "prisoner_released",
            Self::SiegeStarted { .. } => "siege_started",
            Self::SettlementLost { .. } => "settlement_lost",
            Self::TournamentFinished { .. } => "tournament",
        }
    }

    /// Every actor named by the event.
    #[must_use]
    pub fn actors(&self) -> Vec<ActorId> {
        match self {
            Self::FieldBattleEnded { winners, losers } => winners.iter().chain(losers).copied().collect(),
            Self::PrisonerTaken { captive, captor } | Self::PrisonerReleased { captive, captor } => {
                vec![*captive, *captor]
            }
            Self::SiegeStarted { owner, besieger, .. } => vec![*owner, *besieger],
            Self::SettlementLost { old_owner, capturer, .. } => vec![*old_owner, *capturer],
            Self::TournamentFinished {
                winner, participants, ..
            } => {
                let mut all = vec![*winner];
                all.extend(participants.iter().copied().filter(|p| p != winner));
                all
            }
        }
    }
}
