//! Sequential per-round decision collection.
//!
//! Players decide in roster order. A convoy intent opens a cost step where the
//! same player either pays the fuel cost or freerides. Once every player holds a
//! decision the collector is complete and the round can resolve.
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::generator::RoundMissions;
use crate::mission::MissionKind;
use crate::player::{Player, PlayerId};

/// Top-level choice for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    Skip,
    Solo,
    Cooperative,
}

impl DecisionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Solo => "solo",
            Self::Cooperative => "cooperative",
        }
    }

    /// Mission kind flown by this decision, if any.
    #[must_use]
    pub const fn mission_kind(self) -> Option<MissionKind> {
        match self {
            Self::Skip => None,
            Self::Solo => Some(MissionKind::Solo),
            Self::Cooperative => Some(MissionKind::Cooperative),
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second step of a convoy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostChoice {
    Pay,
    Freeride,
}

/// A complete, immutable decision for one player and round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub kind: DecisionKind,
    pub paid_cost: bool,
}

impl Decision {
    pub const SKIP: Self = Self {
        kind: DecisionKind::Skip,
        paid_cost: false,
    };
    pub const SOLO: Self = Self {
        kind: DecisionKind::Solo,
        paid_cost: true,
    };
    pub const CONVOY_PAID: Self = Self {
        kind: DecisionKind::Cooperative,
        paid_cost: true,
    };
    pub const FREERIDE: Self = Self {
        kind: DecisionKind::Cooperative,
        paid_cost: false,
    };

    #[must_use]
    pub const fn cooperative(cost: CostChoice) -> Self {
        match cost {
            CostChoice::Pay => Self::CONVOY_PAID,
            CostChoice::Freeride => Self::FREERIDE,
        }
    }

    #[must_use]
    pub const fn is_freeride(self) -> bool {
        matches!(self.kind, DecisionKind::Cooperative) && !self.paid_cost
    }
}

/// Where the collector currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "player", rename_all = "snake_case")]
pub enum CollectorPhase {
    /// Waiting for this player's top-level choice.
    Decision(PlayerId),
    /// Waiting for this player to pay or freeride.
    Cost(PlayerId),
    /// Every player has a decision.
    Complete,
}

/// Reasons a decision is refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("{player} has already decided this round")]
    AlreadyDecided { player: PlayerId },
    #[error("it is not {player}'s turn (waiting on {expected})")]
    OutOfTurn { player: PlayerId, expected: PlayerId },
    #[error("{player} has {credits} credits but the mission costs {cost}")]
    CannotAfford {
        player: PlayerId,
        cost: u32,
        credits: u32,
    },
    #[error("{player} must settle the convoy cost first")]
    AwaitingCost { player: PlayerId },
    #[error("{player} has no convoy cost to settle")]
    NoCostPending { player: PlayerId },
    #[error("{player} is not on the roster")]
    UnknownPlayer { player: PlayerId },
    #[error("every player has already decided this round")]
    RoundClosed,
}

/// Fully materialized decisions for a round, indexed by player id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDecisionSet {
    decisions: Vec<Decision>,
}

impl RoundDecisionSet {
    #[must_use]
    pub fn get(&self, player: PlayerId) -> Decision {
        self.decisions
            .get(player.index())
            .copied()
            .unwrap_or(Decision::SKIP)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, Decision)> + '_ {
        self.decisions
            .iter()
            .enumerate()
            .map(|(idx, decision)| (PlayerId(idx), *decision))
    }

    /// Players who chose `kind`, in roster order.
    #[must_use]
    pub fn participants(&self, kind: DecisionKind) -> Vec<PlayerId> {
        self.iter()
            .filter(|(_, decision)| decision.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    #[must_use]
    pub fn freerider_count(&self) -> u32 {
        let count = self.decisions.iter().filter(|d| d.is_freeride()).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

impl FromIterator<Decision> for RoundDecisionSet {
    fn from_iter<I: IntoIterator<Item = Decision>>(iter: I) -> Self {
        Self {
            decisions: iter.into_iter().collect(),
        }
    }
}

/// Collects exactly one decision per player in roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCollector {
    slots: Vec<Option<Decision>>,
    phase: CollectorPhase,
}

impl DecisionCollector {
    #[must_use]
    pub fn new(roster_len: usize) -> Self {
        let phase = if roster_len == 0 {
            CollectorPhase::Complete
        } else {
            CollectorPhase::Decision(PlayerId(0))
        };
        Self {
            slots: vec![None; roster_len],
            phase,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> CollectorPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, CollectorPhase::Complete)
    }

    /// The player whose input is awaited, if any.
    #[must_use]
    pub const fn active_player(&self) -> Option<PlayerId> {
        match self.phase {
            CollectorPhase::Decision(id) | CollectorPhase::Cost(id) => Some(id),
            CollectorPhase::Complete => None,
        }
    }

    #[must_use]
    pub fn decision_of(&self, player: PlayerId) -> Option<Decision> {
        self.slots.get(player.index()).copied().flatten()
    }

    /// Players still without a decision, in roster order.
    #[must_use]
    pub fn undecided(&self) -> Vec<PlayerId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(idx, _)| PlayerId(idx))
            .collect()
    }

    /// Record the active player's top-level choice.
    ///
    /// `Skip` and `Solo` finish the player's turn; `Cooperative` moves the
    /// collector to the cost step for the same player.
    ///
    /// # Errors
    ///
    /// Returns `DecisionError` when the player already decided, is not the
    /// active player, owes a cost choice, or cannot afford the solo mission.
    pub fn choose(
        &mut self,
        player: &Player,
        kind: DecisionKind,
        missions: &RoundMissions,
    ) -> Result<CollectorPhase, DecisionError> {
        self.check_turn(player.id)?;
        if let CollectorPhase::Cost(pending) = self.phase {
            return Err(DecisionError::AwaitingCost { player: pending });
        }
        match kind {
            DecisionKind::Skip => self.commit(player.id, Decision::SKIP),
            DecisionKind::Solo => {
                ensure_affordable(player, missions, MissionKind::Solo)?;
                self.commit(player.id, Decision::SOLO)
            }
            DecisionKind::Cooperative => {
                debug!("{} is weighing the convoy", player.name);
                self.phase = CollectorPhase::Cost(player.id);
                Ok(self.phase)
            }
        }
    }

    /// Settle the pending convoy cost for the active player.
    ///
    /// # Errors
    ///
    /// Returns `DecisionError` when no cost step is pending for this player or
    /// when paying is chosen without enough credits.
    pub fn settle_cost(
        &mut self,
        player: &Player,
        choice: CostChoice,
        missions: &RoundMissions,
    ) -> Result<CollectorPhase, DecisionError> {
        self.check_turn(player.id)?;
        if self.phase != CollectorPhase::Cost(player.id) {
            return Err(DecisionError::NoCostPending { player: player.id });
        }
        if choice == CostChoice::Pay {
            ensure_affordable(player, missions, MissionKind::Cooperative)?;
        }
        self.commit(player.id, Decision::cooperative(choice))
    }

    /// Record a complete decision for the active player in one step.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::choose`] and [`Self::settle_cost`].
    pub fn record(
        &mut self,
        player: &Player,
        decision: Decision,
        missions: &RoundMissions,
    ) -> Result<CollectorPhase, DecisionError> {
        match decision.kind {
            DecisionKind::Cooperative => {
                let cost = if decision.paid_cost {
                    CostChoice::Pay
                } else {
                    CostChoice::Freeride
                };
                self.check_turn(player.id)?;
                if self.phase == CollectorPhase::Decision(player.id) {
                    if cost == CostChoice::Pay {
                        ensure_affordable(player, missions, MissionKind::Cooperative)?;
                    }
                    self.phase = CollectorPhase::Cost(player.id);
                }
                self.settle_cost(player, cost, missions)
            }
            kind => self.choose(player, kind, missions),
        }
    }

    /// Default every undecided player to an explicit skip.
    pub fn skip_remaining(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                debug!("player #{idx} defaults to skip");
                *slot = Some(Decision::SKIP);
            }
        }
        self.phase = CollectorPhase::Complete;
    }

    /// Snapshot the decisions once every player has one.
    ///
    /// Returns the undecided players otherwise.
    ///
    /// # Errors
    ///
    /// Returns the list of players still missing a decision.
    pub fn decision_set(&self) -> Result<RoundDecisionSet, Vec<PlayerId>> {
        let missing = self.undecided();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(self.slots.iter().map(|slot| slot.unwrap_or(Decision::SKIP)).collect())
    }

    fn check_turn(&self, player: PlayerId) -> Result<(), DecisionError> {
        if player.index() >= self.slots.len() {
            return Err(DecisionError::UnknownPlayer { player });
        }
        if self.slots[player.index()].is_some() {
            return Err(DecisionError::AlreadyDecided { player });
        }
        match self.phase {
            CollectorPhase::Complete => Err(DecisionError::RoundClosed),
            CollectorPhase::Decision(expected) | CollectorPhase::Cost(expected)
                if expected != player =>
            {
                Err(DecisionError::OutOfTurn { player, expected })
            }
            _ => Ok(()),
        }
    }

    fn commit(
        &mut self,
        player: PlayerId,
        decision: Decision,
    ) -> Result<CollectorPhase, DecisionError> {
        self.slots[player.index()] = Some(decision);
        self.phase = self.next_phase(player);
        Ok(self.phase)
    }

    fn next_phase(&self, after: PlayerId) -> CollectorPhase {
        self.slots
            .iter()
            .enumerate()
            .skip(after.index() + 1)
            .find(|(_, slot)| slot.is_none())
            .map_or(CollectorPhase::Complete, |(idx, _)| {
                CollectorPhase::Decision(PlayerId(idx))
            })
    }
}

fn ensure_affordable(
    player: &Player,
    missions: &RoundMissions,
    kind: MissionKind,
) -> Result<(), DecisionError> {
    let cost = missions.mission_for(kind).cost;
    if player.can_afford(cost) {
        Ok(())
    } else {
        Err(DecisionError::CannotAfford {
            player: player.id,
            cost,
            credits: player.credits(),
        })
    }
}
