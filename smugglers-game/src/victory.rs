//! End-of-match detection.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::player::{Player, PlayerId};

/// Which end condition a match plays under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VictoryKind {
    /// First round in which anyone holds the target ends the match.
    Credits,
    /// Always play `max_rounds`; everyone at the target afterwards wins.
    Quota,
}

impl VictoryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credits => "credits",
            Self::Quota => "quota",
        }
    }
}

impl fmt::Display for VictoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryCondition {
    pub kind: VictoryKind,
    pub target: u32,
    /// Quota length; in credits mode, the hard cap on rounds.
    pub max_rounds: u32,
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryReason {
    TargetReached,
    QuotaMet,
    QuotaMissed,
    RoundLimit,
}

impl fmt::Display for VictoryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TargetReached => "target reached",
            Self::QuotaMet => "quota met",
            Self::QuotaMissed => "quota missed",
            Self::RoundLimit => "round limit",
        };
        f.write_str(label)
    }
}

/// Terminal result of a match. An empty winner list is an explicit no-winner outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryOutcome {
    pub winners: Vec<PlayerId>,
    pub reason: VictoryReason,
}

impl VictoryOutcome {
    #[must_use]
    pub fn has_winner(&self) -> bool {
        !self.winners.is_empty()
    }
}

/// Evaluate the end condition after `rounds_completed` rounds.
///
/// Returns `None` while the match continues, including before the first
/// round has been played. Pure over its inputs.
#[must_use]
pub fn check_victory(
    condition: &VictoryCondition,
    players: &[Player],
    rounds_completed: u32,
) -> Option<VictoryOutcome> {
    if rounds_completed == 0 {
        return None;
    }
    let at_target: Vec<PlayerId> = players
        .iter()
        .filter(|player| player.credits() >= condition.target)
        .map(|player| player.id)
        .collect();
    let final_round = rounds_completed >= condition.max_rounds;

    match condition.kind {
        VictoryKind::Credits if !at_target.is_empty() => Some(VictoryOutcome {
            winners: at_target,
            reason: VictoryReason::TargetReached,
        }),
        VictoryKind::Credits if final_round => Some(VictoryOutcome {
            winners: Vec::new(),
            reason: VictoryReason::RoundLimit,
        }),
        VictoryKind::Quota if final_round => {
            let reason = if at_target.is_empty() {
                VictoryReason::QuotaMissed
            } else {
                VictoryReason::QuotaMet
            };
            Some(VictoryOutcome {
                winners: at_target,
                reason,
            })
        }
        _ => None,
    }
}
