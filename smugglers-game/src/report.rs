//! End-of-match report compilation.
//!
//! Field names of the serialized report are consumed by existing tooling and
//! must stay stable.
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::decisions::DecisionKind;
use crate::error::MatchError;
use crate::player::{DecisionRecord, Player};
use crate::resolution::MissionResult;
use crate::state::MatchState;
use crate::victory::{VictoryKind, VictoryReason};

/// Match-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub total_rounds: u32,
    pub victory_condition: VictoryKind,
    pub victory_target: u32,
    pub max_rounds: u32,
    pub generation_policy: String,
    pub seed: u64,
    pub share_code: String,
    /// RFC 3339 compilation time.
    pub timestamp: String,
}

/// Final statistics for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub name: String,
    pub initial_credits: u32,
    pub final_credits: u32,
    pub credit_change: i64,
    pub initial_skill: u32,
    pub skill_level: u32,
    pub missions_completed: u32,
    pub missions_failed: u32,
    pub solo_missions: usize,
    pub cooperative_missions: usize,
    pub skip_count: usize,
    pub freeride_count: usize,
    /// Balance after every individual credit mutation, starting balance first.
    pub credit_history: Vec<u32>,
    /// Balance at the end of each round, starting balance first.
    pub round_credits: Vec<u32>,
    pub decision_history: Vec<DecisionRecord>,
}

impl PlayerReport {
    #[must_use]
    pub fn from_player(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            initial_credits: player.initial_credits(),
            final_credits: player.credits(),
            credit_change: player.net_change(),
            initial_skill: player.initial_skill(),
            skill_level: player.skill_level(),
            missions_completed: player.missions_completed(),
            missions_failed: player.missions_failed(),
            solo_missions: player.count_decisions(DecisionKind::Solo),
            cooperative_missions: player.count_decisions(DecisionKind::Cooperative),
            skip_count: player.count_decisions(DecisionKind::Skip),
            freeride_count: player.freeride_count(),
            credit_history: player.credit_history().to_vec(),
            round_credits: round_credits(player),
            decision_history: player.decision_history().to_vec(),
        }
    }
}

fn round_credits(player: &Player) -> Vec<u32> {
    let mut balance = i64::from(player.initial_credits());
    let mut column = Vec::with_capacity(player.decision_history().len() + 1);
    column.push(player.initial_credits());
    for record in player.decision_history() {
        balance = (balance + record.credit_change).max(0);
        column.push(u32::try_from(balance).unwrap_or(u32::MAX));
    }
    column
}

/// One line of the final standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Competition rank: tied balances share a rank and the next rank is skipped.
    pub rank: usize,
    pub name: String,
    pub credits: u32,
    pub winner: bool,
}

/// How the match ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeReport {
    pub reason: VictoryReason,
    /// Empty when nobody won.
    pub winners: Vec<String>,
}

/// Structured summary of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub game_summary: GameSummary,
    pub players: Vec<PlayerReport>,
    pub mission_results: Vec<MissionResult>,
    pub outcome: OutcomeReport,
    pub rankings: Vec<Standing>,
}

impl MatchReport {
    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn player(&self, name: &str) -> Option<&PlayerReport> {
        self.players.iter().find(|player| player.name == name)
    }
}

/// Build the report for a finished match. Reads state only.
///
/// # Errors
///
/// Returns `MatchError::InvalidReportRequest` unless the match has ended.
pub fn compile_report(state: &MatchState, at: DateTime<Utc>) -> Result<MatchReport, MatchError> {
    let outcome = state.outcome().ok_or(MatchError::InvalidReportRequest)?;
    let winners: Vec<String> = outcome
        .winners
        .iter()
        .filter_map(|id| state.player(*id))
        .map(|player| player.name.clone())
        .collect();
    let config = state.config();

    Ok(MatchReport {
        game_summary: GameSummary {
            total_rounds: state.rounds_completed(),
            victory_condition: config.victory.kind,
            victory_target: config.victory.target,
            max_rounds: config.victory.max_rounds,
            generation_policy: config.rules.generation.label().to_string(),
            seed: state.seed(),
            share_code: state.share_code(),
            timestamp: format_timestamp(at),
        },
        players: state.players().iter().map(PlayerReport::from_player).collect(),
        mission_results: state.mission_results().to_vec(),
        rankings: rank_players(state.players(), &winners),
        outcome: OutcomeReport {
            reason: outcome.reason,
            winners,
        },
    })
}

/// Rank players by final credits, highest first, ties sharing a rank.
#[must_use]
pub fn rank_players(players: &[Player], winners: &[String]) -> Vec<Standing> {
    let mut order: Vec<&Player> = players.iter().collect();
    order.sort_by(|a, b| b.credits().cmp(&a.credits()).then(a.id.cmp(&b.id)));

    let mut standings: Vec<Standing> = Vec::with_capacity(order.len());
    for (position, player) in order.into_iter().enumerate() {
        let rank = match standings.last() {
            Some(previous) if previous.credits == player.credits() => previous.rank,
            _ => position + 1,
        };
        standings.push(Standing {
            rank,
            name: player.name.clone(),
            credits: player.credits(),
            winner: winners.contains(&player.name),
        });
    }
    standings
}

/// Format a compilation instant the way reports store it.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;

    fn with_balance(idx: usize, credits: u32) -> Player {
        Player::new(PlayerId(idx), format!("P{idx}"), 3, credits)
    }

    #[test]
    fn rankings_share_rank_on_ties() {
        let players = vec![
            with_balance(0, 80),
            with_balance(1, 120),
            with_balance(2, 80),
            with_balance(3, 10),
        ];
        let standings = rank_players(&players, &["P1".to_string()]);
        let ranks: Vec<(usize, &str)> = standings
            .iter()
            .map(|s| (s.rank, s.name.as_str()))
            .collect();
        assert_eq!(ranks, vec![(1, "P1"), (2, "P0"), (2, "P2"), (4, "P3")]);
        assert!(standings[0].winner);
        assert!(!standings[1].winner);
    }

    #[test]
    fn round_credits_follow_history_deltas() {
        let mut player = with_balance(0, 50);
        for (round, change) in [(1, -5_i64), (2, 15), (3, 0)] {
            if change < 0 {
                player.subtract_credits(change.unsigned_abs() as u32);
            } else if change > 0 {
                player.add_credits(change as u32);
            }
            player.record_decision(DecisionRecord {
                round,
                decision: if change == 0 {
                    DecisionKind::Skip
                } else {
                    DecisionKind::Solo
                },
                paid_cost: change != 0,
                credit_change: change,
            });
        }
        let report = PlayerReport::from_player(&player);
        assert_eq!(report.round_credits, vec![50, 45, 60, 60]);
        assert_eq!(report.credit_history, vec![50, 45, 60]);
        assert_eq!(report.skip_count, 1);
        assert_eq!(report.solo_missions, 2);
        assert_eq!(report.credit_change, 10);
    }

    #[test]
    fn timestamps_use_rfc3339_utc() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(at), "2024-05-01T12:30:00Z");
    }
}
