//! Round resolution: costs, dice, payouts and history.
use log::{debug, info};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::RuleSet;
use crate::decisions::{DecisionKind, RoundDecisionSet};
use crate::generator::RoundMissions;
use crate::mission::{Mission, MissionKind};
use crate::player::{DecisionRecord, Player, PlayerId};
use crate::rng::DiceSource;
use crate::victory::VictoryOutcome;

/// Outcome record for one flown mission.
///
/// Convoys produce one record per round; each solo pilot produces their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionResult {
    pub round: u32,
    pub mission_name: String,
    pub kind: MissionKind,
    pub success: bool,
    pub dice_roll: u32,
    pub total_skill: u32,
    pub total_result: u32,
    /// Threshold the roll was compared against, freerider penalty included.
    pub risk_level: u32,
    pub base_risk: u32,
    pub freeriders: u32,
    pub participants: SmallVec<[String; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_per_player: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_cost: Option<u32>,
}

/// Everything that happened in one resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: u32,
    pub missions: Vec<MissionResult>,
    /// Net credit movement per player, indexed by roster position.
    pub credit_changes: Vec<i64>,
    /// Set when this round ended the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VictoryOutcome>,
}

/// Apply a complete decision set to the roster.
///
/// The convoy resolves first, then each solo pilot in roster order. Every
/// player receives exactly one history entry whose delta is the actual change
/// in their balance, so clamped losses keep the history summing to the net change.
pub fn resolve_round<D: DiceSource + ?Sized>(
    players: &mut [Player],
    missions: &RoundMissions,
    decisions: &RoundDecisionSet,
    rules: &RuleSet,
    round: u32,
    dice: &mut D,
) -> RoundResult {
    let opening: Vec<u32> = players.iter().map(Player::credits).collect();
    let mut results = Vec::new();

    let convoy: Vec<PlayerId> = decisions
        .participants(DecisionKind::Cooperative)
        .into_iter()
        .filter(|id| id.index() < players.len())
        .collect();
    if convoy.is_empty() {
        debug!("round {round}: no convoy this round");
    } else {
        let mission = missions.mission_for(MissionKind::Cooperative);
        results.push(fly_convoy(players, mission, &convoy, decisions, rules, round, dice));
    }

    let mission = missions.mission_for(MissionKind::Solo);
    for id in decisions.participants(DecisionKind::Solo) {
        if id.index() < players.len() {
            results.push(fly_solo(players, mission, id, rules, round, dice));
        }
    }

    let credit_changes = players
        .iter_mut()
        .zip(&opening)
        .map(|(player, &start)| {
            let decision = decisions.get(player.id);
            let change = i64::from(player.credits()) - i64::from(start);
            player.record_decision(DecisionRecord {
                round,
                decision: decision.kind,
                paid_cost: decision.paid_cost,
                credit_change: change,
            });
            change
        })
        .collect();

    RoundResult {
        round,
        missions: results,
        credit_changes,
        outcome: None,
    }
}

fn fly_convoy<D: DiceSource + ?Sized>(
    players: &mut [Player],
    mission: &Mission,
    convoy: &[PlayerId],
    decisions: &RoundDecisionSet,
    rules: &RuleSet,
    round: u32,
    dice: &mut D,
) -> MissionResult {
    let freeriders = u32::try_from(
        convoy
            .iter()
            .filter(|id| decisions.get(**id).is_freeride())
            .count(),
    )
    .unwrap_or(u32::MAX);
    let risk = mission.effective_risk(MissionKind::Cooperative, freeriders, rules.freerider_penalty);

    for id in convoy {
        if decisions.get(*id).paid_cost {
            players[id.index()].subtract_credits(mission.cost);
        }
    }

    let total_skill = convoy
        .iter()
        .map(|id| players[id.index()].skill_level())
        .fold(0_u32, u32::saturating_add);
    let dice_roll = dice.roll_die(rules.die_sides);
    let total_result = total_skill.saturating_add(dice_roll);
    let success = total_result >= risk;
    info!(
        "round {round}: convoy '{}' skill {total_skill} + die {dice_roll} = {total_result} vs risk {risk} ({} freeriders): {}",
        mission.name,
        freeriders,
        if success { "success" } else { "failure" }
    );

    let crew_size = u32::try_from(convoy.len()).unwrap_or(u32::MAX);
    let (reward_per_player, repair_cost) = settle(
        players,
        convoy,
        mission,
        success,
        mission.reward_share(crew_size),
        rules,
        dice,
    );

    MissionResult {
        round,
        mission_name: mission.name.clone(),
        kind: MissionKind::Cooperative,
        success,
        dice_roll,
        total_skill,
        total_result,
        risk_level: risk,
        base_risk: mission.risk_level,
        freeriders,
        participants: convoy
            .iter()
            .map(|id| players[id.index()].name.clone())
            .collect(),
        reward_per_player,
        repair_cost,
    }
}

fn fly_solo<D: DiceSource + ?Sized>(
    players: &mut [Player],
    mission: &Mission,
    pilot: PlayerId,
    rules: &RuleSet,
    round: u32,
    dice: &mut D,
) -> MissionResult {
    let risk = mission.effective_risk(MissionKind::Solo, 0, rules.freerider_penalty);
    players[pilot.index()].subtract_credits(mission.cost);

    let total_skill = players[pilot.index()].skill_level();
    let dice_roll = dice.roll_die(rules.die_sides);
    let total_result = total_skill.saturating_add(dice_roll);
    let success = total_result >= risk;
    info!(
        "round {round}: {} solo on '{}' skill {total_skill} + die {dice_roll} = {total_result} vs risk {risk}: {}",
        players[pilot.index()].name,
        mission.name,
        if success { "success" } else { "failure" }
    );

    let (reward_per_player, repair_cost) = settle(
        players,
        &[pilot],
        mission,
        success,
        mission.reward,
        rules,
        dice,
    );

    MissionResult {
        round,
        mission_name: mission.name.clone(),
        kind: MissionKind::Solo,
        success,
        dice_roll,
        total_skill,
        total_result,
        risk_level: risk,
        base_risk: mission.risk_level,
        freeriders: 0,
        participants: std::iter::once(players[pilot.index()].name.clone()).collect(),
        reward_per_player,
        repair_cost,
    }
}

/// Pay out a success or charge a failure to every participant.
///
/// Returns `(reward_per_player, repair_cost)` for the result record.
fn settle<D: DiceSource + ?Sized>(
    players: &mut [Player],
    participants: &[PlayerId],
    mission: &Mission,
    success: bool,
    share: u32,
    rules: &RuleSet,
    dice: &mut D,
) -> (Option<u32>, Option<u32>) {
    if success {
        for id in participants {
            let player = &mut players[id.index()];
            player.add_credits(share);
            player.mark_completed();
            if rules.skill_growth_on_success {
                player.adjust_skill(1);
            }
        }
        return (Some(share), None);
    }

    let repair = mission.repair_cost.map(|range| dice.roll_repair(range));
    for id in participants {
        let player = &mut players[id.index()];
        if let Some(amount) = repair {
            player.subtract_credits(amount);
        }
        player.mark_failed();
    }
    if let Some(amount) = repair {
        debug!("'{}' failed; repairs cost {amount} each", mission.name);
    }
    (None, repair)
}
