//! Per-round mission generation.
use log::{debug, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::{GenerationPolicy, MatchConfigError, RuleSet};
use crate::mission::{Mission, MissionArchetype, MissionKind};
use crate::player::Player;

/// The missions on offer for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum RoundMissions {
    /// One job; solo and convoy participants both fly it.
    Single { mission: Mission },
    Dual { solo: Mission, cooperative: Mission },
}

impl RoundMissions {
    /// The mission a participant of `kind` flies this round.
    #[must_use]
    pub const fn mission_for(&self, kind: MissionKind) -> &Mission {
        match (self, kind) {
            (Self::Single { mission }, _) => mission,
            (Self::Dual { solo, .. }, MissionKind::Solo) => solo,
            (Self::Dual { cooperative, .. }, MissionKind::Cooperative) => cooperative,
        }
    }

    #[must_use]
    pub fn missions(&self) -> Vec<&Mission> {
        match self {
            Self::Single { mission } => vec![mission],
            Self::Dual { solo, cooperative } => vec![solo, cooperative],
        }
    }
}

/// Whether someone can afford `mission` and the affordable crew could plausibly beat its risk.
#[must_use]
pub fn is_feasible(mission: &Mission, players: &[Player], die_bonus: u32) -> bool {
    let mut any_affordable = false;
    let mut pooled_skill: u32 = 0;
    for player in players.iter().filter(|p| p.can_afford(mission.cost)) {
        any_affordable = true;
        pooled_skill = pooled_skill.saturating_add(player.skill_level());
    }
    any_affordable && pooled_skill.saturating_add(die_bonus) >= mission.risk_level
}

/// Produce the round's missions under the configured policy.
///
/// # Errors
///
/// Returns `MatchConfigError::EmptyMissionPool` when the single-mission pool has no archetypes.
pub fn generate_round_missions<R: Rng + ?Sized>(
    rules: &RuleSet,
    players: &[Player],
    rng: &mut R,
) -> Result<RoundMissions, MatchConfigError> {
    match &rules.generation {
        GenerationPolicy::SingleBestEffort { pool } => {
            let mission = best_effort_mission(pool, players, rules, rng)
                .ok_or(MatchConfigError::EmptyMissionPool)?;
            Ok(RoundMissions::Single { mission })
        }
        GenerationPolicy::FixedDualSlot { solo, cooperative } => {
            let solo = solo.roll(rng);
            let cooperative = cooperative.roll(rng);
            for mission in [&solo, &cooperative] {
                if !is_feasible(mission, players, rules.feasibility_bonus) {
                    debug!(
                        "{} mission '{}' (risk {}, cost {}) is out of reach this round",
                        mission.kind, mission.name, mission.risk_level, mission.cost
                    );
                }
            }
            Ok(RoundMissions::Dual { solo, cooperative })
        }
    }
}

/// Trial-sample the pool until a feasible mission turns up, up to the attempt cap.
/// Falls back to the last candidate examined so the match never stalls.
fn best_effort_mission<R: Rng + ?Sized>(
    pool: &[MissionArchetype],
    players: &[Player],
    rules: &RuleSet,
    rng: &mut R,
) -> Option<Mission> {
    let mut fallback = None;
    for attempt in 1..=rules.max_generation_attempts.max(1) {
        let mut candidates: Vec<Mission> = pool.iter().map(|archetype| archetype.roll(rng)).collect();
        candidates.shuffle(rng);
        if let Some(pos) = candidates
            .iter()
            .position(|mission| is_feasible(mission, players, rules.feasibility_bonus))
        {
            let mission = candidates.swap_remove(pos);
            debug!(
                "picked '{}' on attempt {attempt} (risk {}, reward {}, cost {})",
                mission.name, mission.risk_level, mission.reward, mission.cost
            );
            return Some(mission);
        }
        fallback = candidates.pop().or(fallback);
    }

    if let Some(mission) = &fallback {
        warn!(
            "no winnable mission after {} attempts; flying '{}' anyway",
            rules.max_generation_attempts, mission.name
        );
    }
    fallback
}
