//! Match setup: roster, victory condition, and rule presets.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::{
    ARMS_RUN_COST, ARMS_RUN_REWARD, ARMS_RUN_RISK, COOP_SLOT_COST, COOP_SLOT_REWARD,
    COOP_SLOT_RISK, CREW_CREDITS_TARGET, CREW_MAX_ROUNDS, DATA_RUN_COST, DATA_RUN_REWARD,
    DATA_RUN_RISK, DEFAULT_CREDITS_TARGET, DEFAULT_DIE_SIDES, DEFAULT_MAX_ROUNDS,
    DEFAULT_STARTING_CREDITS, DEFAULT_STARTING_SKILL, FAILED_RUN_REPAIR, FEASIBILITY_DIE_BONUS,
    FREERIDER_RISK_PENALTY, MAX_GENERATION_ATTEMPTS, MAX_PLAYERS, MEDICINE_RUN_COST,
    MEDICINE_RUN_REWARD, MEDICINE_RUN_RISK, REFUGEE_RUN_COST, REFUGEE_RUN_REWARD,
    REFUGEE_RUN_RISK, SOLO_SLOT_COST, SOLO_SLOT_REWARD, SOLO_SLOT_RISK, SPICE_RUN_COST,
    SPICE_RUN_REWARD, SPICE_RUN_RISK,
};
use crate::mission::{MissionArchetype, MissionKind};
use crate::victory::{VictoryCondition, VictoryKind};

/// Starting values for one roster slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: String,
    #[serde(default = "PlayerSetup::default_skill")]
    pub skill: u32,
    #[serde(default = "PlayerSetup::default_credits")]
    pub credits: u32,
}

impl PlayerSetup {
    #[must_use]
    pub fn new(name: &str, skill: u32, credits: u32) -> Self {
        Self {
            name: name.to_string(),
            skill,
            credits,
        }
    }

    const fn default_skill() -> u32 {
        DEFAULT_STARTING_SKILL
    }

    const fn default_credits() -> u32 {
        DEFAULT_STARTING_CREDITS
    }
}

/// Which mission generation policy a match runs, without its tuning data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    SingleBestEffort,
    FixedDualSlot,
}

impl GenerationMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleBestEffort => "single_best_effort",
            Self::FixedDualSlot => "fixed_dual_slot",
        }
    }

    /// Two-letter prefix used in share codes.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::SingleBestEffort => "SB",
            Self::FixedDualSlot => "DS",
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How each round's missions are produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum GenerationPolicy {
    /// One mission per round, trial-sampled from a pool for winnability.
    SingleBestEffort { pool: Vec<MissionArchetype> },
    /// One solo and one cooperative mission every round.
    FixedDualSlot {
        solo: MissionArchetype,
        cooperative: MissionArchetype,
    },
}

impl GenerationPolicy {
    #[must_use]
    pub const fn mode(&self) -> GenerationMode {
        match self {
            Self::SingleBestEffort { .. } => GenerationMode::SingleBestEffort,
            Self::FixedDualSlot { .. } => GenerationMode::FixedDualSlot,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.mode().as_str()
    }

    fn archetypes(&self) -> Vec<&MissionArchetype> {
        match self {
            Self::SingleBestEffort { pool } => pool.iter().collect(),
            Self::FixedDualSlot { solo, cooperative } => vec![solo, cooperative],
        }
    }
}

/// Tunable rules shared by both prototype variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub generation: GenerationPolicy,
    #[serde(default = "RuleSet::default_die_sides")]
    pub die_sides: u32,
    #[serde(default = "RuleSet::default_freerider_penalty")]
    pub freerider_penalty: u32,
    #[serde(default = "RuleSet::default_max_attempts")]
    pub max_generation_attempts: u32,
    #[serde(default = "RuleSet::default_feasibility_bonus")]
    pub feasibility_bonus: u32,
    #[serde(default)]
    pub skill_growth_on_success: bool,
}

impl RuleSet {
    const fn default_die_sides() -> u32 {
        DEFAULT_DIE_SIDES
    }

    const fn default_freerider_penalty() -> u32 {
        FREERIDER_RISK_PENALTY
    }

    const fn default_max_attempts() -> u32 {
        MAX_GENERATION_ATTEMPTS
    }

    const fn default_feasibility_bonus() -> u32 {
        FEASIBILITY_DIE_BONUS
    }

    /// Single-mission prototype: themed pool, repair bills, skill growth.
    #[must_use]
    pub fn single_best_effort() -> Self {
        let pool = vec![
            MissionArchetype::new(
                "Spice Run",
                MissionKind::Cooperative,
                SPICE_RUN_RISK,
                SPICE_RUN_REWARD,
                SPICE_RUN_COST,
            ),
            MissionArchetype::new(
                "Arms Smuggling",
                MissionKind::Cooperative,
                ARMS_RUN_RISK,
                ARMS_RUN_REWARD,
                ARMS_RUN_COST,
            ),
            MissionArchetype::new(
                "Contraband Medicine",
                MissionKind::Cooperative,
                MEDICINE_RUN_RISK,
                MEDICINE_RUN_REWARD,
                MEDICINE_RUN_COST,
            ),
            MissionArchetype::new(
                "Corporate Data",
                MissionKind::Cooperative,
                DATA_RUN_RISK,
                DATA_RUN_REWARD,
                DATA_RUN_COST,
            ),
            MissionArchetype::new(
                "Political Refugees",
                MissionKind::Cooperative,
                REFUGEE_RUN_RISK,
                REFUGEE_RUN_REWARD,
                REFUGEE_RUN_COST,
            ),
        ]
        .into_iter()
        .map(|archetype| archetype.with_repair_cost(FAILED_RUN_REPAIR))
        .collect();

        Self {
            generation: GenerationPolicy::SingleBestEffort { pool },
            die_sides: DEFAULT_DIE_SIDES,
            freerider_penalty: FREERIDER_RISK_PENALTY,
            max_generation_attempts: MAX_GENERATION_ATTEMPTS,
            feasibility_bonus: FEASIBILITY_DIE_BONUS,
            skill_growth_on_success: true,
        }
    }

    /// Dual-slot prototype: fresh solo and convoy jobs each round, static skill.
    #[must_use]
    pub fn fixed_dual_slot() -> Self {
        Self {
            generation: GenerationPolicy::FixedDualSlot {
                solo: MissionArchetype::new(
                    "Express Delivery",
                    MissionKind::Solo,
                    SOLO_SLOT_RISK,
                    SOLO_SLOT_REWARD,
                    SOLO_SLOT_COST,
                ),
                cooperative: MissionArchetype::new(
                    "Imperial Blockade",
                    MissionKind::Cooperative,
                    COOP_SLOT_RISK,
                    COOP_SLOT_REWARD,
                    COOP_SLOT_COST,
                ),
            },
            die_sides: DEFAULT_DIE_SIDES,
            freerider_penalty: FREERIDER_RISK_PENALTY,
            max_generation_attempts: MAX_GENERATION_ATTEMPTS,
            feasibility_bonus: FEASIBILITY_DIE_BONUS,
            skill_growth_on_success: false,
        }
    }

    /// Preset rules for a generation mode.
    #[must_use]
    pub fn for_mode(mode: GenerationMode) -> Self {
        match mode {
            GenerationMode::SingleBestEffort => Self::single_best_effort(),
            GenerationMode::FixedDualSlot => Self::fixed_dual_slot(),
        }
    }

    fn validate(&self) -> Result<(), MatchConfigError> {
        if self.die_sides < 2 {
            return Err(MatchConfigError::DieTooSmall {
                sides: self.die_sides,
            });
        }
        if self.max_generation_attempts == 0 {
            return Err(MatchConfigError::NoGenerationAttempts);
        }
        let archetypes = self.generation.archetypes();
        if archetypes.is_empty() {
            return Err(MatchConfigError::EmptyMissionPool);
        }
        if let Some(bad) = archetypes.iter().find(|archetype| !archetype.ranges_valid()) {
            return Err(MatchConfigError::InvertedRange {
                archetype: bad.name.clone(),
            });
        }
        if let GenerationPolicy::FixedDualSlot { solo, cooperative } = &self.generation
            && (solo.kind != MissionKind::Solo || cooperative.kind != MissionKind::Cooperative)
        {
            return Err(MatchConfigError::SlotKindMismatch);
        }
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::fixed_dual_slot()
    }
}

/// Everything needed to start a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub players: Vec<PlayerSetup>,
    pub victory: VictoryCondition,
    #[serde(default)]
    pub rules: RuleSet,
}

impl MatchConfig {
    #[must_use]
    pub fn new(players: Vec<PlayerSetup>, victory: VictoryCondition, rules: RuleSet) -> Self {
        Self {
            players,
            victory,
            rules,
        }
    }

    /// Two rookies chasing 100 credits over at most 10 single-mission rounds.
    #[must_use]
    pub fn hangar_defaults() -> Self {
        Self {
            players: vec![
                PlayerSetup::new("Player 1", DEFAULT_STARTING_SKILL, DEFAULT_STARTING_CREDITS),
                PlayerSetup::new("Player 2", DEFAULT_STARTING_SKILL, DEFAULT_STARTING_CREDITS),
            ],
            victory: VictoryCondition {
                kind: VictoryKind::Credits,
                target: DEFAULT_CREDITS_TARGET,
                max_rounds: DEFAULT_MAX_ROUNDS,
            },
            rules: RuleSet::single_best_effort(),
        }
    }

    /// The three-captain crew racing to 200 credits with dual-slot missions.
    #[must_use]
    pub fn crew_defaults() -> Self {
        Self {
            players: vec![
                PlayerSetup::new("Captain Eva", 3, 50),
                PlayerSetup::new("Kael the Pilot", 5, 30),
                PlayerSetup::new("Zorg the Merchant", 1, 70),
            ],
            victory: VictoryCondition {
                kind: VictoryKind::Credits,
                target: CREW_CREDITS_TARGET,
                max_rounds: CREW_MAX_ROUNDS,
            },
            rules: RuleSet::fixed_dual_slot(),
        }
    }

    /// Parse a configuration from JSON without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a `MatchConfig`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check roster, victory, and rule invariants.
    ///
    /// # Errors
    ///
    /// Returns `MatchConfigError` describing the first violated invariant.
    pub fn validate(&self) -> Result<(), MatchConfigError> {
        self.validate_roster()?;
        if self.victory.target == 0 {
            return Err(MatchConfigError::ZeroTarget);
        }
        if self.victory.max_rounds == 0 {
            return Err(MatchConfigError::ZeroRounds);
        }
        self.rules.validate()
    }

    fn validate_roster(&self) -> Result<(), MatchConfigError> {
        if self.players.is_empty() {
            return Err(MatchConfigError::EmptyRoster);
        }
        if self.players.len() > MAX_PLAYERS {
            return Err(MatchConfigError::RosterTooLarge {
                count: self.players.len(),
                max: MAX_PLAYERS,
            });
        }
        let mut seen = HashSet::new();
        for setup in &self.players {
            let name = setup.name.trim();
            if name.is_empty() {
                return Err(MatchConfigError::BlankName);
            }
            if !seen.insert(name.to_string()) {
                return Err(MatchConfigError::DuplicateName {
                    name: name.to_string(),
                });
            }
            if setup.skill == 0 {
                return Err(MatchConfigError::SkillBelowOne {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::hangar_defaults()
    }
}

/// Errors raised when match configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchConfigError {
    #[error("a match needs at least one player")]
    EmptyRoster,
    #[error("roster has {count} players (max {max})")]
    RosterTooLarge { count: usize, max: usize },
    #[error("player names must not be blank")]
    BlankName,
    #[error("player name '{name}' is used more than once")]
    DuplicateName { name: String },
    #[error("player '{name}' must start with skill of at least 1")]
    SkillBelowOne { name: String },
    #[error("victory target must be positive")]
    ZeroTarget,
    #[error("a match must last at least one round")]
    ZeroRounds,
    #[error("die needs at least 2 sides (got {sides})")]
    DieTooSmall { sides: u32 },
    #[error("mission generation needs at least one attempt")]
    NoGenerationAttempts,
    #[error("mission pool is empty")]
    EmptyMissionPool,
    #[error("archetype '{archetype}' has a range whose min exceeds its max")]
    InvertedRange { archetype: String },
    #[error("dual-slot policy needs a solo slot and a cooperative slot")]
    SlotKindMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        MatchConfig::hangar_defaults().validate().unwrap();
        MatchConfig::crew_defaults().validate().unwrap();
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut config = MatchConfig::hangar_defaults();
        config.players[1].name = " Player 1 ".to_string();
        assert_eq!(
            config.validate(),
            Err(MatchConfigError::DuplicateName {
                name: "Player 1".to_string()
            })
        );
    }

    #[test]
    fn rejects_oversized_roster_and_zero_skill() {
        let mut config = MatchConfig::hangar_defaults();
        config.players = (0..7)
            .map(|i| PlayerSetup::new(&format!("P{i}"), 3, 50))
            .collect();
        assert!(matches!(
            config.validate(),
            Err(MatchConfigError::RosterTooLarge { count: 7, .. })
        ));

        let mut config = MatchConfig::hangar_defaults();
        config.players[0].skill = 0;
        assert!(matches!(
            config.validate(),
            Err(MatchConfigError::SkillBelowOne { .. })
        ));
    }

    #[test]
    fn rejects_bad_rules() {
        let mut config = MatchConfig::crew_defaults();
        config.rules.die_sides = 1;
        assert_eq!(
            config.validate(),
            Err(MatchConfigError::DieTooSmall { sides: 1 })
        );

        let mut config = MatchConfig::crew_defaults();
        if let GenerationPolicy::FixedDualSlot { solo, .. } = &mut config.rules.generation {
            solo.kind = MissionKind::Cooperative;
        }
        assert_eq!(config.validate(), Err(MatchConfigError::SlotKindMismatch));
    }

    #[test]
    fn parses_json_with_defaults() {
        let json = r#"{
            "players": [{"name": "Eva"}, {"name": "Kael", "skill": 5, "credits": 30}],
            "victory": {"kind": "quota", "target": 150, "max_rounds": 8}
        }"#;
        let config = MatchConfig::from_json(json).unwrap();
        assert_eq!(config.players[0].skill, DEFAULT_STARTING_SKILL);
        assert_eq!(config.players[0].credits, DEFAULT_STARTING_CREDITS);
        assert_eq!(config.victory.kind, VictoryKind::Quota);
        assert_eq!(config.rules.generation.label(), "fixed_dual_slot");
        config.validate().unwrap();
    }
}
