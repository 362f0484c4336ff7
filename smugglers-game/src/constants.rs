//! Centralized balance and tuning constants for Galaxy Smugglers.
//!
//! These values define the deterministic math for the rules engine.
//! Presets in [`crate::config::RuleSet`] are built from them, so balance
//! changes go through code review rather than external assets.

// Dice ---------------------------------------------------------------------
pub const DEFAULT_DIE_SIDES: u32 = 6;

// Cooperative missions -----------------------------------------------------
pub const FREERIDER_RISK_PENALTY: u32 = 3;

// Mission generation -------------------------------------------------------
pub const MAX_GENERATION_ATTEMPTS: u32 = 10;
/// Best face of the die, added to pooled skill when judging whether a mission is winnable.
pub const FEASIBILITY_DIE_BONUS: u32 = DEFAULT_DIE_SIDES;

// Single best-effort pool (risk, reward, cost ranges) -----------------------
pub const SPICE_RUN_RISK: (u32, u32) = (8, 12);
pub const SPICE_RUN_REWARD: (u32, u32) = (30, 50);
pub const SPICE_RUN_COST: (u32, u32) = (6, 10);
pub const ARMS_RUN_RISK: (u32, u32) = (10, 15);
pub const ARMS_RUN_REWARD: (u32, u32) = (40, 70);
pub const ARMS_RUN_COST: (u32, u32) = (8, 14);
pub const MEDICINE_RUN_RISK: (u32, u32) = (12, 18);
pub const MEDICINE_RUN_REWARD: (u32, u32) = (50, 80);
pub const MEDICINE_RUN_COST: (u32, u32) = (10, 16);
pub const DATA_RUN_RISK: (u32, u32) = (6, 10);
pub const DATA_RUN_REWARD: (u32, u32) = (20, 40);
pub const DATA_RUN_COST: (u32, u32) = (4, 8);
pub const REFUGEE_RUN_RISK: (u32, u32) = (14, 20);
pub const REFUGEE_RUN_REWARD: (u32, u32) = (60, 100);
pub const REFUGEE_RUN_COST: (u32, u32) = (12, 20);
pub const FAILED_RUN_REPAIR: (u32, u32) = (10, 25);

// Fixed dual-slot pool -----------------------------------------------------
pub const SOLO_SLOT_RISK: (u32, u32) = (5, 10);
pub const SOLO_SLOT_REWARD: (u32, u32) = (15, 30);
pub const SOLO_SLOT_COST: (u32, u32) = (3, 7);
pub const COOP_SLOT_RISK: (u32, u32) = (10, 20);
pub const COOP_SLOT_REWARD: (u32, u32) = (40, 80);
pub const COOP_SLOT_COST: (u32, u32) = (8, 15);

// Match setup --------------------------------------------------------------
pub const MAX_PLAYERS: usize = 6;
pub const DEFAULT_STARTING_SKILL: u32 = 3;
pub const DEFAULT_STARTING_CREDITS: u32 = 50;
pub const DEFAULT_CREDITS_TARGET: u32 = 100;
pub const DEFAULT_MAX_ROUNDS: u32 = 10;
pub const CREW_CREDITS_TARGET: u32 = 200;
/// The crew preset plays until someone hits the target; this cap only guards runaway matches.
pub const CREW_MAX_ROUNDS: u32 = 500;
