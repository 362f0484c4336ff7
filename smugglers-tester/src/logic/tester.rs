use colored::Colorize;
use serde::{Deserialize, Serialize};
use smugglers_game::numbers::{mean, ratio};
use smugglers_game::{GameEngine, GenerationMode, MatchConfig, MatchReport};
use std::time::{Duration, Instant};

use crate::logic::policy::PlayStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{SimulationConfig, SimulationSummary, run_match};
use crate::logic::storage::JsonFileStorage;

/// One simulated match, flattened for CSV output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub strategy: String,
    pub policy: GenerationMode,
    pub seed_code: String,
    pub seed: u64,
    pub rounds: u32,
    pub won: bool,
    pub outcome: String,
    pub final_credits: u32,
    pub convoy_runs: usize,
    pub convoy_successes: usize,
    pub freerides: usize,
    pub decisions: usize,
}

impl MatchRecord {
    fn from_summary(summary: &SimulationSummary) -> Self {
        Self {
            strategy: summary.strategy.label().to_string(),
            policy: summary.mode,
            seed_code: summary.share_code.clone(),
            seed: summary.seed,
            rounds: summary.report.game_summary.total_rounds,
            won: summary.seat.won,
            outcome: summary.report.outcome.reason.to_string(),
            final_credits: summary.seat.final_credits,
            convoy_runs: summary.seat.convoy_runs,
            convoy_successes: summary.seat.convoy_successes,
            freerides: summary.seat.freerides,
            decisions: summary.seat.decisions,
        }
    }
}

/// Aggregates for the seat under test across all of a strategy's matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyStats {
    pub matches: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub mean_rounds: f64,
    pub mean_final_credits: f64,
    pub convoy_success_rate: f64,
    pub freeride_share: f64,
}

impl StrategyStats {
    #[must_use]
    pub fn from_records(records: &[MatchRecord]) -> Self {
        let wins = records.iter().filter(|r| r.won).count();
        let rounds: Vec<f64> = records.iter().map(|r| f64::from(r.rounds)).collect();
        let credits: Vec<f64> = records.iter().map(|r| f64::from(r.final_credits)).collect();
        let convoy_runs = records.iter().map(|r| r.convoy_runs).sum();
        let convoy_successes = records.iter().map(|r| r.convoy_successes).sum();
        let freerides = records.iter().map(|r| r.freerides).sum();
        let decisions = records.iter().map(|r| r.decisions).sum();
        Self {
            matches: records.len(),
            wins,
            win_rate: ratio(wins, records.len()),
            mean_rounds: mean(&rounds),
            mean_final_credits: mean(&credits),
            convoy_success_rate: ratio(convoy_successes, convoy_runs),
            freeride_share: ratio(freerides, decisions),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    pub stats: StrategyStats,
}

pub struct LogicTester {
    verbose: bool,
    mode: GenerationMode,
    opponents: PlayStrategy,
    base_config: Option<MatchConfig>,
    engine: Option<GameEngine<JsonFileStorage>>,
}

impl LogicTester {
    pub const fn new(verbose: bool, mode: GenerationMode, opponents: PlayStrategy) -> Self {
        Self {
            verbose,
            mode,
            opponents,
            base_config: None,
            engine: None,
        }
    }

    #[must_use]
    pub fn with_base_config(mut self, config: Option<MatchConfig>) -> Self {
        self.base_config = config;
        self
    }

    /// Save every finished match report through `storage`.
    #[must_use]
    pub fn with_report_storage(mut self, storage: Option<JsonFileStorage>) -> Self {
        self.engine = storage.map(GameEngine::new);
        self
    }

    /// Play `iterations` matches per seed with `strategy` in seat 0.
    pub fn run_strategy(
        &self,
        strategy: PlayStrategy,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> (StrategyResult, Vec<MatchRecord>) {
        if self.verbose {
            println!(
                "🧪 Testing strategy: {} (opponents: {})",
                strategy.label().bright_white(),
                self.opponents
            );
        }

        let mut records = Vec::new();
        let mut failures = Vec::new();
        let mut durations = Vec::new();
        let mut iterations_run = 0;

        for seed_info in seeds {
            let mode = seed_info.mode_or(self.mode);
            for i in 0..iterations {
                iterations_run += 1;
                let offset = u64::try_from(i).unwrap_or(u64::MAX);
                let seed = seed_info.seed.wrapping_add(offset);
                let config = SimulationConfig::new(mode, strategy, seed)
                    .with_opponents(self.opponents)
                    .with_base_config(self.base_config.clone());

                let start_time = Instant::now();
                let outcome = run_match(&config)
                    .map_err(|err| err.to_string())
                    .and_then(|summary| {
                        if let Some(code) = seed_info.code.as_deref()
                            && i == 0
                            && summary.share_code != code
                        {
                            return Err(format!(
                                "share code {code} replayed as {}",
                                summary.share_code
                            ));
                        }
                        check_match_invariants(&summary.report)?;
                        self.persist(&summary)?;
                        Ok(summary)
                    });

                match outcome {
                    Ok(summary) => {
                        let duration = start_time.elapsed();
                        durations.push(duration);
                        let record = MatchRecord::from_summary(&summary);
                        if self.verbose {
                            println!(
                                "  ✅ {} seed {} ({}) rounds:{} won:{} credits:{} rejected:{} ({duration:?})",
                                strategy.label(),
                                record.seed,
                                record.seed_code,
                                record.rounds,
                                record.won,
                                record.final_credits,
                                summary.rejected_decisions
                            );
                        }
                        records.push(record);
                    }
                    Err(err) => {
                        if self.verbose {
                            println!("  ❌ seed {}: {}", config.seed, err.as_str().red());
                        }
                        failures.push(format!(
                            "Iteration {} (policy {}, strategy {}, seed {}): {err}",
                            i + 1,
                            mode,
                            strategy.label(),
                            config.seed
                        ));
                    }
                }
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        let result = StrategyResult {
            strategy_name: strategy.label().to_string(),
            passed: failures.is_empty(),
            iterations_run,
            successful_iterations: records.len(),
            failures,
            average_duration,
            stats: StrategyStats::from_records(&records),
        };
        (result, records)
    }

    fn persist(&self, summary: &SimulationSummary) -> Result<(), String> {
        let Some(engine) = &self.engine else {
            return Ok(());
        };
        let name = engine
            .save_report(&summary.session)
            .map_err(|err| err.to_string())?;
        log::info!(
            "saved report {}",
            engine.storage().dir().join(name).display()
        );
        Ok(())
    }
}

/// Cross-check a finished report against the engine's economic invariants.
///
/// # Errors
///
/// Returns a description of the first violated invariant.
pub fn check_match_invariants(report: &MatchReport) -> Result<(), String> {
    let summary = &report.game_summary;
    if summary.total_rounds == 0 || summary.total_rounds > summary.max_rounds {
        return Err(format!(
            "played {} rounds with a cap of {}",
            summary.total_rounds, summary.max_rounds
        ));
    }
    for player in &report.players {
        let delta_sum: i64 = player
            .decision_history
            .iter()
            .map(|record| record.credit_change)
            .sum();
        if delta_sum != player.credit_change {
            return Err(format!(
                "{}: history sums to {delta_sum}, net change is {}",
                player.name, player.credit_change
            ));
        }
        if player.round_credits.last() != Some(&player.final_credits)
            || player.credit_history.last() != Some(&player.final_credits)
        {
            return Err(format!("{}: credit history ends off balance", player.name));
        }
        if player.skill_level == 0 {
            return Err(format!("{}: skill fell below 1", player.name));
        }
        if player.decision_history.len() != usize::try_from(summary.total_rounds).unwrap_or(0) {
            return Err(format!(
                "{}: {} decisions over {} rounds",
                player.name,
                player.decision_history.len(),
                summary.total_rounds
            ));
        }
    }
    for result in &report.mission_results {
        if result.success != (result.total_result >= result.risk_level) {
            return Err(format!(
                "round {} '{}': success flag disagrees with the roll",
                result.round, result.mission_name
            ));
        }
        if result.participants.is_empty() {
            return Err(format!("round {}: mission flown by nobody", result.round));
        }
        if result.reward_per_player.is_some() != result.success
            || (result.success && result.repair_cost.is_some())
        {
            return Err(format!(
                "round {} '{}': payout does not match the outcome",
                result.round, result.mission_name
            ));
        }
    }
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::seeds::SeedInfo;

    fn record(won: bool, rounds: u32, convoy: (usize, usize), freerides: usize) -> MatchRecord {
        MatchRecord {
            strategy: "Gambler".to_string(),
            policy: GenerationMode::FixedDualSlot,
            seed_code: "DS-CONVOY12".to_string(),
            seed: 12,
            rounds,
            won,
            outcome: "target reached".to_string(),
            final_credits: 100,
            convoy_runs: convoy.0,
            convoy_successes: convoy.1,
            freerides,
            decisions: usize::try_from(rounds).unwrap(),
        }
    }

    #[test]
    fn stats_aggregate_rates() {
        let stats = StrategyStats::from_records(&[
            record(true, 10, (4, 3), 2),
            record(false, 30, (0, 0), 8),
        ]);
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.wins, 1);
        assert!((stats.win_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.mean_rounds - 20.0).abs() < f64::EPSILON);
        assert!((stats.convoy_success_rate - 0.75).abs() < f64::EPSILON);
        assert!((stats.freeride_share - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_records_yield_zeroed_stats() {
        let stats = StrategyStats::from_records(&[]);
        assert_eq!(stats.matches, 0);
        assert!(stats.win_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn runs_every_iteration_for_every_seed() {
        let tester =
            LogicTester::new(false, GenerationMode::SingleBestEffort, PlayStrategy::Gambler);
        let seeds = vec![SeedInfo::from_numeric(1), SeedInfo::from_numeric(99)];
        let (result, records) = tester.run_strategy(PlayStrategy::TeamPlayer, &seeds, 3);
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.iterations_run, 6);
        assert_eq!(records.len(), 6);
        assert!(
            records
                .iter()
                .all(|r| r.policy == GenerationMode::SingleBestEffort)
        );
    }

    #[test]
    fn share_code_seeds_pick_their_own_policy() {
        let (mode, seed) = smugglers_game::parse_share_code("DS-CONVOY12").unwrap();
        let seeds = vec![SeedInfo::from_share_code(seed, mode, "DS-CONVOY12".to_string())];
        let tester =
            LogicTester::new(false, GenerationMode::SingleBestEffort, PlayStrategy::Cautious);
        let (_, records) = tester.run_strategy(PlayStrategy::BoldSolo, &seeds, 1);
        assert_eq!(records[0].policy, GenerationMode::FixedDualSlot);
        assert_eq!(records[0].seed_code, "DS-CONVOY12");
    }

    #[test]
    fn invariant_check_flags_tampered_reports() {
        let config =
            SimulationConfig::new(GenerationMode::FixedDualSlot, PlayStrategy::BoldSolo, 8);
        let mut report = run_match(&config).unwrap().report;
        assert!(check_match_invariants(&report).is_ok());
        report.players[0].credit_change += 1;
        assert!(check_match_invariants(&report).is_err());
    }
}
