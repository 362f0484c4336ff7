use log::{debug, warn};
use smugglers_game::{
    Decision, GenerationMode, MatchConfig, MatchError, MatchReport, MatchSession, MissionKind,
    RuleSet,
};

use crate::logic::policy::{DecisionView, PlayStrategy, PlayerPolicy};

/// Configuration for one simulated match.
///
/// Seat 0 plays the strategy under test; every other seat plays `opponents`.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub mode: GenerationMode,
    pub strategy: PlayStrategy,
    pub opponents: PlayStrategy,
    pub base_config: Option<MatchConfig>,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(mode: GenerationMode, strategy: PlayStrategy, seed: u64) -> Self {
        Self {
            seed,
            mode,
            strategy,
            opponents: PlayStrategy::TeamPlayer,
            base_config: None,
        }
    }

    #[must_use]
    pub fn with_opponents(mut self, opponents: PlayStrategy) -> Self {
        self.opponents = opponents;
        self
    }

    #[must_use]
    pub fn with_base_config(mut self, config: Option<MatchConfig>) -> Self {
        self.base_config = config;
        self
    }

    /// Roster and victory come from the base config or the mode's preset table.
    #[must_use]
    pub fn match_config(&self) -> MatchConfig {
        let mut config = self.base_config.clone().unwrap_or_else(|| match self.mode {
            GenerationMode::SingleBestEffort => MatchConfig::hangar_defaults(),
            GenerationMode::FixedDualSlot => MatchConfig::crew_defaults(),
        });
        if config.rules.generation.mode() != self.mode {
            config.rules = RuleSet::for_mode(self.mode);
        }
        config
    }
}

/// How the seat under test fared in one match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatOutcome {
    pub won: bool,
    pub final_credits: u32,
    pub convoy_runs: usize,
    pub convoy_successes: usize,
    pub freerides: usize,
    pub decisions: usize,
}

impl SeatOutcome {
    fn from_report(report: &MatchReport) -> Self {
        let Some(seat) = report.players.first() else {
            return Self::default();
        };
        let (convoy_runs, convoy_successes) = report
            .mission_results
            .iter()
            .filter(|result| {
                result.kind == MissionKind::Cooperative
                    && result.participants.iter().any(|name| *name == seat.name)
            })
            .fold((0, 0), |(runs, wins), result| {
                (runs + 1, wins + usize::from(result.success))
            });
        Self {
            won: report.outcome.winners.contains(&seat.name),
            final_credits: seat.final_credits,
            convoy_runs,
            convoy_successes,
            freerides: seat.freeride_count,
            decisions: seat.decision_history.len(),
        }
    }
}

/// A finished simulated match.
pub struct SimulationSummary {
    pub seed: u64,
    pub share_code: String,
    pub mode: GenerationMode,
    pub strategy: PlayStrategy,
    pub report: MatchReport,
    pub seat: SeatOutcome,
    pub rejected_decisions: usize,
    pub session: MatchSession,
}

/// Play a full match with scripted policies.
///
/// A policy decision the engine rejects is logged and replaced with a skip.
///
/// # Errors
///
/// Returns the engine error if setup, generation or resolution fails.
pub fn run_match(config: &SimulationConfig) -> Result<SimulationSummary, MatchError> {
    let mut session = MatchSession::new(config.match_config(), config.seed)?;
    let mut policies: Vec<Box<dyn PlayerPolicy + Send>> = (0..session.state().players().len())
        .map(|seat| {
            let strategy = if seat == 0 {
                config.strategy
            } else {
                config.opponents
            };
            let offset = u64::try_from(seat).unwrap_or(u64::MAX);
            strategy.create_policy(config.seed.wrapping_add(offset))
        })
        .collect();
    let mut rejected_decisions = 0;

    while !session.is_finished() {
        let missions = session.generate_round_missions()?.clone();
        while let Some(active) = session.state().active_player() {
            let Some(policy) = policies.get_mut(active.index()) else {
                break;
            };
            let state = session.state();
            let Some(player) = state.player(active) else {
                break;
            };
            let view = DecisionView {
                player,
                missions: &missions,
                rules: &state.config().rules,
                round: state.current_round(),
            };
            let choice = policy.decide(&view);
            debug!(
                "round {}: {} ({}) -> {} [{}]",
                view.round,
                player.name,
                policy.name(),
                choice.decision.kind.as_str(),
                choice.rationale.as_deref().unwrap_or("-")
            );

            if let Err(err) = session.record_decision(active, choice.decision) {
                warn!("{} decision rejected: {err}", policy.name());
                rejected_decisions += 1;
                session.record_decision(active, Decision::SKIP)?;
            }
        }
        session.resolve_round()?;
    }

    let report = session.compile_report()?;
    Ok(SimulationSummary {
        seed: config.seed,
        share_code: session.state().share_code(),
        mode: config.mode,
        strategy: config.strategy,
        seat: SeatOutcome::from_report(&report),
        report,
        rejected_decisions,
        session,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_tables_follow_the_mode() {
        let single =
            SimulationConfig::new(GenerationMode::SingleBestEffort, PlayStrategy::Cautious, 1);
        assert_eq!(single.match_config(), MatchConfig::hangar_defaults());
        let dual =
            SimulationConfig::new(GenerationMode::FixedDualSlot, PlayStrategy::Cautious, 1);
        assert_eq!(dual.match_config(), MatchConfig::crew_defaults());
    }

    #[test]
    fn base_config_keeps_roster_but_takes_mode_rules() {
        let config = SimulationConfig::new(GenerationMode::FixedDualSlot, PlayStrategy::Gambler, 3)
            .with_base_config(Some(MatchConfig::hangar_defaults()))
            .match_config();
        assert_eq!(config.players, MatchConfig::hangar_defaults().players);
        assert_eq!(config.rules, RuleSet::fixed_dual_slot());
    }

    #[test]
    fn every_strategy_finishes_a_match() {
        for mode in [GenerationMode::SingleBestEffort, GenerationMode::FixedDualSlot] {
            for strategy in PlayStrategy::ALL {
                let config = SimulationConfig::new(mode, strategy, 2024)
                    .with_opponents(PlayStrategy::Gambler);
                let summary = run_match(&config).unwrap();
                assert!(summary.session.is_finished());
                assert_eq!(summary.rejected_decisions, 0);
                assert_eq!(
                    summary.seat.decisions,
                    usize::try_from(summary.report.game_summary.total_rounds).unwrap()
                );
                assert!(summary.seat.convoy_successes <= summary.seat.convoy_runs);
            }
        }
    }

    #[test]
    fn replaying_a_seed_is_deterministic() {
        let config =
            SimulationConfig::new(GenerationMode::FixedDualSlot, PlayStrategy::Gambler, 11)
                .with_opponents(PlayStrategy::Gambler);
        let first = run_match(&config).unwrap();
        let second = run_match(&config).unwrap();
        assert_eq!(first.session.state(), second.session.state());
        assert_eq!(first.seat, second.seat);
    }

    #[test]
    fn freeriders_alone_never_pay() {
        let config =
            SimulationConfig::new(GenerationMode::FixedDualSlot, PlayStrategy::Freerider, 5)
                .with_opponents(PlayStrategy::Freerider);
        let summary = run_match(&config).unwrap();
        let seat = &summary.report.players[0];
        assert_eq!(seat.freeride_count, seat.decision_history.len());
        assert!(
            summary
                .report
                .mission_results
                .iter()
                .all(|result| result.freeriders == 3)
        );
    }
}
