//! Serializable match state and its round lifecycle.
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::decisions::{
    CollectorPhase, CostChoice, Decision, DecisionCollector, DecisionError, DecisionKind,
};
use crate::error::MatchError;
use crate::generator::RoundMissions;
use crate::player::{Player, PlayerId};
use crate::report::{self, MatchReport};
use crate::resolution::{self, MissionResult, RoundResult};
use crate::rng::DiceSource;
use crate::seed::encode_friendly;
use crate::victory::{self, VictoryOutcome};

/// Where the match is in its round cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Between rounds; the next round's missions have not been offered yet.
    AwaitingMissions,
    /// Missions are on offer and players are deciding.
    CollectingDecisions,
    /// A victory condition fired. Only reporting remains.
    Finished,
}

/// Complete state of one match.
///
/// Players are only mutated by round resolution; every other operation either
/// validates and records a decision or reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    config: MatchConfig,
    seed: u64,
    players: Vec<Player>,
    rounds_completed: u32,
    phase: MatchPhase,
    missions: Option<RoundMissions>,
    collector: Option<DecisionCollector>,
    mission_results: Vec<MissionResult>,
    outcome: Option<VictoryOutcome>,
}

impl MatchState {
    /// Validate `config` and seat the roster.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Config` when the configuration is invalid.
    pub fn setup(config: MatchConfig, seed: u64) -> Result<Self, MatchError> {
        config.validate()?;
        let players = config
            .players
            .iter()
            .enumerate()
            .map(|(idx, setup)| {
                Player::new(PlayerId(idx), setup.name.trim(), setup.skill, setup.credits)
            })
            .collect();
        info!(
            "match set up: {} players, {} to {} credits, {} rules, seed {seed}",
            config.players.len(),
            config.victory.kind,
            config.victory.target,
            config.rules.generation.label()
        );
        Ok(Self {
            config,
            seed,
            players,
            rounds_completed: 0,
            phase: MatchPhase::AwaitingMissions,
            missions: None,
            collector: None,
            mission_results: Vec::new(),
            outcome: None,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Share code for this match's seed and generation policy.
    #[must_use]
    pub fn share_code(&self) -> String {
        encode_friendly(self.config.rules.generation.mode(), self.seed)
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    #[must_use]
    pub const fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    /// Number of the round in progress, or of the next one to open.
    #[must_use]
    pub const fn current_round(&self) -> u32 {
        self.rounds_completed.saturating_add(1)
    }

    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, MatchPhase::Finished)
    }

    /// Missions on offer in the open round.
    #[must_use]
    pub const fn missions(&self) -> Option<&RoundMissions> {
        self.missions.as_ref()
    }

    #[must_use]
    pub const fn collector(&self) -> Option<&DecisionCollector> {
        self.collector.as_ref()
    }

    /// Player whose input the open round is waiting on.
    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        self.collector.as_ref().and_then(DecisionCollector::active_player)
    }

    #[must_use]
    pub fn mission_results(&self) -> &[MissionResult] {
        &self.mission_results
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&VictoryOutcome> {
        self.outcome.as_ref()
    }

    /// Offer `missions` for the next round and start collecting decisions.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::MatchFinished` after the match ended and
    /// `MatchError::RoundInProgress` while another round is open.
    pub fn open_round(&mut self, missions: RoundMissions) -> Result<&RoundMissions, MatchError> {
        match self.phase {
            MatchPhase::Finished => return Err(MatchError::MatchFinished),
            MatchPhase::CollectingDecisions => return Err(MatchError::RoundInProgress),
            MatchPhase::AwaitingMissions => {}
        }
        for mission in missions.missions() {
            info!(
                "round {}: {} mission '{}' risk {} reward {} cost {}",
                self.current_round(),
                mission.kind,
                mission.name,
                mission.risk_level,
                mission.reward,
                mission.cost
            );
        }
        self.collector = Some(DecisionCollector::new(self.players.len()));
        self.phase = MatchPhase::CollectingDecisions;
        Ok(&*self.missions.insert(missions))
    }

    /// Record the active player's top-level choice.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidDecision` when the collector refuses the
    /// choice, or a phase error when no round is open.
    pub fn choose(
        &mut self,
        player: PlayerId,
        kind: DecisionKind,
    ) -> Result<CollectorPhase, MatchError> {
        let (collector, missions, roster) = self.open_parts()?;
        let seat = seat(roster, player)?;
        let phase = collector.choose(seat, kind, missions)?;
        debug!("{} chose {kind}", seat.name);
        Ok(phase)
    }

    /// Settle a pending convoy cost for the active player.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidDecision` when no cost step is pending or
    /// the player cannot pay, or a phase error when no round is open.
    pub fn settle_cost(
        &mut self,
        player: PlayerId,
        choice: CostChoice,
    ) -> Result<CollectorPhase, MatchError> {
        let (collector, missions, roster) = self.open_parts()?;
        let seat = seat(roster, player)?;
        let phase = collector.settle_cost(seat, choice, missions)?;
        debug!("{} settled the convoy cost: {choice:?}", seat.name);
        Ok(phase)
    }

    /// Record a complete decision for the active player.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidDecision` when the player already decided,
    /// is out of turn, or cannot afford a paid path; a phase error when no
    /// round is open.
    pub fn record_decision(
        &mut self,
        player: PlayerId,
        decision: Decision,
    ) -> Result<CollectorPhase, MatchError> {
        let (collector, missions, roster) = self.open_parts()?;
        let seat = seat(roster, player)?;
        let phase = collector.record(seat, decision, missions)?;
        debug!(
            "{} decided {} (paid: {})",
            seat.name, decision.kind, decision.paid_cost
        );
        Ok(phase)
    }

    /// Default every undecided player in the open round to SKIP.
    ///
    /// # Errors
    ///
    /// Returns a phase error when no round is open.
    pub fn skip_remaining(&mut self) -> Result<(), MatchError> {
        let (collector, _, _) = self.open_parts()?;
        collector.skip_remaining();
        Ok(())
    }

    /// Resolve the open round with `dice`, then evaluate the end condition.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::IncompleteDecisions` naming every undecided player,
    /// or a phase error when no round is open. State is untouched on error.
    pub fn resolve_round_with<D: DiceSource + ?Sized>(
        &mut self,
        dice: &mut D,
    ) -> Result<RoundResult, MatchError> {
        let (collector, missions, roster) = self.open_parts()?;
        let decisions = collector.decision_set().map_err(|missing| {
            MatchError::IncompleteDecisions {
                missing: missing
                    .into_iter()
                    .filter_map(|id| roster.get(id.index()))
                    .map(|player| player.name.clone())
                    .collect(),
            }
        })?;
        let missions = missions.clone();

        let round = self.current_round();
        info!("resolving round {round}");
        let mut result = resolution::resolve_round(
            &mut self.players,
            &missions,
            &decisions,
            &self.config.rules,
            round,
            dice,
        );
        self.rounds_completed = round;
        self.mission_results.extend(result.missions.iter().cloned());
        self.missions = None;
        self.collector = None;

        match self.check_victory() {
            Some(outcome) => {
                let names: Vec<&str> = outcome
                    .winners
                    .iter()
                    .filter_map(|id| self.player(*id))
                    .map(|player| player.name.as_str())
                    .collect();
                info!(
                    "match over after round {round} ({}): winners [{}]",
                    outcome.reason,
                    names.join(", ")
                );
                self.phase = MatchPhase::Finished;
                result.outcome = Some(outcome.clone());
                self.outcome = Some(outcome);
            }
            None => self.phase = MatchPhase::AwaitingMissions,
        }
        Ok(result)
    }

    /// Evaluate the end condition against the current state.
    ///
    /// Returns `None` while the match continues. Calling it repeatedly on the
    /// same state returns the same answer.
    #[must_use]
    pub fn check_victory(&self) -> Option<VictoryOutcome> {
        if let Some(outcome) = &self.outcome {
            return Some(outcome.clone());
        }
        victory::check_victory(&self.config.victory, &self.players, self.rounds_completed)
    }

    /// Compile the final report stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidReportRequest` before the match has ended.
    pub fn compile_report(&self) -> Result<MatchReport, MatchError> {
        self.compile_report_at(Utc::now())
    }

    /// Compile the final report stamped with `at`.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidReportRequest` before the match has ended.
    pub fn compile_report_at(&self, at: DateTime<Utc>) -> Result<MatchReport, MatchError> {
        report::compile_report(self, at)
    }

    fn open_parts(
        &mut self,
    ) -> Result<(&mut DecisionCollector, &RoundMissions, &[Player]), MatchError> {
        if self.phase == MatchPhase::Finished {
            return Err(MatchError::MatchFinished);
        }
        match (self.collector.as_mut(), self.missions.as_ref()) {
            (Some(collector), Some(missions)) => Ok((collector, missions, &self.players)),
            _ => Err(MatchError::NoActiveRound),
        }
    }
}

fn seat(roster: &[Player], player: PlayerId) -> Result<&Player, MatchError> {
    roster
        .get(player.index())
        .ok_or(MatchError::InvalidDecision(DecisionError::UnknownPlayer {
            player,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlayerSetup, RuleSet};
    use crate::mission::{Mission, MissionKind};
    use crate::rng::ScriptedDice;
    use crate::victory::{VictoryCondition, VictoryKind, VictoryReason};

    fn duel(kind: VictoryKind, target: u32, max_rounds: u32) -> MatchState {
        let config = MatchConfig::new(
            vec![
                PlayerSetup::new("Eva", 3, 50),
                PlayerSetup::new("Kael", 5, 30),
            ],
            VictoryCondition {
                kind,
                target,
                max_rounds,
            },
            RuleSet::fixed_dual_slot(),
        );
        MatchState::setup(config, 7).unwrap()
    }

    fn offer() -> RoundMissions {
        RoundMissions::Dual {
            solo: Mission {
                name: "Express Delivery".to_string(),
                kind: MissionKind::Solo,
                risk_level: 8,
                reward: 20,
                cost: 5,
                repair_cost: None,
            },
            cooperative: Mission {
                name: "Imperial Blockade".to_string(),
                kind: MissionKind::Cooperative,
                risk_level: 10,
                reward: 40,
                cost: 10,
                repair_cost: None,
            },
        }
    }

    #[test]
    fn decisions_need_an_open_round() {
        let mut state = duel(VictoryKind::Credits, 100, 10);
        assert_eq!(
            state.choose(PlayerId(0), DecisionKind::Skip),
            Err(MatchError::NoActiveRound)
        );
        state.open_round(offer()).unwrap();
        assert_eq!(
            state.open_round(offer()).map(|_| ()),
            Err(MatchError::RoundInProgress)
        );
    }

    #[test]
    fn incomplete_round_names_missing_players_and_keeps_state() {
        let mut state = duel(VictoryKind::Credits, 100, 10);
        state.open_round(offer()).unwrap();
        state.choose(PlayerId(0), DecisionKind::Solo).unwrap();
        let before = state.clone();

        let mut dice = ScriptedDice::new([6, 6]);
        assert_eq!(
            state.resolve_round_with(&mut dice),
            Err(MatchError::IncompleteDecisions {
                missing: vec!["Kael".to_string()]
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn report_is_refused_until_finished() {
        let mut state = duel(VictoryKind::Quota, 50, 2);
        assert_eq!(
            state.compile_report().map(|_| ()),
            Err(MatchError::InvalidReportRequest)
        );

        let mut dice = ScriptedDice::default();
        for _ in 0..2 {
            state.open_round(offer()).unwrap();
            state.skip_remaining().unwrap();
            state.resolve_round_with(&mut dice).unwrap();
        }
        assert!(state.is_finished());
        let outcome = state.check_victory().unwrap();
        assert_eq!(outcome.reason, VictoryReason::QuotaMet);
        assert_eq!(outcome.winners, vec![PlayerId(0)]);
        assert_eq!(state.check_victory(), Some(outcome));
        assert!(state.compile_report().is_ok());
        assert_eq!(
            state.open_round(offer()).map(|_| ()),
            Err(MatchError::MatchFinished)
        );
    }

    #[test]
    fn starting_above_target_still_plays_the_first_round() {
        let mut state = duel(VictoryKind::Credits, 40, 10);
        assert_eq!(state.check_victory(), None);
        assert!(!state.is_finished());
        assert_eq!(
            state.compile_report().map(|_| ()),
            Err(MatchError::InvalidReportRequest)
        );

        state.open_round(offer()).unwrap();
        state.skip_remaining().unwrap();
        let result = state
            .resolve_round_with(&mut ScriptedDice::default())
            .unwrap();
        let outcome = result.outcome.unwrap();
        assert_eq!(outcome.winners, vec![PlayerId(0)]);
        assert_eq!(outcome.reason, VictoryReason::TargetReached);
        assert!(state.is_finished());
        assert!(state.compile_report().is_ok());
    }

    #[test]
    fn credits_victory_ends_the_round_it_is_reached() {
        let mut state = duel(VictoryKind::Credits, 65, 10);
        state.open_round(offer()).unwrap();
        state
            .record_decision(PlayerId(0), Decision::SOLO)
            .unwrap();
        state.record_decision(PlayerId(1), Decision::SKIP).unwrap();

        let mut dice = ScriptedDice::new([6]);
        let result = state.resolve_round_with(&mut dice).unwrap();
        let outcome = result.outcome.unwrap();
        assert_eq!(outcome.winners, vec![PlayerId(0)]);
        assert_eq!(outcome.reason, VictoryReason::TargetReached);
        assert_eq!(state.phase(), MatchPhase::Finished);
        assert_eq!(state.rounds_completed(), 1);
    }
}
