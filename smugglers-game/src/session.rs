//! A match state paired with the random streams that drive it.
use chrono::{DateTime, Utc};

use crate::config::MatchConfig;
use crate::decisions::{CollectorPhase, CostChoice, Decision, DecisionKind};
use crate::error::MatchError;
use crate::generator::{self, RoundMissions};
use crate::player::PlayerId;
use crate::report::MatchReport;
use crate::resolution::RoundResult;
use crate::rng::RngBundle;
use crate::state::{MatchPhase, MatchState};
use crate::victory::VictoryOutcome;

/// High-level session binding a match state to its seeded random streams.
#[derive(Debug, Clone)]
pub struct MatchSession {
    state: MatchState,
    rng: RngBundle,
}

impl MatchSession {
    /// Validate `config` and start a match seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Config` when the configuration is invalid.
    pub fn new(config: MatchConfig, seed: u64) -> Result<Self, MatchError> {
        let state = MatchState::setup(config, seed)?;
        Ok(Self {
            state,
            rng: RngBundle::from_user_seed(seed),
        })
    }

    /// Borrow the underlying match state.
    #[must_use]
    pub const fn state(&self) -> &MatchState {
        &self.state
    }

    /// Consume the session, keeping only its state.
    #[must_use]
    pub fn into_state(self) -> MatchState {
        self.state
    }

    /// Draw counts per stream as `(missions, dice, repairs)`.
    #[must_use]
    pub const fn rng_draws(&self) -> (u64, u64, u64) {
        self.rng.draws()
    }

    /// Roll this round's missions and open the round.
    ///
    /// While a round is already open its missions are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::MatchFinished` once the match has ended, or a
    /// configuration error if the mission pool is empty.
    pub fn generate_round_missions(&mut self) -> Result<&RoundMissions, MatchError> {
        match self.state.phase() {
            MatchPhase::Finished => return Err(MatchError::MatchFinished),
            MatchPhase::CollectingDecisions => {
                return self.state.missions().ok_or(MatchError::NoActiveRound);
            }
            MatchPhase::AwaitingMissions => {}
        }
        let missions = generator::generate_round_missions(
            &self.state.config().rules,
            self.state.players(),
            self.rng.missions(),
        )?;
        self.state.open_round(missions)
    }

    /// Open the next round with caller-supplied missions.
    ///
    /// # Errors
    ///
    /// Same as [`MatchState::open_round`].
    pub fn open_round(&mut self, missions: RoundMissions) -> Result<&RoundMissions, MatchError> {
        self.state.open_round(missions)
    }

    /// # Errors
    ///
    /// Same as [`MatchState::choose`].
    pub fn choose(
        &mut self,
        player: PlayerId,
        kind: DecisionKind,
    ) -> Result<CollectorPhase, MatchError> {
        self.state.choose(player, kind)
    }

    /// # Errors
    ///
    /// Same as [`MatchState::settle_cost`].
    pub fn settle_cost(
        &mut self,
        player: PlayerId,
        choice: CostChoice,
    ) -> Result<CollectorPhase, MatchError> {
        self.state.settle_cost(player, choice)
    }

    /// # Errors
    ///
    /// Same as [`MatchState::record_decision`].
    pub fn record_decision(
        &mut self,
        player: PlayerId,
        decision: Decision,
    ) -> Result<CollectorPhase, MatchError> {
        self.state.record_decision(player, decision)
    }

    /// # Errors
    ///
    /// Same as [`MatchState::skip_remaining`].
    pub fn skip_remaining(&mut self) -> Result<(), MatchError> {
        self.state.skip_remaining()
    }

    /// Resolve the open round with the session's dice and repair streams.
    ///
    /// # Errors
    ///
    /// Same as [`MatchState::resolve_round_with`].
    pub fn resolve_round(&mut self) -> Result<RoundResult, MatchError> {
        self.state.resolve_round_with(&mut self.rng)
    }

    #[must_use]
    pub fn check_victory(&self) -> Option<VictoryOutcome> {
        self.state.check_victory()
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// # Errors
    ///
    /// Same as [`MatchState::compile_report`].
    pub fn compile_report(&self) -> Result<MatchReport, MatchError> {
        self.state.compile_report()
    }

    /// # Errors
    ///
    /// Same as [`MatchState::compile_report_at`].
    pub fn compile_report_at(&self, at: DateTime<Utc>) -> Result<MatchReport, MatchError> {
        self.state.compile_report_at(at)
    }
}
