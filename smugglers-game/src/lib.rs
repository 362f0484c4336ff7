//! Galaxy Smugglers Game Engine
//!
//! Platform-agnostic rules engine for Galaxy Smugglers, a turn-based space
//! trading game of solo runs, convoys and freeriders. This crate provides
//! mission generation, decision collection, round resolution, victory checks
//! and match reports without UI or platform-specific dependencies.

pub mod config;
pub mod constants;
pub mod decisions;
pub mod error;
pub mod generator;
pub mod mission;
pub mod numbers;
pub mod player;
pub mod report;
pub mod resolution;
pub mod rng;
pub mod seed;
pub mod session;
pub mod state;
pub mod victory;

// Re-export commonly used types
pub use config::{
    GenerationMode, GenerationPolicy, MatchConfig, MatchConfigError, PlayerSetup, RuleSet,
};
pub use decisions::{
    CollectorPhase, CostChoice, Decision, DecisionCollector, DecisionError, DecisionKind,
    RoundDecisionSet,
};
pub use error::{MatchError, SaveReportError};
pub use generator::{RoundMissions, generate_round_missions, is_feasible};
pub use mission::{Mission, MissionArchetype, MissionKind, ValueRange};
pub use player::{DecisionRecord, Player, PlayerId};
pub use report::{GameSummary, MatchReport, OutcomeReport, PlayerReport, Standing};
pub use resolution::{MissionResult, RoundResult, resolve_round};
pub use rng::{DiceSource, RngBundle, ScriptedDice};
pub use seed::{decode_to_seed, encode_friendly, parse_share_code};
pub use session::MatchSession;
pub use state::{MatchPhase, MatchState};
pub use victory::{VictoryCondition, VictoryKind, VictoryOutcome, VictoryReason, check_victory};

/// Trait for abstracting report persistence.
/// Platform-specific implementations should provide this
pub trait ReportStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a finished match report, returning the name it was stored under.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be saved.
    fn save_report(&self, report: &MatchReport) -> Result<String, Self::Error>;

    /// Load a previously saved report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be read.
    fn load_report(&self, name: &str) -> Result<Option<MatchReport>, Self::Error>;
}

/// Main game engine for starting matches and persisting their reports
pub struct GameEngine<S>
where
    S: ReportStorage,
{
    storage: S,
}

impl<S> GameEngine<S>
where
    S: ReportStorage,
{
    /// Create a new game engine with the given report storage
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Start a seeded match.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Config` if the configuration is invalid.
    pub fn setup_match(&self, config: MatchConfig, seed: u64) -> Result<MatchSession, MatchError> {
        MatchSession::new(config, seed)
    }

    /// Start a match from a share code, using the preset rules the code names.
    ///
    /// Returns `Ok(None)` when the code cannot be parsed.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Config` if the resulting configuration is invalid.
    pub fn setup_from_share_code(
        &self,
        mut config: MatchConfig,
        code: &str,
    ) -> Result<Option<MatchSession>, MatchError> {
        let Some((mode, seed)) = parse_share_code(code) else {
            return Ok(None);
        };
        if config.rules.generation.mode() != mode {
            config.rules = RuleSet::for_mode(mode);
        }
        MatchSession::new(config, seed).map(Some)
    }

    /// Compile and store the report of a finished match.
    ///
    /// # Errors
    ///
    /// Returns an error if the match has not ended or the storage fails.
    pub fn save_report(
        &self,
        session: &MatchSession,
    ) -> Result<String, SaveReportError<S::Error>> {
        let report = session.compile_report()?;
        self.storage
            .save_report(&report)
            .map_err(SaveReportError::Storage)
    }

    /// Load a stored report.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage fails.
    pub fn load_report(&self, name: &str) -> Result<Option<MatchReport>, S::Error> {
        self.storage.load_report(name)
    }

    /// Borrow the underlying storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
