use thiserror::Error;

use crate::config::MatchConfigError;
use crate::decisions::DecisionError;

/// Errors surfaced by match operations. State is never mutated when one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("invalid match setup: {0}")]
    Config(#[from] MatchConfigError),
    #[error("invalid decision: {0}")]
    InvalidDecision(#[from] DecisionError),
    #[error("cannot resolve the round; still waiting on {}", missing.join(", "))]
    IncompleteDecisions { missing: Vec<String> },
    #[error("the report is only available once the match has ended")]
    InvalidReportRequest,
    #[error("a round is already open")]
    RoundInProgress,
    #[error("no round is open; generate missions first")]
    NoActiveRound,
    #[error("the match has already ended")]
    MatchFinished,
}

/// Failure while compiling and persisting a report.
#[derive(Debug, Error)]
pub enum SaveReportError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error("report storage failed: {0}")]
    Storage(#[source] E),
}
