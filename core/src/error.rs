use crate::lifecycle::Command;
use crate::store::StoreError;
use crate::{FixtureStatus, Season};
use std::fmt;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug)]
pub enum CoreError {
    /// A pool set already exists for (sport, season).
    DuplicateGeneration { sport: String, season: Season, created_by: String },
    NoRankingData(String),
    NotFound(String),
    InvalidTeam(String),
    /// Rejected by the lifecycle policy.
    InvalidTransition { status: FixtureStatus, command: Command },
    InvalidRequest(String),
    StorageFailure(StoreError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::DuplicateGeneration { sport, season, created_by } => write!(
                f,
                "Pools and schedules for {sport} in {season} have already been created by {created_by}"
            ),
            CoreError::NoRankingData(sport) => write!(f, "No ranked teams found for {sport}"),
            CoreError::NotFound(msg) => write!(f, "Not found: {msg}"),
            CoreError::InvalidTeam(team) => {
                write!(f, "Invalid team identifier {team:?}, expected T1 or T2")
            }
            CoreError::InvalidTransition { status, command } => {
                write!(f, "Cannot {command} a fixture that is {status}")
            }
            CoreError::InvalidRequest(msg) => write!(f, "Invalid request: {msg}"),
            CoreError::StorageFailure(e) => write!(f, "Storage failure: {e}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::StorageFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        CoreError::StorageFailure(e)
    }
}
