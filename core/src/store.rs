//! Record store contract consumed by the generator and the lifecycle engine.
//!
//! Every mutating call is a single atomic round trip: generation commits are
//! insert-if-absent, score changes are increments, and status changes are
//! compare-and-set against the set of statuses the caller accepts.

use crate::{Fixture, FixtureId, FixtureStatus, NewFixture, PoolSet, Season, TeamRanking, TeamSlot};
use std::fmt;
use std::future::Future;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Unavailable(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            StoreError::Backend(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Outcome of an atomic pool set + fixtures commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    Inserted { fixture_ids: Vec<FixtureId> },
    /// Nothing was written; this pool set already owns the (sport, season) key.
    Conflict(PoolSet),
}

/// Outcome of a conditional fixture update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional<T> {
    Applied(T),
    /// The fixture's status was not in the accepted set. Carries the unchanged record.
    Rejected(T),
    Missing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureFilter {
    pub sport: Option<String>,
    pub season: Option<Season>,
    /// `None` matches every status.
    pub statuses: Option<Vec<FixtureStatus>>,
}

impl FixtureFilter {
    pub fn sport(sport: impl Into<String>) -> Self {
        Self { sport: Some(sport.into()), ..Self::default() }
    }

    pub fn season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    pub fn statuses(mut self, statuses: &[FixtureStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn matches(&self, fixture: &Fixture) -> bool {
        self.sport.as_deref().is_none_or(|s| fixture.sport == s)
            && self.season.is_none_or(|s| fixture.season == s)
            && self
                .statuses
                .as_deref()
                .is_none_or(|set| set.contains(&fixture.status))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FixtureOrder {
    /// Order the store holds records in; stable across calls.
    #[default]
    Insertion,
    /// `createdAt` ascending, ties broken by id.
    CreatedAt,
}

pub trait RecordStore: Send + Sync {
    /// Write path of the external ranking collaborator.
    fn put_ranking(&self, ranking: TeamRanking) -> impl Future<Output = StoreResult<()>> + Send;

    /// Ranking records for a category, in insertion order.
    fn rankings_for(&self, category: &str)
    -> impl Future<Output = StoreResult<Vec<TeamRanking>>> + Send;

    /// Insert the pool set and all its fixtures only if no pool set exists for
    /// its (sport, season). Either every record becomes visible or none does.
    fn commit_generation(
        &self,
        pool_set: PoolSet,
        fixtures: Vec<NewFixture>,
    ) -> impl Future<Output = StoreResult<Commit>> + Send;

    fn pool_set(
        &self,
        sport: &str,
        season: Season,
    ) -> impl Future<Output = StoreResult<Option<PoolSet>>> + Send;

    /// Pool set of the most recent season generated for the sport.
    fn latest_pool_set(&self, sport: &str)
    -> impl Future<Output = StoreResult<Option<PoolSet>>> + Send;

    fn fixtures(
        &self,
        filter: &FixtureFilter,
        order: FixtureOrder,
    ) -> impl Future<Output = StoreResult<Vec<Fixture>>> + Send;

    fn fixture(&self, id: FixtureId) -> impl Future<Output = StoreResult<Option<Fixture>>> + Send;

    /// Add one point to `slot` if the fixture's status is in `accepted`.
    fn increment_score(
        &self,
        id: FixtureId,
        slot: TeamSlot,
        accepted: &[FixtureStatus],
    ) -> impl Future<Output = StoreResult<Conditional<Fixture>>> + Send;

    /// Set the status if the current one is in `accepted`. Scores and result are untouched.
    fn set_status(
        &self,
        id: FixtureId,
        status: FixtureStatus,
        accepted: &[FixtureStatus],
    ) -> impl Future<Output = StoreResult<Conditional<Fixture>>> + Send;

    /// Move to `recent` if the current status is in `accepted`, deciding the
    /// result from the stored scores unless one was already recorded.
    fn finish(
        &self,
        id: FixtureId,
        accepted: &[FixtureStatus],
    ) -> impl Future<Output = StoreResult<Conditional<Fixture>>> + Send;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Store whose backend is down; every call fails.
    pub(crate) struct OfflineStore;

    fn down<T>() -> StoreResult<T> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    impl RecordStore for OfflineStore {
        async fn put_ranking(&self, _: TeamRanking) -> StoreResult<()> {
            down()
        }

        async fn rankings_for(&self, _: &str) -> StoreResult<Vec<TeamRanking>> {
            down()
        }

        async fn commit_generation(&self, _: PoolSet, _: Vec<NewFixture>) -> StoreResult<Commit> {
            down()
        }

        async fn pool_set(&self, _: &str, _: Season) -> StoreResult<Option<PoolSet>> {
            down()
        }

        async fn latest_pool_set(&self, _: &str) -> StoreResult<Option<PoolSet>> {
            down()
        }

        async fn fixtures(&self, _: &FixtureFilter, _: FixtureOrder) -> StoreResult<Vec<Fixture>> {
            down()
        }

        async fn fixture(&self, _: FixtureId) -> StoreResult<Option<Fixture>> {
            down()
        }

        async fn increment_score(
            &self,
            _: FixtureId,
            _: TeamSlot,
            _: &[FixtureStatus],
        ) -> StoreResult<Conditional<Fixture>> {
            down()
        }

        async fn set_status(
            &self,
            _: FixtureId,
            _: FixtureStatus,
            _: &[FixtureStatus],
        ) -> StoreResult<Conditional<Fixture>> {
            down()
        }

        async fn finish(&self, _: FixtureId, _: &[FixtureStatus]) -> StoreResult<Conditional<Fixture>> {
            down()
        }
    }
}
