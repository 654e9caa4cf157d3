use crate::store::{
    Commit, Conditional, FixtureFilter, FixtureOrder, RecordStore, StoreError, StoreResult,
};
use crate::{Fixture, FixtureId, FixtureStatus, NewFixture, PoolSet, Season, TeamRanking, TeamSlot};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Serializable image of every collection held by a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub rankings: Vec<TeamRanking>,
    #[serde(default)]
    pub pool_sets: Vec<PoolSet>,
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
    #[serde(default)]
    pub next_fixture_id: u64,
}

#[derive(Debug, Default)]
struct Tables {
    rankings: Vec<TeamRanking>,
    pool_sets: Vec<PoolSet>,
    fixtures: Vec<Fixture>,
    by_id: HashMap<FixtureId, usize>,
    next_id: u64,
}

impl Tables {
    fn fixture_mut(&mut self, id: FixtureId) -> Option<&mut Fixture> {
        let idx = *self.by_id.get(&id)?;
        self.fixtures.get_mut(idx)
    }

    /// Apply `update` only when the fixture's status is accepted.
    fn conditional(
        &mut self,
        id: FixtureId,
        accepted: &[FixtureStatus],
        update: impl FnOnce(&mut Fixture),
    ) -> Conditional<Fixture> {
        let Some(fixture) = self.fixture_mut(id) else {
            return Conditional::Missing;
        };
        if !accepted.contains(&fixture.status) {
            return Conditional::Rejected(fixture.clone());
        }
        update(fixture);
        Conditional::Applied(fixture.clone())
    }
}

/// In-process record store. A single lock guards all collections, so every
/// trait call is atomic with respect to every other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        let mut by_id = HashMap::with_capacity(snapshot.fixtures.len());
        for (idx, fixture) in snapshot.fixtures.iter().enumerate() {
            if by_id.insert(fixture.id, idx).is_some() {
                return Err(StoreError::Backend(format!("duplicate fixture id {}", fixture.id)));
            }
        }
        for (i, a) in snapshot.pool_sets.iter().enumerate() {
            if snapshot.pool_sets[..i]
                .iter()
                .any(|b| b.sport == a.sport && b.season == a.season)
            {
                return Err(StoreError::Backend(format!(
                    "duplicate pool set for {} {}",
                    a.sport, a.season
                )));
            }
        }

        let max_id = snapshot.fixtures.iter().map(|f| f.id.0 + 1).max().unwrap_or(0);
        let tables = Tables {
            rankings: snapshot.rankings,
            pool_sets: snapshot.pool_sets,
            fixtures: snapshot.fixtures,
            by_id,
            next_id: snapshot.next_fixture_id.max(max_id).max(1),
        };
        Ok(Self { tables: RwLock::new(tables) })
    }

    pub fn from_json(content: &str) -> StoreResult<Self> {
        let snapshot: StoreSnapshot = serde_json::from_str(content)
            .map_err(|e| StoreError::Backend(format!("invalid snapshot json: {e}")))?;
        Self::from_snapshot(snapshot)
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read().await;
        StoreSnapshot {
            rankings: tables.rankings.clone(),
            pool_sets: tables.pool_sets.clone(),
            fixtures: tables.fixtures.clone(),
            next_fixture_id: tables.next_id,
        }
    }

    pub async fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(&self.snapshot().await)
            .map_err(|e| StoreError::Backend(format!("snapshot encode failed: {e}")))
    }
}

impl RecordStore for MemoryStore {
    async fn put_ranking(&self, ranking: TeamRanking) -> StoreResult<()> {
        self.tables.write().await.rankings.push(ranking);
        Ok(())
    }

    async fn rankings_for(&self, category: &str) -> StoreResult<Vec<TeamRanking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rankings
            .iter()
            .filter(|r| r.category == category)
            .cloned()
            .collect())
    }

    async fn commit_generation(
        &self,
        pool_set: PoolSet,
        fixtures: Vec<NewFixture>,
    ) -> StoreResult<Commit> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .pool_sets
            .iter()
            .find(|p| p.sport == pool_set.sport && p.season == pool_set.season)
        {
            return Ok(Commit::Conflict(existing.clone()));
        }

        let created_at = pool_set.created_at;
        let first_id = tables.next_id.max(1);
        let mut fixture_ids = Vec::with_capacity(fixtures.len());
        for (offset, new) in fixtures.into_iter().enumerate() {
            let id = FixtureId(first_id + offset as u64);
            let idx = tables.fixtures.len();
            tables.fixtures.push(Fixture::from_new(id, new, created_at));
            tables.by_id.insert(id, idx);
            fixture_ids.push(id);
        }
        tables.next_id = first_id + fixture_ids.len() as u64;
        debug!(
            "committed pool set {} {} with {} fixtures",
            pool_set.sport,
            pool_set.season,
            fixture_ids.len()
        );
        tables.pool_sets.push(pool_set);
        Ok(Commit::Inserted { fixture_ids })
    }

    async fn pool_set(&self, sport: &str, season: Season) -> StoreResult<Option<PoolSet>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pool_sets
            .iter()
            .find(|p| p.sport == sport && p.season == season)
            .cloned())
    }

    async fn latest_pool_set(&self, sport: &str) -> StoreResult<Option<PoolSet>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pool_sets
            .iter()
            .filter(|p| p.sport == sport)
            .max_by_key(|p| p.season)
            .cloned())
    }

    async fn fixtures(
        &self,
        filter: &FixtureFilter,
        order: FixtureOrder,
    ) -> StoreResult<Vec<Fixture>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Fixture> = tables
            .fixtures
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        if order == FixtureOrder::CreatedAt {
            found.sort_by_key(|f| (f.created_at, f.id));
        }
        Ok(found)
    }

    async fn fixture(&self, id: FixtureId) -> StoreResult<Option<Fixture>> {
        let tables = self.tables.read().await;
        Ok(tables.by_id.get(&id).and_then(|&idx| tables.fixtures.get(idx)).cloned())
    }

    async fn increment_score(
        &self,
        id: FixtureId,
        slot: TeamSlot,
        accepted: &[FixtureStatus],
    ) -> StoreResult<Conditional<Fixture>> {
        let mut tables = self.tables.write().await;
        Ok(tables.conditional(id, accepted, |f| match slot {
            TeamSlot::T1 => f.score_t1 = f.score_t1.saturating_add(1),
            TeamSlot::T2 => f.score_t2 = f.score_t2.saturating_add(1),
        }))
    }

    async fn set_status(
        &self,
        id: FixtureId,
        status: FixtureStatus,
        accepted: &[FixtureStatus],
    ) -> StoreResult<Conditional<Fixture>> {
        let mut tables = self.tables.write().await;
        Ok(tables.conditional(id, accepted, |f| f.status = status))
    }

    async fn finish(
        &self,
        id: FixtureId,
        accepted: &[FixtureStatus],
    ) -> StoreResult<Conditional<Fixture>> {
        let mut tables = self.tables.write().await;
        Ok(tables.conditional(id, accepted, |f| {
            f.status = FixtureStatus::Recent;
            if f.result.is_none() {
                f.result = Some(f.decide_result());
            }
        }))
    }
}
