//! Pool and round-robin schedule generation.
//!
//! Ranked teams are flattened in rank order, capped at [`MAX_TEAMS`], and
//! dealt alternately into Pool A and Pool B so both pools get a comparable
//! spread of strength. Every unordered pair inside a pool becomes one fixture.

use crate::clock::Clock;
use crate::store::{Commit, FixtureFilter, FixtureOrder, RecordStore};
use crate::{Actor, CoreError, CoreResult, Fixture, NewFixture, PoolLabel, PoolSet, Season, TeamRanking};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Tournaments are capped at eight competing teams.
pub const MAX_TEAMS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub sport: String,
    pub season: Season,
    pub pool_a: usize,
    pub pool_b: usize,
    pub fixtures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolsAndSchedule {
    pub sport: String,
    pub season: Season,
    pub pool_a: Vec<String>,
    pub pool_b: Vec<String>,
    pub fixtures: Vec<Fixture>,
}

// ---------------------------------------------------------------------------
// Pure seeding and scheduling steps
// ---------------------------------------------------------------------------

/// Flatten ranking records into a single ranked team list.
///
/// Records are ordered by their P1 slot (stable for equal keys), blank slots
/// are skipped, a team already listed earlier is not repeated, and the list
/// is cut at [`MAX_TEAMS`].
pub fn seed_teams(mut rankings: Vec<TeamRanking>) -> Vec<String> {
    rankings.sort_by(|a, b| a.primary().cmp(b.primary()));

    let mut teams: Vec<String> = Vec::with_capacity(MAX_TEAMS);
    for team in rankings.iter().flat_map(|r| r.slots()) {
        if teams.len() == MAX_TEAMS {
            break;
        }
        if !teams.iter().any(|t| t == team) {
            teams.push(team.to_owned());
        }
    }
    teams
}

/// Even positions go to Pool A, odd positions to Pool B.
pub fn split_pools(teams: &[String]) -> (Vec<String>, Vec<String>) {
    let pool_a = teams.iter().step_by(2).cloned().collect();
    let pool_b = teams.iter().skip(1).step_by(2).cloned().collect();
    (pool_a, pool_b)
}

/// Every unordered pair of a pool, in pool order: (0,1), (0,2), .. (n-2,n-1).
pub fn round_robin(pool: &[String]) -> Vec<(&str, &str)> {
    let mut pairs = Vec::with_capacity(pool.len() * pool.len().saturating_sub(1) / 2);
    for (i, home) in pool.iter().enumerate() {
        for away in &pool[i + 1..] {
            pairs.push((home.as_str(), away.as_str()));
        }
    }
    pairs
}

/// Fixtures for both pools of a pool set, Pool A first.
pub fn schedule(pool_set: &PoolSet) -> Vec<NewFixture> {
    [PoolLabel::A, PoolLabel::B]
        .into_iter()
        .flat_map(|label| {
            round_robin(pool_set.pool(label))
                .into_iter()
                .map(move |(team1, team2)| NewFixture {
                    pool: label,
                    team1: team1.to_owned(),
                    team2: team2.to_owned(),
                    sport: pool_set.sport.clone(),
                    season: pool_set.season,
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Generator service
// ---------------------------------------------------------------------------

pub struct PoolGenerator<S, C> {
    store: Arc<S>,
    clock: C,
}

impl<S: RecordStore, C: Clock> PoolGenerator<S, C> {
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self { store, clock }
    }

    /// Create the pool set and round-robin schedule for `sport` in the current season.
    pub async fn generate(&self, sport: &str, actor: &Actor) -> CoreResult<GenerationSummary> {
        let sport = sport.trim();
        if sport.is_empty() {
            return Err(CoreError::InvalidRequest("sport must not be empty".into()));
        }
        let season = self.clock.season();

        if let Some(existing) = self.store.pool_set(sport, season).await? {
            warn!("{} tried to regenerate {sport} {season}", actor.username);
            return Err(duplicate(existing));
        }

        let rankings = self.store.rankings_for(sport).await?;
        debug!("loaded {} ranking records for {sport}", rankings.len());
        let teams = seed_teams(rankings);
        if teams.is_empty() {
            return Err(CoreError::NoRankingData(sport.to_owned()));
        }

        let (pool_a, pool_b) = split_pools(&teams);
        let pool_set = PoolSet {
            sport: sport.to_owned(),
            season,
            pool_a,
            pool_b,
            created_by: actor.username.clone(),
            created_at: self.clock.now(),
        };
        let fixtures = schedule(&pool_set);
        let summary = GenerationSummary {
            sport: sport.to_owned(),
            season,
            pool_a: pool_set.pool_a.len(),
            pool_b: pool_set.pool_b.len(),
            fixtures: fixtures.len(),
        };

        match self.store.commit_generation(pool_set, fixtures).await? {
            Commit::Inserted { .. } => {
                info!(
                    "{} generated {sport} {season}: {}+{} teams, {} fixtures",
                    actor.username, summary.pool_a, summary.pool_b, summary.fixtures
                );
                Ok(summary)
            }
            // Lost a race against a concurrent generation.
            Commit::Conflict(existing) => {
                warn!("{} lost generation race for {sport} {season}", actor.username);
                Err(duplicate(existing))
            }
        }
    }

    /// Pools and schedule of the most recent season generated for `sport`.
    pub async fn fetch(&self, sport: &str) -> CoreResult<PoolsAndSchedule> {
        let pool_set = self
            .store
            .latest_pool_set(sport)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("pools not found for {sport}")))?;
        self.with_fixtures(pool_set).await
    }

    pub async fn fetch_season(&self, sport: &str, season: Season) -> CoreResult<PoolsAndSchedule> {
        let pool_set = self
            .store
            .pool_set(sport, season)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("pools not found for {sport} {season}")))?;
        self.with_fixtures(pool_set).await
    }

    async fn with_fixtures(&self, pool_set: PoolSet) -> CoreResult<PoolsAndSchedule> {
        let filter = FixtureFilter::sport(pool_set.sport.clone()).season(pool_set.season);
        let fixtures = self.store.fixtures(&filter, FixtureOrder::CreatedAt).await?;
        // A pool set without fixtures is a different failure from "never generated".
        if fixtures.is_empty() {
            return Err(CoreError::NotFound(format!(
                "no schedules found for {} {}",
                pool_set.sport, pool_set.season
            )));
        }
        Ok(PoolsAndSchedule {
            sport: pool_set.sport,
            season: pool_set.season,
            pool_a: pool_set.pool_a,
            pool_b: pool_set.pool_b,
            fixtures,
        })
    }
}

fn duplicate(existing: PoolSet) -> CoreError {
    CoreError::DuplicateGeneration {
        sport: existing.sport,
        season: existing.season,
        created_by: existing.created_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryStore;
    use crate::store::testing::OfflineStore;
    use crate::{FixtureStatus, Role};
    use chrono::{TimeZone, Utc};
    use futures_util::future::join_all;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn coach(username: &str) -> Actor {
        Actor {
            id: format!("id-{username}"),
            username: username.into(),
            role: Role::Coach,
            sport_category: None,
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap())
    }

    async fn ranked(sport: &str, teams: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.put_ranking(TeamRanking::new(sport, teams.iter().copied())).await.unwrap();
        store
    }

    #[test]
    fn seeding_alternates_between_pools() {
        let teams = names(&["T1", "T2", "T3", "T4", "T5", "T6", "T7", "T8"]);
        let (a, b) = split_pools(&teams);
        assert_eq!(a, names(&["T1", "T3", "T5", "T7"]));
        assert_eq!(b, names(&["T2", "T4", "T6", "T8"]));
    }

    #[test]
    fn odd_team_count_gives_pool_a_the_extra_team() {
        let (a, b) = split_pools(&names(&["A", "B", "C", "D", "E"]));
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn seed_teams_caps_at_eight_in_rank_order() {
        let rankings = vec![
            TeamRanking::new("football", ["M", "N", "O", "P", "Q", "R", "S", "T"]),
            TeamRanking::new("football", ["A", "B", "C", "D", "E", "F", "G", "H"]),
        ];
        assert_eq!(seed_teams(rankings), names(&["A", "B", "C", "D", "E", "F", "G", "H"]));
    }

    #[test]
    fn seed_teams_flattens_across_records_and_skips_repeats() {
        let rankings = vec![
            TeamRanking::new("football", ["B", "C", "", "A"]),
            TeamRanking::new("football", ["A", "B", "D"]),
        ];
        assert_eq!(seed_teams(rankings), names(&["A", "B", "D", "C"]));
    }

    #[test]
    fn round_robin_pairs_every_team_once() {
        let pool = names(&["A", "B", "C", "D"]);
        let pairs = round_robin(&pool);
        assert_eq!(
            pairs,
            vec![("A", "B"), ("A", "C"), ("A", "D"), ("B", "C"), ("B", "D"), ("C", "D")]
        );
        assert!(round_robin(&names(&["A"])).is_empty());
        assert!(round_robin(&[]).is_empty());
    }

    #[tokio::test]
    async fn generate_creates_balanced_pools_and_full_schedule() {
        let store = ranked("volleyball", &["T1", "T2", "T3", "T4", "T5", "T6", "T7", "T8"]).await;
        let generator = PoolGenerator::new(store.clone(), clock());

        let summary = generator.generate("volleyball", &coach("coach_kim")).await.unwrap();
        assert_eq!(summary.season, Season(2026));
        assert_eq!((summary.pool_a, summary.pool_b), (4, 4));
        assert_eq!(summary.fixtures, 12);

        let fetched = generator.fetch("volleyball").await.unwrap();
        assert_eq!(fetched.pool_a, names(&["T1", "T3", "T5", "T7"]));
        assert_eq!(fetched.pool_b, names(&["T2", "T4", "T6", "T8"]));
        assert_eq!(fetched.fixtures.len(), 12);
        assert!(fetched.fixtures.iter().all(|f| {
            f.status == FixtureStatus::Upcoming && f.score_t1 == 0 && f.score_t2 == 0 && f.result.is_none()
        }));
        assert_eq!(fetched.fixtures.iter().filter(|f| f.pool == PoolLabel::A).count(), 6);
        assert_eq!(fetched.fixtures[0].team1, "T1");
        assert_eq!(fetched.fixtures[0].team2, "T3");
    }

    #[tokio::test]
    async fn second_generation_names_first_creator_and_keeps_fixture_count() {
        let store = ranked("volleyball", &["A", "B", "C", "D"]).await;
        let generator = PoolGenerator::new(store.clone(), clock());

        generator.generate("volleyball", &coach("coach_kim")).await.unwrap();
        let err = generator.generate("volleyball", &coach("coach_lee")).await.unwrap_err();
        match err {
            CoreError::DuplicateGeneration { created_by, season, .. } => {
                assert_eq!(created_by, "coach_kim");
                assert_eq!(season, Season(2026));
            }
            other => panic!("expected DuplicateGeneration, got {other:?}"),
        }

        let fixtures = store
            .fixtures(&FixtureFilter::sport("volleyball"), FixtureOrder::Insertion)
            .await
            .unwrap();
        assert_eq!(fixtures.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_generation_has_exactly_one_winner() {
        let store = ranked("football", &["A", "B", "C", "D", "E", "F", "G", "H"]).await;
        let generator = Arc::new(PoolGenerator::new(store.clone(), clock()));

        let attempts = (0..8).map(|i| {
            let generator = generator.clone();
            tokio::spawn(async move { generator.generate("football", &coach(&format!("coach_{i}"))).await })
        });
        let results: Vec<_> = join_all(attempts).await.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, CoreError::DuplicateGeneration { .. })));

        let fixtures = store
            .fixtures(&FixtureFilter::sport("football"), FixtureOrder::Insertion)
            .await
            .unwrap();
        assert_eq!(fixtures.len(), 12);
    }

    #[tokio::test]
    async fn generate_without_rankings_fails() {
        let store = Arc::new(MemoryStore::new());
        let generator = PoolGenerator::new(store, clock());
        let err = generator.generate("chess", &coach("coach_kim")).await.unwrap_err();
        assert!(matches!(err, CoreError::NoRankingData(ref s) if s == "chess"), "{err}");
    }

    #[tokio::test]
    async fn generate_rejects_blank_sport() {
        let generator = PoolGenerator::new(Arc::new(MemoryStore::new()), clock());
        let err = generator.generate("  ", &coach("coach_kim")).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn fetch_distinguishes_missing_pools_from_missing_fixtures() {
        let store = ranked("badminton", &["Solo", "Duo"]).await;
        let generator = PoolGenerator::new(store, clock());

        let never = generator.fetch("badminton").await.unwrap_err();
        assert!(never.to_string().contains("pools not found"), "{never}");

        // One team per pool schedules nothing.
        let summary = generator.generate("badminton", &coach("coach_kim")).await.unwrap();
        assert_eq!(summary.fixtures, 0);
        let empty = generator.fetch("badminton").await.unwrap_err();
        assert!(empty.to_string().contains("no schedules found"), "{empty}");
    }

    #[tokio::test]
    async fn fetch_season_is_scoped_to_that_season() {
        let store = ranked("football", &["A", "B", "C", "D"]).await;
        let generator = PoolGenerator::new(store, clock());
        generator.generate("football", &coach("coach_kim")).await.unwrap();

        assert!(generator.fetch_season("football", Season(2026)).await.is_ok());
        assert!(matches!(
            generator.fetch_season("football", Season(2025)).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn storage_errors_surface_as_storage_failure() {
        let generator = PoolGenerator::new(Arc::new(OfflineStore), clock());
        let err = generator.generate("football", &coach("coach_kim")).await.unwrap_err();
        assert!(matches!(err, CoreError::StorageFailure(_)));
        assert!(matches!(generator.fetch("football").await, Err(CoreError::StorageFailure(_))));
    }
}
