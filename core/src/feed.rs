//! Public match feeds: every sport, one status, oldest fixture first.

use crate::store::{FixtureFilter, FixtureOrder, RecordStore};
use crate::{CoreResult, Fixture, FixtureStatus};
use std::sync::Arc;

pub struct MatchFeed<S> {
    store: Arc<S>,
}

impl<S: RecordStore> MatchFeed<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn by_status(&self, status: FixtureStatus) -> CoreResult<Vec<Fixture>> {
        let filter = FixtureFilter::default().statuses(&[status]);
        Ok(self.store.fixtures(&filter, FixtureOrder::CreatedAt).await?)
    }

    pub async fn upcoming(&self) -> CoreResult<Vec<Fixture>> {
        self.by_status(FixtureStatus::Upcoming).await
    }

    pub async fn live(&self) -> CoreResult<Vec<Fixture>> {
        self.by_status(FixtureStatus::Live).await
    }

    pub async fn recent(&self) -> CoreResult<Vec<Fixture>> {
        self.by_status(FixtureStatus::Recent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::generator::PoolGenerator;
    use crate::lifecycle::{LifecyclePolicy, MatchEngine};
    use crate::memory::MemoryStore;
    use crate::{Actor, TeamRanking};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn feeds_span_sports_in_creation_order() {
        let store = Arc::new(MemoryStore::new());
        store.put_ranking(TeamRanking::new("football", ["A", "B", "C", "D"])).await.unwrap();
        store.put_ranking(TeamRanking::new("volleyball", ["E", "F", "G", "H"])).await.unwrap();

        let coach = Actor { username: "coach_kim".into(), ..Actor::default() };
        let later = PoolGenerator::new(
            store.clone(),
            FixedClock(Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap()),
        );
        let earlier = PoolGenerator::new(
            store.clone(),
            FixedClock(Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()),
        );
        // Generated out of chronological order on purpose.
        later.generate("volleyball", &coach).await.unwrap();
        earlier.generate("football", &coach).await.unwrap();

        let feed = MatchFeed::new(store.clone());
        let upcoming = feed.upcoming().await.unwrap();
        let sports: Vec<&str> = upcoming.iter().map(|f| f.sport.as_str()).collect();
        assert_eq!(sports, vec!["football", "football", "volleyball", "volleyball"]);

        let engine = MatchEngine::new(store, LifecyclePolicy::default());
        engine.start(upcoming[2].id).await.unwrap();
        engine.stop(upcoming[0].id).await.unwrap();

        assert_eq!(feed.live().await.unwrap()[0].id, upcoming[2].id);
        assert_eq!(feed.recent().await.unwrap()[0].id, upcoming[0].id);
        assert_eq!(feed.upcoming().await.unwrap().len(), 2);
    }
}
