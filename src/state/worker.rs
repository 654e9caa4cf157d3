use crate::state::messages::{ConsoleRequest, ConsoleResponse};
use campusplay_core::clock::{Clock, SystemClock};
use campusplay_core::feed::MatchFeed;
use campusplay_core::generator::PoolGenerator;
use campusplay_core::lifecycle::{LifecyclePolicy, MatchEngine};
use campusplay_core::memory::MemoryStore;
use campusplay_core::store::RecordStore;
use campusplay_core::{Actor, CoreError, CoreResult, FixtureStatus, TeamRanking};
use log::{debug, error};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct TournamentWorker<C = SystemClock> {
    store: Arc<MemoryStore>,
    generator: PoolGenerator<MemoryStore, C>,
    engine: MatchEngine<MemoryStore>,
    feed: MatchFeed<MemoryStore>,
    actor: Actor,
    requests: mpsc::Receiver<ConsoleRequest>,
    responses: mpsc::Sender<ConsoleResponse>,
}

impl<C: Clock> TournamentWorker<C> {
    pub fn new(
        store: Arc<MemoryStore>,
        clock: C,
        policy: LifecyclePolicy,
        actor: Actor,
        requests: mpsc::Receiver<ConsoleRequest>,
        responses: mpsc::Sender<ConsoleResponse>,
    ) -> Self {
        Self {
            generator: PoolGenerator::new(store.clone(), clock),
            engine: MatchEngine::new(store.clone(), policy),
            feed: MatchFeed::new(store.clone()),
            store,
            actor,
            requests,
            responses,
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            debug!("handling {request:?}");
            let response = self
                .handle(request)
                .await
                .unwrap_or_else(|err| ConsoleResponse::Error { message: err.to_string() });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send console response: {e}");
                break;
            }
        }
    }

    async fn handle(&self, request: ConsoleRequest) -> CoreResult<ConsoleResponse> {
        match request {
            ConsoleRequest::PutRanking { sport, teams } => self.handle_put_ranking(sport, teams).await,
            ConsoleRequest::GeneratePools { sport } => {
                let summary = self.generator.generate(&sport, &self.actor).await?;
                Ok(ConsoleResponse::PoolsGenerated { summary })
            }
            ConsoleRequest::FetchPools { sport, season } => {
                let pools = match season {
                    Some(season) => self.generator.fetch_season(&sport, season).await?,
                    None => self.generator.fetch(&sport).await?,
                };
                Ok(ConsoleResponse::PoolsLoaded { pools })
            }
            ConsoleRequest::StartFixture { id } => {
                let fixture = self.engine.start(id).await?;
                Ok(ConsoleResponse::FixtureUpdated {
                    message: "Match status updated to live".into(),
                    fixture,
                })
            }
            ConsoleRequest::RecordPoint { id, team } => {
                let update = self.engine.record_point(id, &team).await?;
                Ok(ConsoleResponse::FixtureUpdated {
                    message: update.confirmation(),
                    fixture: update.fixture,
                })
            }
            ConsoleRequest::StopFixture { id } => {
                let fixture = self.engine.stop(id).await?;
                Ok(ConsoleResponse::FixtureUpdated {
                    message: "Match stopped successfully".into(),
                    fixture,
                })
            }
            ConsoleRequest::QueryFixtures { sport, statuses } => {
                let fixtures = self.engine.query(&sport, &statuses).await?;
                let heading = format!("{sport} matches ({})", join_statuses(&statuses));
                Ok(ConsoleResponse::Fixtures { heading, fixtures })
            }
            ConsoleRequest::Worklist => {
                let fixtures = self.engine.worklist(&self.actor).await?;
                let heading = format!("worklist for {}", self.actor.username);
                Ok(ConsoleResponse::Fixtures { heading, fixtures })
            }
            ConsoleRequest::Feed { status } => {
                let fixtures = self.feed.by_status(status).await?;
                Ok(ConsoleResponse::Fixtures { heading: format!("{status} matches"), fixtures })
            }
        }
    }

    async fn handle_put_ranking(&self, sport: String, teams: Vec<String>) -> CoreResult<ConsoleResponse> {
        if sport.trim().is_empty() || teams.is_empty() {
            return Err(CoreError::InvalidRequest("rank needs a sport and at least one team".into()));
        }
        let ranking = TeamRanking::new(sport.clone(), teams);
        let count = ranking.slots().count();
        self.store.put_ranking(ranking).await?;
        Ok(ConsoleResponse::RankingStored { sport, teams: count })
    }
}

fn join_statuses(statuses: &[FixtureStatus]) -> String {
    statuses.iter().map(FixtureStatus::as_str).collect::<Vec<_>>().join(", ")
}
