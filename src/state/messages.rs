use campusplay_core::generator::{GenerationSummary, PoolsAndSchedule};
use campusplay_core::{Fixture, FixtureId, FixtureStatus, Season};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleRequest {
    PutRanking { sport: String, teams: Vec<String> },
    GeneratePools { sport: String },
    FetchPools { sport: String, season: Option<Season> },
    StartFixture { id: FixtureId },
    RecordPoint { id: FixtureId, team: String },
    StopFixture { id: FixtureId },
    QueryFixtures { sport: String, statuses: Vec<FixtureStatus> },
    Worklist,
    Feed { status: FixtureStatus },
}

impl ConsoleRequest {
    /// Whether handling the request may change stored records.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ConsoleRequest::PutRanking { .. }
                | ConsoleRequest::GeneratePools { .. }
                | ConsoleRequest::StartFixture { .. }
                | ConsoleRequest::RecordPoint { .. }
                | ConsoleRequest::StopFixture { .. }
        )
    }
}

#[derive(Debug)]
pub enum ConsoleResponse {
    RankingStored { sport: String, teams: usize },
    PoolsGenerated { summary: GenerationSummary },
    PoolsLoaded { pools: PoolsAndSchedule },
    FixtureUpdated { message: String, fixture: Fixture },
    Fixtures { heading: String, fixtures: Vec<Fixture> },
    Error { message: String },
}
