//! Match lifecycle: `upcoming -> live -> recent`.
//!
//! [`transition`] is the only place that decides which command may move a
//! fixture out of which status. The engine turns that table into the set of
//! statuses it hands to the store, so the status check and the write happen
//! in one atomic store call.

use crate::store::{Conditional, FixtureFilter, FixtureOrder, RecordStore};
use crate::{Actor, CoreError, CoreResult, Fixture, FixtureId, FixtureStatus, TeamSlot};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    RecordPoint,
    Stop,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => f.write_str("start"),
            Command::RecordPoint => f.write_str("record a point for"),
            Command::Stop => f.write_str("stop"),
        }
    }
}

/// Which out-of-order commands are tolerated.
///
/// The permissive policy matches how referees have been using the system:
/// a fixture can be restarted, scored while not live, and stopped before it
/// started. The strict policy rejects all three with `InvalidTransition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecyclePolicy {
    /// `start` on a live or recent fixture flips the status back to live.
    pub allow_restart: bool,
    /// `recordPoint` on a fixture that is not live.
    pub allow_idle_scoring: bool,
    /// `stop` on a fixture that never started.
    pub allow_early_stop: bool,
}

impl LifecyclePolicy {
    pub const fn permissive() -> Self {
        Self { allow_restart: true, allow_idle_scoring: true, allow_early_stop: true }
    }

    pub const fn strict() -> Self {
        Self { allow_restart: false, allow_idle_scoring: false, allow_early_stop: false }
    }
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

impl FromStr for LifecyclePolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::permissive()),
            "strict" => Ok(Self::strict()),
            other => Err(CoreError::InvalidRequest(format!("unknown lifecycle policy {other:?}"))),
        }
    }
}

/// Status a fixture moves to when `command` is applied, or `None` if the
/// policy forbids the command in status `from`.
pub fn transition(
    from: FixtureStatus,
    command: Command,
    policy: &LifecyclePolicy,
) -> Option<FixtureStatus> {
    use FixtureStatus::{Live, Recent, Upcoming};

    match (from, command) {
        (Upcoming, Command::Start) => Some(Live),
        (Live | Recent, Command::Start) if policy.allow_restart => Some(Live),
        (Live, Command::RecordPoint) => Some(Live),
        (Upcoming | Recent, Command::RecordPoint) if policy.allow_idle_scoring => Some(from),
        // Stopping a finished fixture is a no-op that keeps its result.
        (Live | Recent, Command::Stop) => Some(Recent),
        (Upcoming, Command::Stop) if policy.allow_early_stop => Some(Recent),
        _ => None,
    }
}

/// Statuses from which `command` is allowed under `policy`.
pub fn accepted_from(command: Command, policy: &LifecyclePolicy) -> Vec<FixtureStatus> {
    FixtureStatus::ALL
        .into_iter()
        .filter(|status| transition(*status, command, policy).is_some())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    pub fixture: Fixture,
    pub credited: TeamSlot,
}

impl ScoreUpdate {
    pub fn confirmation(&self) -> String {
        format!("Score updated successfully for {}", self.credited)
    }
}

pub struct MatchEngine<S> {
    store: Arc<S>,
    policy: LifecyclePolicy,
}

impl<S: RecordStore> MatchEngine<S> {
    pub fn new(store: Arc<S>, policy: LifecyclePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    pub async fn start(&self, id: FixtureId) -> CoreResult<Fixture> {
        let accepted = accepted_from(Command::Start, &self.policy);
        let outcome = self.store.set_status(id, FixtureStatus::Live, &accepted).await?;
        let fixture = resolve(outcome, id, Command::Start)?;
        info!("fixture {id} is live: {} vs {}", fixture.team1, fixture.team2);
        Ok(fixture)
    }

    /// Credit one point to `team`, which must be the literal `T1` or `T2`.
    pub async fn record_point(&self, id: FixtureId, team: &str) -> CoreResult<ScoreUpdate> {
        let credited: TeamSlot = team.parse()?;
        let accepted = accepted_from(Command::RecordPoint, &self.policy);
        let outcome = self.store.increment_score(id, credited, &accepted).await?;
        let fixture = resolve(outcome, id, Command::RecordPoint)?;
        debug!(
            "fixture {id} point to {credited}: {}-{}",
            fixture.score_t1, fixture.score_t2
        );
        Ok(ScoreUpdate { fixture, credited })
    }

    pub async fn stop(&self, id: FixtureId) -> CoreResult<Fixture> {
        let accepted = accepted_from(Command::Stop, &self.policy);
        let outcome = self.store.finish(id, &accepted).await?;
        let fixture = resolve(outcome, id, Command::Stop)?;
        info!(
            "fixture {id} finished {}-{}, result {}",
            fixture.score_t1,
            fixture.score_t2,
            fixture.result.as_ref().map(ToString::to_string).unwrap_or_default()
        );
        Ok(fixture)
    }

    /// Fixtures of `sport` whose status is in `statuses`, in insertion order.
    pub async fn query(&self, sport: &str, statuses: &[FixtureStatus]) -> CoreResult<Vec<Fixture>> {
        let filter = FixtureFilter::sport(sport).statuses(statuses);
        Ok(self.store.fixtures(&filter, FixtureOrder::Insertion).await?)
    }

    /// A referee's worklist: upcoming and live fixtures of their sport.
    pub async fn worklist(&self, actor: &Actor) -> CoreResult<Vec<Fixture>> {
        let sport = actor
            .sport_category
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                CoreError::InvalidRequest(format!("{} has no sport category", actor.username))
            })?;
        self.query(sport, &[FixtureStatus::Upcoming, FixtureStatus::Live]).await
    }
}

fn resolve(outcome: Conditional<Fixture>, id: FixtureId, command: Command) -> CoreResult<Fixture> {
    match outcome {
        Conditional::Applied(fixture) => Ok(fixture),
        Conditional::Rejected(fixture) => {
            Err(CoreError::InvalidTransition { status: fixture.status, command })
        }
        Conditional::Missing => Err(CoreError::NotFound(format!("match {id} not found"))),
    }
}
