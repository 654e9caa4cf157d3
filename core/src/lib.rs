pub mod clock;
pub mod error;
pub mod feed;
pub mod generator;
pub mod lifecycle;
pub mod memory;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use error::{CoreError, CoreResult};

/// Number of positional slots read from a ranking record (P1..P8).
pub const RANKING_SLOTS: usize = 8;

/// Literal stored as the result of a tied fixture.
pub const DRAW: &str = "Draw";

// ---------------------------------------------------------------------------
// Identity, supplied by the credential service and trusted as-is
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Coach,
    Referee,
    Coordinator,
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coach" => Ok(Role::Coach),
            "referee" | "ref" => Ok(Role::Referee),
            "coordinator" => Ok(Role::Coordinator),
            other => Err(CoreError::InvalidRequest(format!("unknown role {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub username: String,
    pub role: Role,
    /// Referees are scoped to a single sport.
    pub sport_category: Option<String>,
}

// ---------------------------------------------------------------------------
// Season: generation scope key, the calendar year
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season(pub i32);

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Season {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .trim()
            .parse::<i32>()
            .map(Season)
            .map_err(|e| format!("invalid season {value:?}: {e}"))
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.to_string()
    }
}

// ---------------------------------------------------------------------------
// Rankings and pools
// ---------------------------------------------------------------------------

/// One ranking record for a sport. `positions[0]` is P1, the strongest slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRanking {
    pub category: String,
    pub positions: Vec<String>,
}

impl TeamRanking {
    pub fn new(category: impl Into<String>, positions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            category: category.into(),
            positions: positions.into_iter().map(Into::into).collect(),
        }
    }

    /// The P1 slot, used as the ordering key between records.
    pub fn primary(&self) -> &str {
        self.positions.first().map(String::as_str).unwrap_or_default()
    }

    /// Filled slots in rank order, capped at P8.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.positions
            .iter()
            .take(RANKING_SLOTS)
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolLabel {
    #[serde(rename = "Pool A")]
    A,
    #[serde(rename = "Pool B")]
    B,
}

impl PoolLabel {
    pub fn label(&self) -> &'static str {
        match self {
            PoolLabel::A => "Pool A",
            PoolLabel::B => "Pool B",
        }
    }
}

impl fmt::Display for PoolLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSet {
    pub sport: String,
    pub season: Season,
    pub pool_a: Vec<String>,
    pub pool_b: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl PoolSet {
    pub fn pool(&self, label: PoolLabel) -> &[String] {
        match label {
            PoolLabel::A => &self.pool_a,
            PoolLabel::B => &self.pool_b,
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(pub u64);

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FixtureId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(FixtureId)
            .map_err(|_| CoreError::InvalidRequest(format!("invalid fixture id {s:?}")))
    }
}

/// Lifecycle status. Ordered the way a fixture moves through it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    #[default]
    Upcoming,
    Live,
    Recent,
}

impl FixtureStatus {
    pub const ALL: [FixtureStatus; 3] =
        [FixtureStatus::Upcoming, FixtureStatus::Live, FixtureStatus::Recent];

    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureStatus::Upcoming => "upcoming",
            FixtureStatus::Live => "live",
            FixtureStatus::Recent => "recent",
        }
    }
}

impl fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixtureStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(FixtureStatus::Upcoming),
            "live" => Ok(FixtureStatus::Live),
            "recent" => Ok(FixtureStatus::Recent),
            other => Err(CoreError::InvalidRequest(format!("unknown status {other:?}"))),
        }
    }
}

/// Which side of a fixture a point is credited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSlot {
    T1,
    T2,
}

impl TeamSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSlot::T1 => "T1",
            TeamSlot::T2 => "T2",
        }
    }
}

impl fmt::Display for TeamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamSlot {
    type Err = CoreError;

    /// Only the two literal selectors are accepted; no trimming or case folding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "T1" => Ok(TeamSlot::T1),
            "T2" => Ok(TeamSlot::T2),
            other => Err(CoreError::InvalidTeam(other.to_owned())),
        }
    }
}

/// Terminal outcome of a fixture. Serialized as the winning team's name or `"Draw"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchResult {
    Winner(String),
    Draw,
}

impl From<String> for MatchResult {
    fn from(value: String) -> Self {
        if value == DRAW { MatchResult::Draw } else { MatchResult::Winner(value) }
    }
}

impl From<MatchResult> for String {
    fn from(result: MatchResult) -> Self {
        match result {
            MatchResult::Winner(team) => team,
            MatchResult::Draw => DRAW.to_owned(),
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Winner(team) => f.write_str(team),
            MatchResult::Draw => f.write_str(DRAW),
        }
    }
}

/// A fixture as produced by the generator, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFixture {
    pub pool: PoolLabel,
    pub team1: String,
    pub team2: String,
    pub sport: String,
    pub season: Season,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: FixtureId,
    pub pool: PoolLabel,
    pub team1: String,
    pub team2: String,
    pub sport: String,
    pub season: Season,
    pub status: FixtureStatus,
    pub score_t1: u32,
    pub score_t2: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
    pub created_at: DateTime<Utc>,
}

impl Fixture {
    pub fn from_new(id: FixtureId, new: NewFixture, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            pool: new.pool,
            team1: new.team1,
            team2: new.team2,
            sport: new.sport,
            season: new.season,
            status: FixtureStatus::Upcoming,
            score_t1: 0,
            score_t2: 0,
            result: None,
            created_at,
        }
    }

    pub fn score(&self, slot: TeamSlot) -> u32 {
        match slot {
            TeamSlot::T1 => self.score_t1,
            TeamSlot::T2 => self.score_t2,
        }
    }

    pub fn team(&self, slot: TeamSlot) -> &str {
        match slot {
            TeamSlot::T1 => &self.team1,
            TeamSlot::T2 => &self.team2,
        }
    }

    /// Strict score comparison; equal scores are a draw.
    pub fn decide_result(&self) -> MatchResult {
        use std::cmp::Ordering;
        match self.score_t1.cmp(&self.score_t2) {
            Ordering::Greater => MatchResult::Winner(self.team1.clone()),
            Ordering::Less => MatchResult::Winner(self.team2.clone()),
            Ordering::Equal => MatchResult::Draw,
        }
    }
}
