use crate::state::messages::ConsoleRequest;
use campusplay_core::{FixtureId, FixtureStatus, Season};
use clap::{Parser, Subcommand};

const ENV_HELP: &str = "Environment:
  CAMPUSPLAY_STORE    Path to the JSON store snapshot (default ~/.config/campusplay/store.json)
  CAMPUSPLAY_LOG      Log level: off, error, warn, info, debug, trace (default info)
  CAMPUSPLAY_POLICY   Match lifecycle policy: permissive or strict (default permissive)
  CAMPUSPLAY_USER     Username recorded as the pool creator
  CAMPUSPLAY_ROLE     coach, referee or coordinator (default coach)
  CAMPUSPLAY_SPORT    Sport assigned to a referee, used by worklist

Without a command, commands are read line by line from stdin.
Quote names containing spaces: rank football \"Hall 3\" \"Hall 7\"";

/// Campus tournament pools, schedules and match scoring.
#[derive(Parser, Debug)]
#[command(name = "campusplay", version, about, long_about = None, after_help = ENV_HELP)]
pub struct Cli {
    /// Print responses as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One console line read from stdin; same commands, no program name.
#[derive(Parser, Debug)]
#[command(
    name = "campusplay",
    about = "Campus tournament console commands",
    no_binary_name = true,
    disable_version_flag = true
)]
struct ConsoleLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a ranking record, strongest team (P1) first.
    Rank {
        sport: String,
        #[arg(required = true)]
        teams: Vec<String>,
    },
    /// Create pools and the round-robin schedule for the current season.
    Generate { sport: String },
    /// Show pools and schedule, latest season unless one is given.
    Pools { sport: String, season: Option<i32> },
    /// Move a match to live.
    Start { id: FixtureId },
    /// Credit one point to T1 or T2.
    Point { id: FixtureId, team: String },
    /// Finish a match and record the result.
    Stop { id: FixtureId },
    /// List matches of a sport; upcoming and live when no status is given.
    Matches {
        sport: String,
        statuses: Vec<FixtureStatus>,
    },
    /// Upcoming and live matches of the referee's sport.
    Worklist,
    /// Matches of one status across all sports.
    Feed { status: FixtureStatus },
}

impl From<Command> for ConsoleRequest {
    fn from(command: Command) -> Self {
        match command {
            Command::Rank { sport, teams } => ConsoleRequest::PutRanking { sport, teams },
            Command::Generate { sport } => ConsoleRequest::GeneratePools { sport },
            Command::Pools { sport, season } => ConsoleRequest::FetchPools {
                sport,
                season: season.map(Season),
            },
            Command::Start { id } => ConsoleRequest::StartFixture { id },
            Command::Point { id, team } => ConsoleRequest::RecordPoint { id, team },
            Command::Stop { id } => ConsoleRequest::StopFixture { id },
            Command::Matches { sport, statuses } if statuses.is_empty() => {
                ConsoleRequest::QueryFixtures {
                    sport,
                    statuses: vec![FixtureStatus::Upcoming, FixtureStatus::Live],
                }
            }
            Command::Matches { sport, statuses } => ConsoleRequest::QueryFixtures { sport, statuses },
            Command::Worklist => ConsoleRequest::Worklist,
            Command::Feed { status } => ConsoleRequest::Feed { status },
        }
    }
}

/// What a stdin line asks for.
#[derive(Debug)]
pub enum LineInput {
    Request(ConsoleRequest),
    /// Blank line or `#` comment.
    Skip,
    /// Help text or a usage error, to be shown as-is.
    Message(clap::Error),
}

pub fn parse_line(line: &str) -> LineInput {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LineInput::Skip;
    }
    let Some(words) = shlex::split(trimmed) else {
        return LineInput::Message(clap::Error::raw(
            clap::error::ErrorKind::InvalidValue,
            "unterminated quote\n",
        ));
    };
    match ConsoleLine::try_parse_from(words) {
        Ok(parsed) => LineInput::Request(parsed.command.into()),
        Err(e) => LineInput::Message(e),
    }
}
