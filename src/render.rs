use crate::state::messages::ConsoleResponse;
use campusplay_core::{Fixture, FixtureStatus, PoolLabel};
use serde_json::json;
use std::fmt::Write;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Output style for console responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

pub fn render(response: &ConsoleResponse, format: Format) -> String {
    match format {
        Format::Text => render_text(response),
        Format::Json => render_json(response),
    }
}

pub fn render_text(response: &ConsoleResponse) -> String {
    match response {
        ConsoleResponse::RankingStored { sport, teams } => {
            format!("Ranking stored for {sport} ({teams} teams)")
        }
        ConsoleResponse::PoolsGenerated { summary } => format!(
            "Pools and schedules generated successfully for {} {}: {} + {} teams, {} matches",
            summary.sport, summary.season, summary.pool_a, summary.pool_b, summary.fixtures
        ),
        ConsoleResponse::PoolsLoaded { pools } => {
            let mut out = format!("{} {}\n", pools.sport, pools.season);
            for (label, teams) in [(PoolLabel::A, &pools.pool_a), (PoolLabel::B, &pools.pool_b)] {
                let _ = writeln!(out, "  {label}: {}", teams.join(", "));
            }
            if pools.fixtures.is_empty() {
                out.push_str("  no matches scheduled");
            } else {
                out.push_str(&fixture_table(&pools.fixtures));
            }
            out.trim_end().to_string()
        }
        ConsoleResponse::FixtureUpdated { message, fixture } => {
            format!("{message}\n{}", fixture_line(fixture))
        }
        ConsoleResponse::Fixtures { heading, fixtures } => {
            if fixtures.is_empty() {
                format!("{heading}: none")
            } else {
                format!("{heading}\n{}", fixture_table(fixtures).trim_end())
            }
        }
        ConsoleResponse::Error { message } => format!("error: {message}"),
    }
}

fn fixture_table(fixtures: &[Fixture]) -> String {
    fixtures.iter().fold(String::new(), |mut out, f| {
        let _ = writeln!(out, "{}", fixture_line(f));
        out
    })
}

pub fn fixture_line(f: &Fixture) -> String {
    let mut line = format!(
        "  #{:<4} {:<7} {:<8} {} {}-{} {}",
        f.id.0,
        f.pool.label(),
        f.status.as_str(),
        f.team1,
        f.score_t1,
        f.score_t2,
        f.team2,
    );
    match (&f.result, f.status) {
        (Some(result), _) => {
            let _ = write!(line, "  [{result}]");
        }
        (None, FixtureStatus::Upcoming) => {
            let _ = write!(line, "  ({})", f.created_at.format(TIME_FORMAT));
        }
        _ => {}
    }
    line
}

pub fn render_json(response: &ConsoleResponse) -> String {
    let value = match response {
        ConsoleResponse::RankingStored { sport, teams } => {
            json!({ "ok": true, "sport": sport, "teams": teams })
        }
        ConsoleResponse::PoolsGenerated { summary } => json!({
            "ok": true,
            "message": "Pools and schedules generated successfully",
            "summary": summary,
        }),
        ConsoleResponse::PoolsLoaded { pools } => json!({ "ok": true, "pools": pools }),
        ConsoleResponse::FixtureUpdated { message, fixture } => {
            json!({ "ok": true, "message": message, "fixture": fixture })
        }
        ConsoleResponse::Fixtures { heading, fixtures } => {
            json!({ "ok": true, "heading": heading, "fixtures": fixtures })
        }
        ConsoleResponse::Error { message } => json!({ "ok": false, "error": message }),
    };
    value.to_string()
}
