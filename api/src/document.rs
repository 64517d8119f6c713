//! Flattening of a raw profile record into the document shape stored in the
//! search index.

use crate::StatsRecord;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub type MapResult<T> = Result<T, MappingError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A nested object the document is built from is absent or not an object.
    MissingField(String),
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::MissingField(path) => write!(f, "Missing field in stats record: {path}"),
        }
    }
}

impl std::error::Error for MappingError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    #[serde(skip)]
    pub id: String,
    pub quick_play_stats: ModeStats,
    pub competitive_stats: ModeStats,
    #[serde(rename = "@timestamp")]
    pub captured_at: String,
    pub name: Value,
    pub level: Value,
    pub level_icon: Value,
    pub prestige: Value,
    pub prestige_icon: Value,
    pub rating: Value,
    pub rating_icon: Value,
    pub rating_name: Value,
}

/// Stats block for one game mode (quick play or competitive).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeStats {
    pub awards: Awards,
    pub games: Games,
    pub healing_done_avg: Value,
    pub objective_kills_avg: Value,
    pub objective_time_avg: Value,
    pub solo_kills_avg: Value,
    pub damage_done_avg: Value,
    pub deaths_avg: Value,
    pub eliminations_avg: Value,
    pub final_blows_avg: Value,
    pub games_won: Value,
    /// Only carried on the quick-play block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Awards {
    pub cards: Value,
    pub medals: Value,
    pub medals_bronze: Value,
    pub medals_gold: Value,
    pub medals_silver: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Games {
    pub played: Value,
    pub won: Value,
}

impl IndexDocument {
    /// Map a record stamped with the current time.
    pub fn from_record(record: &StatsRecord) -> MapResult<Self> {
        map_record(record, Utc::now())
    }
}

/// Map one raw record. Fails on the first missing nested object; leaf values
/// that are absent are carried as `null`.
pub fn map_record(record: &StatsRecord, captured_at: DateTime<Utc>) -> MapResult<IndexDocument> {
    let quick_play = object(record, "quickPlayStats", "quickPlayStats")?;
    let competitive = object(record, "competitiveStats", "competitiveStats")?;

    let competitive_games = object(competitive, "games", "competitiveStats.games")?;
    // Quick play "won" is taken from the competitive block, as the index
    // has always stored it.
    let won = field(competitive_games, "won");

    let mut quick_play_stats = map_mode(quick_play, "quickPlayStats", won.clone())?;
    quick_play_stats.timestamp = Some(field(quick_play, "timestamp"));
    let competitive_stats = map_mode(competitive, "competitiveStats", won)?;

    Ok(IndexDocument {
        id: document_id(record)?,
        quick_play_stats,
        competitive_stats,
        captured_at: captured_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        name: field(record, "name"),
        level: field(record, "level"),
        level_icon: field(record, "levelIcon"),
        prestige: field(record, "prestige"),
        prestige_icon: field(record, "prestigeIcon"),
        rating: field(record, "rating"),
        rating_icon: field(record, "ratingIcon"),
        rating_name: field(record, "ratingName"),
    })
}

/// Content-derived id: MD5 of quick-play games played, name and competitive
/// games played, concatenated. Two records agreeing on those three values get
/// the same id.
pub fn document_id(record: &StatsRecord) -> MapResult<String> {
    let quick_games = object(
        object(record, "quickPlayStats", "quickPlayStats")?,
        "games",
        "quickPlayStats.games",
    )?;
    let competitive_games = object(
        object(record, "competitiveStats", "competitiveStats")?,
        "games",
        "competitiveStats.games",
    )?;

    let key = [
        render(quick_games.get("played")),
        render(record.get("name")),
        render(competitive_games.get("played")),
    ]
    .concat();

    Ok(format!("{:x}", Md5::digest(key.as_bytes())))
}

fn map_mode(stats: &StatsRecord, path: &str, won: Value) -> MapResult<ModeStats> {
    let awards = object(stats, "awards", &format!("{path}.awards"))?;
    let games = object(stats, "games", &format!("{path}.games"))?;

    Ok(ModeStats {
        awards: Awards {
            cards: field(awards, "cards"),
            medals: field(awards, "medals"),
            medals_bronze: field(awards, "medalsBronze"),
            medals_gold: field(awards, "medalsGold"),
            medals_silver: field(awards, "medalsSilver"),
        },
        games: Games {
            played: field(games, "played"),
            won,
        },
        healing_done_avg: field(stats, "healingDoneAvg"),
        objective_kills_avg: field(stats, "objectiveKillsAvg"),
        objective_time_avg: field(stats, "objectiveTimeAvg"),
        solo_kills_avg: field(stats, "soloKillsAvg"),
        damage_done_avg: field(stats, "damageDoneAvg"),
        deaths_avg: field(stats, "deathsAvg"),
        eliminations_avg: field(stats, "eliminationsAvg"),
        final_blows_avg: field(stats, "finalBlowsAvg"),
        games_won: field(stats, "gamesWon"),
        timestamp: None,
    })
}

fn object<'a>(parent: &'a StatsRecord, key: &str, path: &str) -> MapResult<&'a StatsRecord> {
    parent
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| MappingError::MissingField(path.to_owned()))
}

fn field(parent: &StatsRecord, key: &str) -> Value {
    parent.get(key).cloned().unwrap_or(Value::Null)
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => Value::Null.to_string(),
    }
}
