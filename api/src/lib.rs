pub mod bulk;
pub mod client;
pub mod document;

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde_json::{Map, Value};

/// Untyped JSON object as returned by the stats API.
pub type StatsRecord = Map<String, Value>;

pub const DEFAULT_PLATFORM: &str = "pc";
pub const DEFAULT_REGION: &str = "us";

// ---------------------------------------------------------------------------
// Player identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    battle_tag: String,
    platform: String,
    region: String,
}

impl Player {
    /// Missing or blank platform/region fall back to `pc` / `us`.
    pub fn new(battle_tag: impl Into<String>, platform: Option<&str>, region: Option<&str>) -> Self {
        let or_default = |value: Option<&str>, default: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_owned()
        };

        Self {
            battle_tag: battle_tag.into(),
            platform: or_default(platform, DEFAULT_PLATFORM),
            region: or_default(region, DEFAULT_REGION),
        }
    }

    pub fn battle_tag(&self) -> &str {
        &self.battle_tag
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.battle_tag, self.platform, self.region)
    }
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Profile,
    Complete,
    Heroes,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Profile => "profile",
            Endpoint::Complete => "complete",
            Endpoint::Heroes => "heroes",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Capture-time annotation
// ---------------------------------------------------------------------------

/// How a freshly fetched record is annotated with its capture time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stamp {
    #[default]
    None,
    /// `@timestamp` as local `YYYY-MM-DD HH:MM:SS`.
    Formatted,
    /// `timestamp` as fractional Unix seconds.
    Raw,
}

impl Stamp {
    pub fn apply(self, record: &mut StatsRecord, now: DateTime<Utc>) {
        match self {
            Stamp::None => {}
            Stamp::Formatted => {
                let local = now.with_timezone(&Local);
                record.insert(
                    "@timestamp".into(),
                    Value::String(local.format("%Y-%m-%d %H:%M:%S").to_string()),
                );
            }
            Stamp::Raw => {
                let seconds = now.timestamp_micros() as f64 / 1_000_000.0;
                record.insert("timestamp".into(), Value::from(seconds));
            }
        }
    }
}

impl std::str::FromStr for Stamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Stamp::None),
            "formatted" => Ok(Stamp::Formatted),
            "raw" => Ok(Stamp::Raw),
            other => Err(format!("unknown stamp mode '{other}' (expected none, formatted or raw)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn player_defaults_platform_and_region() {
        let p = Player::new("Problem#1389", None, None);
        assert_eq!(p.platform(), "pc");
        assert_eq!(p.region(), "us");

        let blank = Player::new("Problem#1389", Some(""), Some("  "));
        assert_eq!(blank, p);
    }

    #[test]
    fn player_keeps_explicit_values() {
        let p = Player::new("ghavek#1129", Some("psn"), Some("eu"));
        assert_eq!(p.battle_tag(), "ghavek#1129");
        assert_eq!(p.platform(), "psn");
        assert_eq!(p.region(), "eu");
        assert_eq!(p.to_string(), "ghavek#1129 (psn/eu)");
    }

    #[test]
    fn endpoint_names() {
        assert_eq!(Endpoint::Profile.as_str(), "profile");
        assert_eq!(Endpoint::Complete.as_str(), "complete");
        assert_eq!(Endpoint::Heroes.to_string(), "heroes");
    }

    #[test]
    fn stamp_none_leaves_record_untouched() {
        let mut record = StatsRecord::new();
        Stamp::None.apply(&mut record, Utc::now());
        assert!(record.is_empty());
    }

    #[test]
    fn stamp_raw_writes_unix_seconds() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let mut record = StatsRecord::new();
        Stamp::Raw.apply(&mut record, now);
        assert_eq!(record["timestamp"].as_f64(), Some(now.timestamp() as f64));
    }

    #[test]
    fn stamp_formatted_writes_at_timestamp() {
        let mut record = StatsRecord::new();
        Stamp::Formatted.apply(&mut record, Utc::now());
        let value = record["@timestamp"].as_str().unwrap();
        assert_eq!(value.len(), "2026-10-16 12:00:00".len());
        assert!(!record.contains_key("timestamp"));
    }

    #[test]
    fn stamp_parses_from_str() {
        assert_eq!("raw".parse::<Stamp>(), Ok(Stamp::Raw));
        assert_eq!("Formatted".parse::<Stamp>(), Ok(Stamp::Formatted));
        assert_eq!("".parse::<Stamp>(), Ok(Stamp::None));
        assert!("iso".parse::<Stamp>().is_err());
    }
}
