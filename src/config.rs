use crate::roster::Roster;
use anyhow::{Context, anyhow};
use ow_api::Stamp;
use ow_api::bulk::IndexTarget;
use ow_api::client::OW_API_BASE;
use std::time::Duration;

pub const DEFAULT_ES_URL: &str = "http://localhost:9200";

/// Everything a run needs. Defaults are the fixed values the tool has always
/// used; each can be overridden from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub api_timeout: Option<Duration>,
    pub stamp: Stamp,
    pub es_url: String,
    pub target: IndexTarget,
    pub roster: Roster,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: OW_API_BASE.to_owned(),
            api_timeout: None,
            stamp: Stamp::None,
            es_url: DEFAULT_ES_URL.to_owned(),
            target: IndexTarget::default(),
            roster: Roster::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(base) = var("OWSTATS_API_BASE") {
            config.api_base = base;
        }
        if let Some(secs) = var("OWSTATS_API_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("OWSTATS_API_TIMEOUT_SECS is not a number: {secs}"))?;
            config.api_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(stamp) = var("OWSTATS_STAMP") {
            config.stamp = stamp
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("invalid OWSTATS_STAMP")?;
        }
        if let Some(url) = var("OWSTATS_ES_URL") {
            config.es_url = url;
        }
        if let Some(index) = var("OWSTATS_ES_INDEX") {
            config.target.index = index;
        }
        // Set but empty means "send no _type".
        if let Some(doc_type) = lookup("OWSTATS_ES_TYPE") {
            config.target.doc_type = Some(doc_type).filter(|t| !t.trim().is_empty());
        }
        if let Some(path) = var("OWSTATS_ROSTER") {
            config.roster = Roster::from_path(&path)?;
        }

        Ok(config)
    }
}
