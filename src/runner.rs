use crate::config::Config;
use anyhow::Context;
use log::{error, info, warn};
use ow_api::StatsRecord;
use ow_api::bulk::{BulkIndex, write_bulk};
use ow_api::client::OwApi;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub requested: usize,
    pub fetched: usize,
    pub skipped: usize,
    /// Bulk response as returned by the index.
    pub response: Value,
}

/// Fetch every roster profile in order, then write them in one bulk call.
///
/// Players whose request fails or whose profile the API refuses are skipped.
/// A record that cannot be turned into a document fails the run.
pub async fn run<B: BulkIndex>(config: &Config, api: &OwApi, sink: &B) -> anyhow::Result<RunSummary> {
    if config.roster.is_empty() {
        warn!("Roster is empty, nothing to fetch");
    }
    let players = config.roster.players();
    let mut records: Vec<StatsRecord> = Vec::with_capacity(players.len());

    for player in &players {
        match api.fetch_profile(player).await {
            Ok(Some(record)) => records.push(record),
            Ok(None) => warn!("No usable profile for {player}"),
            Err(e) => error!("Skipping {player}: {e}"),
        }
    }

    let fetched = records.len();
    info!("Fetched {fetched} of {} profiles", players.len());

    let response = write_bulk(sink, &config.target, &records)
        .await
        .context("bulk index write failed")?;

    Ok(RunSummary {
        requested: players.len(),
        fetched,
        skipped: players.len() - fetched,
        response,
    })
}
