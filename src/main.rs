mod config;
mod roster;
mod runner;

use crate::config::Config;
use log::{debug, info};
use ow_api::bulk::Elasticsearch;
use ow_api::client::OwApi;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();
    setup_logging();

    let config = Config::from_env()?;

    let mut api = OwApi::new()
        .with_base_url(config.api_base.clone())
        .with_stamp(config.stamp);
    if let Some(timeout) = config.api_timeout {
        api = api.with_timeout(timeout);
    }
    let es = Elasticsearch::new(config.es_url.clone());

    info!(
        "Collecting {} profiles from {} into {}/{}",
        config.roster.len(),
        api.base_url(),
        es.url(),
        config.target.index
    );

    let summary = runner::run(&config, &api, &es).await?;

    info!(
        "Indexed {} of {} players ({} skipped)",
        summary.fetched, summary.requested, summary.skipped
    );
    debug!("Bulk response: {}", summary.response);
    Ok(())
}

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("owstats {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "owstats - fetch Overwatch player stats and bulk-load them into Elasticsearch

Usage:
  owstats
  owstats --help
  owstats --version

Environment:
  OWSTATS_API_BASE          Stats API base URL (default https://ow-api.com/v1/stats)
  OWSTATS_API_TIMEOUT_SECS  Per-request timeout for the stats API (default none)
  OWSTATS_STAMP             Capture time on fetched records: none, formatted, raw
  OWSTATS_ES_URL            Elasticsearch URL (default http://localhost:9200)
  OWSTATS_ES_INDEX          Target index (default overwatch)
  OWSTATS_ES_TYPE           Document type (default overwatch_stats, empty to omit)
  OWSTATS_ROSTER            Path to a roster JSON file (default built-in roster)
  RUST_LOG                  Log filter (default info)"
}
