use crate::{Endpoint, Player, Stamp, StatsRecord};
use chrono::Utc;
use log::{info, warn};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const OW_API_BASE: &str = "https://ow-api.com/v1/stats";

/// Client for the community Overwatch stats API.
#[derive(Debug, Clone)]
pub struct OwApi {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
    stamp: Stamp,
}

impl Default for OwApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("owstats/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: OW_API_BASE.to_owned(),
            timeout: None,
            stamp: Stamp::None,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(String, String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(msg, url) => write!(f, "Parse error for {url}: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) | ApiError::Api(e, _) => Some(e),
            _ => None,
        }
    }
}

/// Build `{base}/{platform}/{region}/{tag}/{endpoint}[/{hero,hero,...}]`.
///
/// The `#` in a battle tag becomes `-`, which is how the API expects tags in
/// the path. Nothing else is escaped or validated.
pub fn build_url(
    base: &str,
    platform: &str,
    region: &str,
    battle_tag: &str,
    endpoint: Endpoint,
    heroes: Option<&[&str]>,
) -> String {
    let tag = battle_tag.replace('#', "-");
    let url = [base, platform, region, tag.as_str(), endpoint.as_str()].join("/");

    match heroes {
        Some(list) if !list.is_empty() => format!("{url}/{}", list.join(",")),
        _ => url,
    }
}

impl OwApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_stamp(mut self, stamp: Stamp) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, player: &Player, endpoint: Endpoint, heroes: Option<&[&str]>) -> String {
        build_url(
            &self.base_url,
            player.platform(),
            player.region(),
            player.battle_tag(),
            endpoint,
            heroes,
        )
    }

    /// Basic profile: level, rating and quick-play/competitive summaries.
    pub async fn fetch_profile(&self, player: &Player) -> ApiResult<Option<StatsRecord>> {
        self.get(&self.url_for(player, Endpoint::Profile, None)).await
    }

    /// Full career stats.
    pub async fn fetch_complete(&self, player: &Player) -> ApiResult<Option<StatsRecord>> {
        self.get(&self.url_for(player, Endpoint::Complete, None)).await
    }

    /// Per-hero stats for the given hero identifiers (e.g. `mercy`, `ana`).
    pub async fn fetch_heroes(
        &self,
        player: &Player,
        heroes: &[&str],
    ) -> ApiResult<Option<StatsRecord>> {
        self.get(&self.url_for(player, Endpoint::Heroes, Some(heroes))).await
    }

    /// Profile, complete and heroes, one after the other. Records the API
    /// rejects are left out; the first transport or HTTP failure is returned.
    pub async fn fetch_all(&self, player: &Player, heroes: &[&str]) -> ApiResult<Vec<StatsRecord>> {
        let profile = self.fetch_profile(player).await?;
        let complete = self.fetch_complete(player).await?;
        let hero_stats = self.fetch_heroes(player, heroes).await?;

        Ok([profile, complete, hero_stats].into_iter().flatten().collect())
    }

    async fn get(&self, url: &str) -> ApiResult<Option<StatsRecord>> {
        info!("Requesting data for {url}");

        let mut request = self.client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        info!("Received {} from {url}", response.status());

        let response = response
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.to_owned()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Parsing(e.to_string(), url.to_owned()))?;

        let Value::Object(mut record) = body else {
            return Err(ApiError::Parsing("expected a JSON object".into(), url.to_owned()));
        };

        // The proxy reports lookup failures (private profile, unknown tag) in
        // the body of a 200.
        if let Some(reason) = record.get("error") {
            warn!("Request failed through API proxy for {url}: {reason}");
            return Ok(None);
        }

        self.stamp.apply(&mut record, Utc::now());
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const PROFILE_BODY: &str = r#"{"name":"A#1","level":42,"quickPlayStats":{},"competitiveStats":{}}"#;

    #[test]
    fn url_replaces_tag_separator() {
        let url = build_url("https://x", "pc", "us", "A#1", Endpoint::Profile, None);
        assert_eq!(url, "https://x/pc/us/A-1/profile");
    }

    #[test]
    fn url_appends_comma_joined_heroes() {
        let url = build_url("https://x", "pc", "us", "A#1", Endpoint::Heroes, Some(&["mercy", "ana"][..]));
        assert_eq!(url, "https://x/pc/us/A-1/heroes/mercy,ana");
    }

    #[test]
    fn url_ignores_empty_hero_list() {
        let url = build_url("https://x", "pc", "us", "A#1", Endpoint::Heroes, Some(&[][..]));
        assert_eq!(url, "https://x/pc/us/A-1/heroes");
    }

    #[test]
    fn url_for_uses_player_defaults() {
        let api = OwApi::new().with_base_url("https://x");
        let player = Player::new("Problem#1389", None, Some("eu"));
        assert_eq!(
            api.url_for(&player, Endpoint::Complete, None),
            "https://x/pc/eu/Problem-1389/complete"
        );
    }

    #[tokio::test]
    async fn profile_returns_parsed_record() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pc/us/A-1/profile")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PROFILE_BODY)
            .create_async()
            .await;

        let api = OwApi::new().with_base_url(server.url());
        let record = api
            .fetch_profile(&Player::new("A#1", None, None))
            .await
            .expect("request should succeed")
            .expect("record should be usable");

        mock.assert_async().await;
        assert_eq!(record["level"], 42);
        assert!(!record.contains_key("timestamp"));
    }

    #[tokio::test]
    async fn profile_is_stamped_when_requested() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/pc/us/A-1/profile")
            .with_status(200)
            .with_body(PROFILE_BODY)
            .create_async()
            .await;

        let api = OwApi::new().with_base_url(server.url()).with_stamp(Stamp::Raw);
        let record = api
            .fetch_profile(&Player::new("A#1", None, None))
            .await
            .unwrap()
            .unwrap();

        assert!(record["timestamp"].is_f64());
    }

    #[tokio::test]
    async fn error_key_yields_no_record() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/pc/us/Ghost-1/profile")
            .with_status(200)
            .with_body(r#"{"error":"Player not found"}"#)
            .create_async()
            .await;

        let api = OwApi::new().with_base_url(server.url());
        let result = api.fetch_profile(&Player::new("Ghost#1", None, None)).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/pc/us/A-1/profile")
            .with_status(503)
            .create_async()
            .await;

        let api = OwApi::new().with_base_url(server.url());
        let result = api.fetch_profile(&Player::new("A#1", None, None)).await;
        assert!(matches!(result, Err(ApiError::Api(_, _))));
    }

    #[tokio::test]
    async fn non_object_body_is_a_parse_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/pc/us/A-1/complete")
            .with_status(200)
            .with_body("[1,2,3]")
            .create_async()
            .await;

        let api = OwApi::new().with_base_url(server.url());
        let result = api.fetch_complete(&Player::new("A#1", None, None)).await;
        assert!(matches!(result, Err(ApiError::Parsing(_, _))));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let api = OwApi::new().with_base_url("http://127.0.0.1:1");
        let result = api.fetch_profile(&Player::new("A#1", None, None)).await;
        assert!(matches!(result, Err(ApiError::Network(_, _))));
    }

    #[tokio::test]
    async fn fetch_all_concatenates_in_call_order() {
        let mut server = Server::new_async().await;
        let profile = server
            .mock("GET", "/pc/us/A-1/profile")
            .with_status(200)
            .with_body(r#"{"kind":"profile"}"#)
            .create_async()
            .await;
        let complete = server
            .mock("GET", "/pc/us/A-1/complete")
            .with_status(200)
            .with_body(r#"{"error":"private"}"#)
            .create_async()
            .await;
        let heroes = server
            .mock("GET", "/pc/us/A-1/heroes/mercy,ana")
            .with_status(200)
            .with_body(r#"{"kind":"heroes"}"#)
            .create_async()
            .await;

        let api = OwApi::new().with_base_url(server.url());
        let records = api
            .fetch_all(&Player::new("A#1", None, None), &["mercy", "ana"])
            .await
            .unwrap();

        profile.assert_async().await;
        complete.assert_async().await;
        heroes.assert_async().await;

        let kinds: Vec<&str> = records.iter().filter_map(|r| r["kind"].as_str()).collect();
        assert_eq!(kinds, vec!["profile", "heroes"]);
    }
}
