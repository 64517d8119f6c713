//! Elasticsearch bulk writes.

use crate::StatsRecord;
use crate::client::{ApiError, ApiResult};
use crate::document::{IndexDocument, MappingError};
use log::info;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_INDEX: &str = "overwatch";
pub const DEFAULT_DOC_TYPE: &str = "overwatch_stats";

/// Anything that accepts a batch of index actions in one call.
pub trait BulkIndex {
    fn bulk(&self, actions: Vec<BulkAction>) -> impl Future<Output = ApiResult<Value>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub index: String,
    /// Mapping type; `None` for clusters that no longer accept `_type`.
    pub doc_type: Option<String>,
}

impl Default for IndexTarget {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_owned(),
            doc_type: Some(DEFAULT_DOC_TYPE.to_owned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BulkAction {
    pub index: String,
    pub doc_type: Option<String>,
    pub id: String,
    pub source: IndexDocument,
}

impl BulkAction {
    pub fn new(target: &IndexTarget, source: IndexDocument) -> Self {
        Self {
            index: target.index.clone(),
            doc_type: target.doc_type.clone(),
            id: source.id.clone(),
            source,
        }
    }

    fn header(&self) -> Value {
        let mut meta = json!({ "_index": self.index, "_id": self.id });
        if let Some(doc_type) = &self.doc_type {
            meta["_type"] = Value::String(doc_type.clone());
        }
        json!({ "index": meta })
    }
}

/// Render actions as a `_bulk` request body: one header line and one source
/// line per action, newline terminated.
pub fn to_ndjson(actions: &[BulkAction]) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for action in actions {
        body.push_str(&serde_json::to_string(&action.header())?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&action.source)?);
        body.push('\n');
    }
    Ok(body)
}

#[derive(Debug)]
pub enum IndexError {
    Mapping(MappingError),
    Api(ApiError),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Mapping(e) => write!(f, "Could not build index documents: {e}"),
            IndexError::Api(e) => write!(f, "Bulk write failed: {e}"),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Mapping(e) => Some(e),
            IndexError::Api(e) => Some(e),
        }
    }
}

impl From<MappingError> for IndexError {
    fn from(e: MappingError) -> Self {
        IndexError::Mapping(e)
    }
}

impl From<ApiError> for IndexError {
    fn from(e: ApiError) -> Self {
        IndexError::Api(e)
    }
}

/// Map every record, then submit them all in a single bulk call.
///
/// A record that cannot be mapped aborts the whole batch before anything is
/// sent. The bulk response is returned as-is; per-item failures are not
/// inspected.
pub async fn write_bulk<B: BulkIndex>(
    sink: &B,
    target: &IndexTarget,
    records: &[StatsRecord],
) -> Result<Value, IndexError> {
    let actions = records
        .iter()
        .map(|record| IndexDocument::from_record(record).map(|doc| BulkAction::new(target, doc)))
        .collect::<Result<Vec<_>, _>>()?;

    if actions.is_empty() {
        info!("No documents to index");
        return Ok(json!({ "took": 0, "errors": false, "items": [] }));
    }

    info!("Writing {} documents to index {}", actions.len(), target.index);
    Ok(sink.bulk(actions).await?)
}

/// `_bulk` over plain HTTP.
#[derive(Debug, Clone)]
pub struct Elasticsearch {
    client: Client,
    url: String,
    timeout: Duration,
}

impl Elasticsearch {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into().trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl BulkIndex for Elasticsearch {
    async fn bulk(&self, actions: Vec<BulkAction>) -> ApiResult<Value> {
        let url = format!("{}/_bulk", self.url);
        let body = to_ndjson(&actions).map_err(|e| ApiError::Other(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.clone()))?;

        response
            .json()
            .await
            .map_err(|e| ApiError::Parsing(e.to_string(), url))
    }
}
