use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider transport error: {0}")]
    Transport(String),
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("provider returned malformed data: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    pub id: i64,
    pub frontend_id: i64,
    pub title: String,
    pub title_slug: String,
    pub total_accepted: u64,
    pub total_submitted: u64,
    pub difficulty_level: i64,
    pub paid_only: bool,
    pub status: Option<String>,
}

pub trait CatalogProvider: Send + Sync {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<ProviderRecord>, ProviderError>>;
}

pub struct HttpCatalogProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCatalogProvider {
    pub fn new(endpoint: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("leetjump/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    async fn fetch(&self) -> Result<Vec<ProviderRecord>, ProviderError> {
        log::info!("fetching problem catalog from {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        parse_catalog_body(&body)
    }
}

impl CatalogProvider for HttpCatalogProvider {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<ProviderRecord>, ProviderError>> {
        Box::pin(self.fetch())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogBody {
    stat_status_pairs: Vec<StatStatusPair>,
}

#[derive(Debug, Deserialize)]
struct StatStatusPair {
    stat: Stat,
    status: Option<String>,
    difficulty: DifficultyLevel,
    paid_only: bool,
}

#[derive(Debug, Deserialize)]
struct Stat {
    question_id: i64,
    frontend_question_id: i64,
    #[serde(rename = "question__title")]
    title: String,
    #[serde(rename = "question__title_slug")]
    title_slug: String,
    total_acs: u64,
    total_submitted: u64,
}

#[derive(Debug, Deserialize)]
struct DifficultyLevel {
    level: i64,
}

pub fn parse_catalog_body(body: &str) -> Result<Vec<ProviderRecord>, ProviderError> {
    let parsed: CatalogBody =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    Ok(parsed
        .stat_status_pairs
        .into_iter()
        .map(|pair| ProviderRecord {
            id: pair.stat.question_id,
            frontend_id: pair.stat.frontend_question_id,
            title: pair.stat.title,
            title_slug: pair.stat.title_slug,
            total_accepted: pair.stat.total_acs,
            total_submitted: pair.stat.total_submitted,
            difficulty_level: pair.difficulty.level,
            paid_only: pair.paid_only,
            status: pair.status,
        })
        .collect())
}
