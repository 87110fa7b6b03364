#![forbid(unsafe_code)]

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::MissionBaseError;
use crate::model::{ActivityItem, Agent, Snapshot, Task, TasksEnvelope};

/// Source of snapshots for the poller.
pub trait Backend: Send + Sync + 'static {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Snapshot, MissionBaseError>> + Send;
}

/// Read-only client for the three Mission Base endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, MissionBaseError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mission-base/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MissionBaseError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, MissionBaseError> {
        let url = format!("{}/{endpoint}", self.base);
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| MissionBaseError::Http { endpoint, source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MissionBaseError::HttpStatus { endpoint, status });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|source| MissionBaseError::Http { endpoint, source })?;
        serde_json::from_slice(&body).map_err(|source| MissionBaseError::Decode { endpoint, source })
    }

    pub async fn fetch_tasks(&self) -> Result<Vec<Task>, MissionBaseError> {
        let envelope: Option<TasksEnvelope> = self.get("tasks").await?;
        Ok(envelope.and_then(|e| e.tasks).unwrap_or_default())
    }

    pub async fn fetch_activity(&self) -> Result<Vec<ActivityItem>, MissionBaseError> {
        let items: Option<Vec<ActivityItem>> = self.get("activity").await?;
        Ok(items.unwrap_or_default())
    }

    pub async fn fetch_agents(&self) -> Result<Vec<Agent>, MissionBaseError> {
        let agents: Option<Vec<Agent>> = self.get("agents").await?;
        Ok(agents.unwrap_or_default())
    }

    /// One poll cycle: all three requests in flight at once; any failure fails
    /// the whole cycle.
    pub async fn snapshot(&self) -> Result<Snapshot, MissionBaseError> {
        let (tasks, activity, agents) = tokio::try_join!(
            self.fetch_tasks(),
            self.fetch_activity(),
            self.fetch_agents()
        )?;
        Ok(Snapshot {
            tasks,
            agents,
            activity,
        })
    }
}

impl Backend for ApiClient {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Snapshot, MissionBaseError>> + Send {
        self.snapshot()
    }
}
