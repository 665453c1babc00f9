//! Workout sync client
//!
//! Uploads finalized workouts to the backend over HTTPS with bearer-token
//! auth. The client never retries on its own and never touches local
//! storage; callers decide what a failed upload means.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client as HttpClient, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::tracking::TrackedWorkout;
use crate::error::{Error, Result};
use crate::sync::device::DeviceState;
use crate::sync::payload::{DeviceInfo, SyncPayload, SyncResponse, WorkoutSyncData};

/// Path of the sync endpoint on the backend
const SYNC_PATH: &str = "/api/sync";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of bearer tokens for backend requests
///
/// The concrete identity provider lives outside this crate; anything that can
/// produce a token can drive the client.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch a token for the next request
    async fn token(&self) -> Result<String>;
}

/// Token provider backed by a fixed string, for tests and CLI usage
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider that always returns the given token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Outcome of a successful sync
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// When the sync completed, used to advance local watermarks
    pub synced_at: DateTime<Utc>,
    /// Number of workouts uploaded
    pub uploaded: usize,
    /// Number of server-declared conflicts (resolved server-side)
    pub conflicts: usize,
}

/// HTTP client for the workout sync backend
pub struct SyncClient {
    http: HttpClient,
    base_url: String,
    environment: String,
    tokens: Arc<dyn TokenProvider>,
    device: Mutex<DeviceState>,
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("base_url", &self.base_url)
            .field("environment", &self.environment)
            .finish()
    }
}

/// Builder for creating a SyncClient
pub struct SyncClientBuilder {
    base_url: Option<String>,
    environment: String,
    timeout_secs: u64,
    tokens: Option<Arc<dyn TokenProvider>>,
    device_path: Option<std::path::PathBuf>,
}

impl Default for SyncClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            base_url: None,
            environment: "staging".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            tokens: None,
            device_path: None,
        }
    }

    /// Set the backend base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the environment tag sent with every request
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the token provider
    pub fn token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set where the persistent device identity lives
    pub fn device_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.device_path = Some(path.into());
        self
    }

    /// Build the SyncClient
    pub fn build(self) -> Result<SyncClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("Sync base URL is required".to_string()))?;
        let tokens = self
            .tokens
            .ok_or_else(|| Error::Config("Token provider is required".to_string()))?;
        let device_path = self
            .device_path
            .ok_or_else(|| Error::Config("Device state path is required".to_string()))?;

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        Ok(SyncClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            environment: self.environment,
            tokens,
            device: Mutex::new(DeviceState::load_or_create(device_path)?),
        })
    }
}

impl SyncClient {
    /// Create a new builder for SyncClient
    pub fn builder() -> SyncClientBuilder {
        SyncClientBuilder::new()
    }

    /// The stable device identifier attached to uploads
    pub async fn device_id(&self) -> String {
        self.device.lock().await.device_id().to_string()
    }

    /// Upload a single finalized workout
    pub async fn sync_workout(&self, workout: &TrackedWorkout) -> Result<SyncOutcome> {
        self.sync_batch(std::slice::from_ref(workout)).await
    }

    /// Upload a batch of finalized workouts
    ///
    /// On success the local last-sync watermark advances. On any failure
    /// nothing is recorded and the error is surfaced as-is.
    pub async fn sync_batch(&self, workouts: &[TrackedWorkout]) -> Result<SyncOutcome> {
        if workouts.is_empty() {
            return Ok(SyncOutcome {
                synced_at: Utc::now(),
                uploaded: 0,
                conflicts: 0,
            });
        }

        let token = self.tokens.token().await?;
        let now = Utc::now();

        let payload = {
            let device = self.device.lock().await;
            SyncPayload {
                device_id: device.device_id().to_string(),
                device_info: Some(DeviceInfo::current()),
                last_sync_timestamp: device
                    .last_sync()
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
                workouts: workouts
                    .iter()
                    .map(|w| WorkoutSyncData::from_workout(w, now))
                    .collect(),
            }
        };

        let url = format!("{}{}", self.base_url, SYNC_PATH);
        debug!(url = %url, count = workouts.len(), "Uploading workouts");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("X-Environment", &self.environment)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = interpret_response(status, &body)?;

        let synced_at = Utc::now();
        {
            let mut device = self.device.lock().await;
            if let Err(error) = device.record_sync(synced_at) {
                warn!(%error, "Failed to persist sync watermark");
            }
        }

        let conflicts = parsed
            .data
            .as_ref()
            .and_then(|d| d.conflicts.as_ref())
            .map(Vec::len)
            .unwrap_or(0);
        if conflicts > 0 {
            warn!(conflicts, "Server resolved conflicts during sync");
        }
        if let Some(stats) = parsed.data.as_ref().and_then(|d| d.stats.as_ref()) {
            debug!(
                uploaded = stats.uploaded,
                downloaded = stats.downloaded,
                conflicts = stats.conflicts,
                "Sync stats"
            );
        }

        info!(count = workouts.len(), "Workouts uploaded");
        Ok(SyncOutcome {
            synced_at,
            uploaded: workouts.len(),
            conflicts,
        })
    }
}

/// Map an HTTP response to a typed result
fn interpret_response(status: StatusCode, body: &str) -> Result<SyncResponse> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }
    if status.is_client_error() {
        return Err(Error::ClientError(body.trim().to_string()));
    }
    if status.is_server_error() {
        return Err(Error::ServerError(format!(
            "status {}",
            status.as_u16()
        )));
    }
    if !status.is_success() {
        return Err(Error::ServerError(format!(
            "unexpected status {}",
            status.as_u16()
        )));
    }

    let response: SyncResponse =
        serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;
    if !response.success {
        return Err(Error::ServerError(
            response.message.unwrap_or_else(|| "Sync failed".to_string()),
        ));
    }
    Ok(response)
}
