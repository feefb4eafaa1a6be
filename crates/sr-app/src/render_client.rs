use async_trait::async_trait;
use serde::Deserialize;
use sr_core::params::JobInput;

use crate::error::AppError;

const SYSTEM: &str = "render service";

/// Acknowledgement of a submitted job. The id is the authoritative handle
/// for all further status checks.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub job_id: String,
    pub status: Option<String>,
}

/// One observation of a job: its raw status and whatever output images the
/// service has attached so far (empty until completion).
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub status: String,
    pub images: Vec<String>,
}

#[async_trait]
pub trait RenderService: Send + Sync {
    async fn submit(&self, input: &JobInput) -> Result<SubmitReceipt, AppError>;
    async fn status(&self, job_id: &str) -> Result<JobSnapshot, AppError>;
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
    output: Option<StatusOutput>,
}

#[derive(Debug, Deserialize)]
struct StatusOutput {
    images: Option<Vec<String>>,
}

/// HTTP client for the asynchronous rendering service. Both calls are single
/// attempts with bearer-token auth; retrying is the pipeline's business.
#[derive(Debug, Clone)]
pub struct RenderPodClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RenderPodClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }
}

#[async_trait]
impl RenderService for RenderPodClient {
    async fn submit(&self, input: &JobInput) -> Result<SubmitReceipt, AppError> {
        let url = format!("{}/run", self.base_url);
        let body = serde_json::json!({ "input": input });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::upstream(SYSTEM, format!("failed to submit job: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(
                SYSTEM,
                format!("job submission returned {}", response.status()),
            ));
        }

        let body: SubmitBody = response
            .json()
            .await
            .map_err(|e| AppError::upstream(SYSTEM, format!("malformed submission response: {e}")))?;

        let job_id = body
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::upstream(SYSTEM, "submission response missing job id"))?;

        Ok(SubmitReceipt {
            job_id,
            status: body.status,
        })
    }

    async fn status(&self, job_id: &str) -> Result<JobSnapshot, AppError> {
        let url = format!("{}/status/{}", self.base_url, job_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                AppError::upstream(SYSTEM, format!("failed to check status of job {job_id}: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::upstream(
                SYSTEM,
                format!("status check for job {job_id} returned {}", response.status()),
            ));
        }

        let body: StatusBody = response
            .json()
            .await
            .map_err(|e| AppError::upstream(SYSTEM, format!("malformed status response: {e}")))?;

        Ok(JobSnapshot {
            status: body.status,
            images: body.output.and_then(|o| o.images).unwrap_or_default(),
        })
    }
}
