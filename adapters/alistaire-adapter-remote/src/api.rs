//! REST client for the remote job service.
//!
//! | Call | Path |
//! |------|------|
//! | backend info | `GET /backends/{id}` |
//! | submit | `POST /backends/{id}/jobs` |
//! | status | `GET /jobs/{job_id}` |
//! | result | `GET /jobs/{job_id}/result` |
//! | cancel | `DELETE /jobs/{job_id}` |
//!
//! Every request carries `Authorization: Bearer <token>`. Identifiers are
//! percent-encoded as single path segments.

use std::collections::HashMap;
use std::time::Duration;

use alistaire_hal::Credential;
use alistaire_ir::JobDescription;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{RemoteError, RemoteResult};

/// Request timeout applied to every call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connect timeout applied to every call.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client bound to one service and one credential.
pub struct RemoteClient {
    client: Client,
    base_url: String,
    base: Url,
    credential: Credential,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| RemoteError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url));
        }

        Ok(Self {
            client,
            base_url,
            base,
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.credential.expose_secret())
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> RemoteResult<Result<T, Failure>> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        read_body(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &[&str],
        body: &impl Serialize,
    ) -> RemoteResult<Result<T, Failure>> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .header("Authorization", self.auth_header())
            .json(body)
            .send()
            .await?;
        read_body(resp).await
    }

    async fn delete(&self, path: &[&str]) -> RemoteResult<Result<(), Failure>> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);
        let resp = self
            .client
            .delete(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(Ok(()))
        } else {
            Ok(Err(Failure::read(resp).await))
        }
    }

    /// Describe one backend.
    #[instrument(skip(self))]
    pub async fn get_backend(&self, backend_id: &str) -> RemoteResult<BackendInfo> {
        self.get(&["backends", backend_id])
            .await?
            .map_err(|f| match f.status {
                StatusCode::NOT_FOUND => RemoteError::BackendNotFound(backend_id.to_string()),
                _ => f.into_error(),
            })
    }

    /// Submit a job to a backend.
    #[instrument(skip(self, req))]
    pub async fn submit_job(
        &self,
        backend_id: &str,
        req: &SubmitRequest,
    ) -> RemoteResult<SubmitResponse> {
        self.post(&["backends", backend_id, "jobs"], req)
            .await?
            .map_err(|f| match f.status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    RemoteError::Rejected {
                        status: f.status.as_u16(),
                        message: f.message,
                    }
                }
                StatusCode::NOT_FOUND => RemoteError::BackendNotFound(backend_id.to_string()),
                _ => f.into_error(),
            })
    }

    #[instrument(skip(self))]
    pub async fn get_status(&self, job_id: &str) -> RemoteResult<StatusResponse> {
        self.get(&["jobs", job_id])
            .await?
            .map_err(|f| f.or_job_not_found(job_id))
    }

    #[instrument(skip(self))]
    pub async fn get_result(&self, job_id: &str) -> RemoteResult<ResultResponse> {
        self.get(&["jobs", job_id, "result"])
            .await?
            .map_err(|f| f.or_job_not_found(job_id))
    }

    /// Cancel a job; `backend_id` only names the backend in errors.
    #[instrument(skip(self))]
    pub async fn cancel_job(&self, backend_id: &str, job_id: &str) -> RemoteResult<()> {
        self.delete(&["jobs", job_id])
            .await?
            .map_err(|f| match f.status {
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                    RemoteError::CancelUnsupported(backend_id.to_string())
                }
                _ => f.or_job_not_found(job_id),
            })
    }
}

/// A non-success response, kept for per-call classification.
struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    async fn read(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let message = resp.text().await.unwrap_or_default();
        Self { status, message }
    }

    fn into_error(self) -> RemoteError {
        match self.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized {
                status: self.status.as_u16(),
                message: self.message,
            },
            _ => RemoteError::Api {
                status: self.status.as_u16(),
                message: self.message,
            },
        }
    }

    fn or_job_not_found(self, job_id: &str) -> RemoteError {
        match self.status {
            StatusCode::NOT_FOUND | StatusCode::GONE => RemoteError::JobNotFound(job_id.to_string()),
            _ => self.into_error(),
        }
    }
}

/// Decode a success body, or hand back the failure.
async fn read_body<T: DeserializeOwned>(resp: reqwest::Response) -> RemoteResult<Result<T, Failure>> {
    if !resp.status().is_success() {
        return Ok(Err(Failure::read(resp).await));
    }
    let bytes = resp.bytes().await?;
    Ok(Ok(serde_json::from_slice(&bytes)?))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Response of `GET /backends/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendInfo {
    pub id: String,
    pub num_slots: u32,
    pub max_shots: u32,
    #[serde(default)]
    pub simulator: bool,
    /// `online`, `offline`, `maintenance`, ...
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub supports_cancel: bool,
}

impl BackendInfo {
    pub fn is_online(&self) -> bool {
        self.status.as_deref().is_none_or(|s| {
            matches!(s.to_lowercase().as_str(), "online" | "available" | "ready")
        })
    }
}

/// One operation in a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOperation {
    #[serde(rename = "type")]
    pub kind: String,
    pub targets: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<f64>>,
}

/// Request body for `POST /backends/{id}/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub slot_count: u32,
    pub operations: Vec<WireOperation>,
    /// Always `"all"`.
    pub observe: String,
    pub shots: u32,
}

impl SubmitRequest {
    /// Encode a finalized job.
    pub fn from_job(job: &JobDescription, shots: u32) -> Self {
        let operations = job
            .operations()
            .iter()
            .map(|op| {
                let params = op.kind.parameters();
                WireOperation {
                    kind: op.name().to_string(),
                    targets: op.targets.iter().map(|s| s.0).collect(),
                    params: (!params.is_empty()).then_some(params),
                }
            })
            .collect();

        Self {
            slot_count: job.slot_count(),
            operations,
            observe: "all".to_string(),
            shots,
        }
    }
}

/// Response of `POST /backends/{id}/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    #[serde(default)]
    pub status: Option<WireStatus>,
}

/// Job status as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Response of `GET /jobs/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: WireStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of `GET /jobs/{job_id}/result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    pub counts: HashMap<String, u64>,
    pub shots: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alistaire_ir::SlotId;

    #[test]
    fn test_client_debug_redacts_token() {
        let client = RemoteClient::new("https://jobs.example.com/", Credential::new("s3cr3t")).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("s3cr3t"));
        assert_eq!(client.base_url(), "https://jobs.example.com");
    }

    #[test]
    fn test_identifiers_are_single_path_segments() {
        let client =
            RemoteClient::new("https://jobs.example.com/api/v1", Credential::new("t")).unwrap();
        let url = client.url(&["jobs", "a/b?c", "result"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://jobs.example.com/api/v1/jobs/a%2Fb%3Fc/result"
        );

        let root = RemoteClient::new("http://127.0.0.1:8080/", Credential::new("t")).unwrap();
        assert_eq!(
            root.url(&["backends", "sim"]).unwrap().as_str(),
            "http://127.0.0.1:8080/backends/sim"
        );
    }

    #[test]
    fn test_invalid_service_url() {
        assert!(matches!(
            RemoteClient::new("not a url", Credential::new("t")),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_submit_request_encoding() {
        let mut job = JobDescription::new(2).unwrap();
        job.h(SlotId(0)).unwrap();
        job.rz(0.25, SlotId(1)).unwrap();
        job.cx(SlotId(0), SlotId(1)).unwrap();
        job.observe_all().unwrap();

        let req = SubmitRequest::from_job(&job, 1024);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "slot_count": 2,
                "operations": [
                    {"type": "h", "targets": [0]},
                    {"type": "rz", "targets": [1], "params": [0.25]},
                    {"type": "cx", "targets": [0, 1]}
                ],
                "observe": "all",
                "shots": 1024
            })
        );
    }

    #[test]
    fn test_status_parsing() {
        let resp: StatusResponse =
            serde_json::from_str(r#"{"status": "failed", "message": "calibration"}"#).unwrap();
        assert_eq!(resp.status, WireStatus::Failed);
        assert_eq!(resp.message.as_deref(), Some("calibration"));

        assert!(serde_json::from_str::<StatusResponse>(r#"{"status": "exploded"}"#).is_err());
    }

    #[test]
    fn test_backend_info_online() {
        let info: BackendInfo = serde_json::from_str(
            r#"{"id": "ibmq_qasm_simulator", "num_slots": 32, "max_shots": 8192}"#,
        )
        .unwrap();
        assert!(info.is_online());
        assert!(!info.supports_cancel);

        let down = BackendInfo {
            status: Some("maintenance".into()),
            ..info
        };
        assert!(!down.is_online());
    }
}
