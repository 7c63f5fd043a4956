//! Remote backend implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use alistaire_hal::{
    Backend, BackendAvailability, BackendConnector, Capabilities, Counts, Credential,
    ExecutionResult, HalError, HalResult, JobId, JobStatus,
};
use alistaire_ir::JobDescription;

use crate::api::{BackendInfo, RemoteClient, SubmitRequest, WireStatus};
use crate::error::RemoteResult;

/// Diagnostic used when a failed job carries no message.
const NO_DIAGNOSTIC: &str = "backend reported failure without a diagnostic";

/// A backend hosted by a remote job service.
///
/// Capabilities are fetched once, when the backend is connected. Job state
/// lives on the service; every status call asks it.
pub struct RemoteBackend {
    client: RemoteClient,
    name: String,
    capabilities: Capabilities,
}

impl RemoteBackend {
    /// Fetch the backend description and build a backend from it.
    #[instrument(skip(client), fields(base_url = %client.base_url()))]
    pub async fn connect(client: RemoteClient, backend_id: &str) -> RemoteResult<Self> {
        let info = client.get_backend(backend_id).await?;
        debug!(
            "Backend {}: {} slots, max {} shots",
            info.id, info.num_slots, info.max_shots
        );
        Ok(Self {
            client,
            name: backend_id.to_string(),
            capabilities: build_capabilities(&info),
        })
    }
}

fn build_capabilities(info: &BackendInfo) -> Capabilities {
    let caps = Capabilities::remote(info.id.clone(), info.num_slots, info.max_shots)
        .with_cancel(info.supports_cancel);
    Capabilities {
        is_simulator: info.simulator,
        ..caps
    }
}

fn to_job_status(status: WireStatus, message: Option<String>) -> JobStatus {
    match status {
        WireStatus::Queued => JobStatus::Submitted,
        WireStatus::Running => JobStatus::Running,
        WireStatus::Completed => JobStatus::Completed,
        WireStatus::Failed => {
            JobStatus::Failed(message.unwrap_or_else(|| NO_DIAGNOSTIC.to_string()))
        }
        WireStatus::Cancelled => JobStatus::Cancelled,
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self))]
    async fn availability(&self) -> HalResult<BackendAvailability> {
        let info = self.client.get_backend(&self.name).await?;
        if info.is_online() {
            Ok(BackendAvailability {
                is_available: true,
                queue_depth: None,
                estimated_wait: None,
                status_message: info.status,
            })
        } else {
            Ok(BackendAvailability::unavailable(
                info.status.unwrap_or_else(|| "offline".into()),
            ))
        }
    }

    #[instrument(skip(self, job), fields(backend = %self.name))]
    async fn submit(&self, job: &JobDescription, shots: u32) -> HalResult<JobId> {
        info!(
            "Submitting job to {}: {} slots, {} operations, {} shots",
            self.name,
            job.slot_count(),
            job.len(),
            shots
        );

        let req = SubmitRequest::from_job(job, shots);
        let response = self.client.submit_job(&self.name, &req).await?;

        if let Some(status) = response.status {
            if status != WireStatus::Queued {
                debug!("Service reported initial status {:?}", status);
            }
        }

        let job_id = JobId::new(response.job_id);
        info!("Job submitted: {}", job_id);
        Ok(job_id)
    }

    #[instrument(skip(self))]
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let response = self.client.get_status(&job_id.0).await?;
        Ok(to_job_status(response.status, response.message))
    }

    #[instrument(skip(self))]
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let response = self.client.get_result(&job_id.0).await?;
        Ok(ExecutionResult::new(
            Counts::from_pairs(response.counts),
            response.shots,
        ))
    }

    #[instrument(skip(self))]
    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        if !self.capabilities.supports_cancel {
            return Err(HalError::CancellationUnsupported(self.name.clone()));
        }
        self.client.cancel_job(&self.name, &job_id.0).await?;
        info!("Job cancelled: {}", job_id);
        Ok(())
    }
}

/// Connects backend identifiers to a remote service at `base_url`.
#[derive(Debug, Clone)]
pub struct RemoteConnector {
    base_url: String,
}

impl RemoteConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl BackendConnector for RemoteConnector {
    async fn connect(
        &self,
        credential: &Credential,
        backend_id: &str,
    ) -> HalResult<Arc<dyn Backend>> {
        let client = RemoteClient::new(self.base_url.clone(), credential.clone())?;
        let backend = RemoteBackend::connect(client, backend_id).await?;
        Ok(Arc::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_status_mapping() {
        assert_eq!(to_job_status(WireStatus::Queued, None), JobStatus::Submitted);
        assert_eq!(
            to_job_status(WireStatus::Failed, Some("boom".into())),
            JobStatus::Failed("boom".into())
        );
        assert_eq!(
            to_job_status(WireStatus::Failed, None),
            JobStatus::Failed(NO_DIAGNOSTIC.into())
        );
    }

    #[test]
    fn test_capabilities_from_info() {
        let info = BackendInfo {
            id: "ibmq_qasm_simulator".into(),
            num_slots: 32,
            max_shots: 8192,
            simulator: true,
            status: Some("online".into()),
            supports_cancel: true,
        };
        let caps = build_capabilities(&info);
        assert_eq!(caps.name, "ibmq_qasm_simulator");
        assert_eq!(caps.num_slots, 32);
        assert!(caps.is_simulator);
        assert!(caps.supports_cancel);
    }
}
