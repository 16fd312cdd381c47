//! Cross-region request execution.
//!
//! Drives one logical operation across the route the engine hands out,
//! reporting every regional outcome back so the next route reflects it.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::engine::AvailabilityEngine;
use crate::execution::diagnostics::{AttemptRecord, FinalStatus, OperationDiagnostics};
use crate::execution::error::{ExecutionError, ServiceError};
use crate::execution::transport::{RegionRequest, Transport, TransportResponse};
use crate::health::HealthStatus;
use crate::observability::metrics;
use crate::partition::{OperationType, PartitionIdentity, RegionEndpoint};
use crate::resilience::classify::{status, sub_status};
use crate::resilience::{is_success_status, CancelReason, OutcomeClass, RequestOutcome};

/// Status label used in metrics for operations cut short by the client deadline.
const CLIENT_TIMEOUT_STATUS: u16 = 408;

#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub partition: PartitionIdentity,
    pub operation: OperationType,
    pub payload: Option<serde_json::Value>,
    /// Overrides `timeouts.end_to_end_ms` for this operation.
    pub end_to_end_timeout: Option<Duration>,
}

impl OperationRequest {
    /// A request without payload or timeout override.
    pub fn new(partition: PartitionIdentity, operation: OperationType) -> Self {
        Self {
            partition,
            operation,
            payload: None,
            end_to_end_timeout: None,
        }
    }

    /// Attach a request body.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Override the configured end-to-end deadline.
    pub fn with_end_to_end_timeout(mut self, timeout: Duration) -> Self {
        self.end_to_end_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone)]
pub struct OperationResponse {
    pub status_code: u16,
    pub sub_status_code: u32,
    pub body: Option<serde_json::Value>,
    /// Region that served the response.
    pub region: RegionEndpoint,
    pub diagnostics: OperationDiagnostics,
}

/// Executes operations against a [`Transport`] under engine routing.
pub struct RequestExecutor<T> {
    engine: Arc<AvailabilityEngine>,
    transport: T,
}

impl<T: Transport> RequestExecutor<T> {
    /// Create an executor over an engine and a transport.
    pub fn new(engine: Arc<AvailabilityEngine>, transport: T) -> Self {
        Self { engine, transport }
    }

    /// The engine routing this executor.
    pub fn engine(&self) -> &Arc<AvailabilityEngine> {
        &self.engine
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one operation across the route until it succeeds or fails terminally.
    pub async fn execute(&self, request: OperationRequest) -> Result<OperationResponse, ExecutionError> {
        let started = Instant::now();
        let timeout = request
            .end_to_end_timeout
            .or_else(|| self.engine.config().timeouts.end_to_end());
        let deadline = timeout.map(|t| started + t);

        let activity_id = Uuid::new_v4();
        let partition = &request.partition;
        let operation = request.operation;
        let mut diagnostics = OperationDiagnostics::new(activity_id, operation, partition);

        let route = self.engine.select_route(partition, operation);
        if route.is_empty() {
            return Err(ExecutionError::NoRegions(partition.clone()));
        }

        let mut last_error: Option<ServiceError> = None;

        for (index, region) in route.iter().enumerate() {
            let is_last = index + 1 == route.len();

            let probe = if self.engine.location_status(partition, region, operation) == HealthStatus::HealthyTentative {
                let guard = self.engine.try_begin_probe(partition, region, operation);
                if guard.is_none() && !(is_last && diagnostics.attempts.is_empty()) {
                    tracing::debug!(
                        activity_id = %activity_id,
                        partition = %partition,
                        region = %region,
                        "Probe budget exhausted, skipping tentative region"
                    );
                    continue;
                }
                guard
            } else {
                None
            };

            let region_request = RegionRequest {
                activity_id,
                partition,
                region,
                operation,
                attempt: diagnostics.attempts.len() as u32 + 1,
                payload: request.payload.as_ref(),
            };

            let was_probe = probe.is_some();
            let attempt_started = Instant::now();
            let sent = self.transport.send(&region_request);
            let result = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, sent).await.ok(),
                None => Some(sent.await),
            };
            let attempt_ms = attempt_started.elapsed().as_millis() as u64;

            let Some(result) = result else {
                let report = self.engine.record_outcome(
                    partition,
                    region,
                    operation,
                    RequestOutcome::Cancelled(CancelReason::EndToEndTimeout),
                );
                drop(probe);
                diagnostics.record_attempt(
                    region,
                    AttemptRecord {
                        region: region.name.clone(),
                        status_code: None,
                        sub_status_code: None,
                        outcome: report.class.to_string(),
                        probe: was_probe,
                        duration_ms: attempt_ms,
                    },
                );
                diagnostics.finish(FinalStatus::EndToEndTimeout, started.elapsed());
                tracing::warn!(
                    activity_id = %activity_id,
                    partition = %partition,
                    region = %region,
                    operation = %operation,
                    attempts = diagnostics.attempt_count(),
                    "End-to-end timeout elapsed"
                );
                metrics::record_request(operation, CLIENT_TIMEOUT_STATUS, diagnostics.attempt_count());
                return Err(ExecutionError::EndToEndTimeout {
                    timeout: timeout.unwrap_or_default(),
                    last_error,
                    diagnostics: Box::new(diagnostics),
                });
            };

            let response = match result {
                Ok(response) => response,
                Err(err) => {
                    tracing::debug!(
                        activity_id = %activity_id,
                        region = %region,
                        error = %err,
                        "Transport failure treated as service unavailable"
                    );
                    TransportResponse {
                        status_code: status::SERVICE_UNAVAILABLE,
                        sub_status_code: sub_status::UNKNOWN,
                        body: Some(serde_json::Value::String(err.to_string())),
                    }
                }
            };

            let outcome = if is_success_status(response.status_code) {
                RequestOutcome::Success
            } else {
                RequestOutcome::failure(response.status_code, response.sub_status_code)
            };
            let report = self.engine.record_outcome(partition, region, operation, outcome);
            drop(probe);

            tracing::debug!(
                activity_id = %activity_id,
                partition = %partition,
                region = %region,
                operation = %operation,
                status_code = response.status_code,
                sub_status_code = response.sub_status_code,
                outcome = %report.class,
                probe = was_probe,
                "Regional attempt completed"
            );

            diagnostics.record_attempt(
                region,
                AttemptRecord {
                    region: region.name.clone(),
                    status_code: Some(response.status_code),
                    sub_status_code: Some(response.sub_status_code),
                    outcome: report.class.to_string(),
                    probe: was_probe,
                    duration_ms: attempt_ms,
                },
            );

            match report.class {
                OutcomeClass::Success => {
                    diagnostics.finish(
                        FinalStatus::Completed {
                            status_code: response.status_code,
                            sub_status_code: response.sub_status_code,
                        },
                        started.elapsed(),
                    );
                    metrics::record_request(operation, response.status_code, diagnostics.attempt_count());
                    return Ok(OperationResponse {
                        status_code: response.status_code,
                        sub_status_code: response.sub_status_code,
                        body: response.body,
                        region: region.clone(),
                        diagnostics,
                    });
                }
                OutcomeClass::Eligible(_) => {
                    last_error = Some(service_error(region, &response));
                }
                _ => {
                    return Err(self.fail(operation, service_error(region, &response), diagnostics, started));
                }
            }
        }

        match last_error {
            Some(error) => Err(self.fail(operation, error, diagnostics, started)),
            // Every candidate was a tentative region another request is already probing.
            None => Err(ExecutionError::NoRegions(partition.clone())),
        }
    }

    fn fail(
        &self,
        operation: OperationType,
        error: ServiceError,
        mut diagnostics: OperationDiagnostics,
        started: Instant,
    ) -> ExecutionError {
        diagnostics.finish(
            FinalStatus::Completed {
                status_code: error.status_code,
                sub_status_code: error.sub_status_code,
            },
            started.elapsed(),
        );
        tracing::info!(
            activity_id = %diagnostics.activity_id,
            partition = %diagnostics.partition,
            operation = %operation,
            status_code = error.status_code,
            sub_status_code = error.sub_status_code,
            regions = ?diagnostics.contacted_regions,
            "Operation failed"
        );
        metrics::record_request(operation, error.status_code, diagnostics.attempt_count());
        ExecutionError::Service {
            error,
            diagnostics: Box::new(diagnostics),
        }
    }
}

fn service_error(region: &RegionEndpoint, response: &TransportResponse) -> ServiceError {
    let message = match &response.body {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| status_reason(response.status_code).to_string()),
        _ => status_reason(response.status_code).to_string(),
    };
    ServiceError {
        region: region.name.clone(),
        status_code: response.status_code,
        sub_status_code: response.sub_status_code,
        message,
    }
}

fn status_reason(status_code: u16) -> &'static str {
    match status_code {
        status::BAD_REQUEST => "Bad Request",
        status::FORBIDDEN => "Forbidden",
        status::NOT_FOUND => "Not Found",
        status::CONFLICT => "Conflict",
        status::GONE => "Gone",
        status::TOO_MANY_REQUESTS => "Too Many Requests",
        status::INTERNAL_SERVER_ERROR => "Internal Server Error",
        status::SERVICE_UNAVAILABLE => "Service Unavailable",
        _ => "Request Failed",
    }
}
