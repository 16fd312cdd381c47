//! Transport boundary.
//!
//! Gateway HTTP and the binary direct protocol live behind this trait;
//! the executor only needs a status pair back from one regional attempt.

use std::future::Future;
use thiserror::Error;
use uuid::Uuid;

use crate::partition::{OperationType, PartitionIdentity, RegionEndpoint};

/// One regional attempt of an operation.
#[derive(Debug, Clone, Copy)]
pub struct RegionRequest<'a> {
    pub activity_id: Uuid,
    pub partition: &'a PartitionIdentity,
    pub region: &'a RegionEndpoint,
    pub operation: OperationType,
    /// 1-based attempt number within the operation.
    pub attempt: u32,
    pub payload: Option<&'a serde_json::Value>,
}

/// Response received from a region.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status_code: u16,
    pub sub_status_code: u32,
    pub body: Option<serde_json::Value>,
}

impl TransportResponse {
    /// A response without a body.
    pub fn new(status_code: u16, sub_status_code: u32) -> Self {
        Self {
            status_code,
            sub_status_code,
            body: None,
        }
    }

    /// Attach a response body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// No response was received from the region.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {region} failed: {reason}")]
    Connection { region: String, reason: String },
}

/// Sends one regional attempt.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &RegionRequest<'_>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}
