//! Execution error types.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::execution::diagnostics::OperationDiagnostics;
use crate::partition::PartitionIdentity;

/// A status pair returned by a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    pub region: String,
    pub status_code: u16,
    pub sub_status_code: u32,
    pub message: String,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} from {}: {}",
            self.status_code, self.sub_status_code, self.region, self.message
        )
    }
}

/// Terminal failure of an operation.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The last real error a region returned.
    #[error("operation failed with {error}")]
    Service {
        error: ServiceError,
        diagnostics: Box<OperationDiagnostics>,
    },

    #[error("end-to-end timeout of {timeout:?} elapsed{}", last_error_suffix(.last_error))]
    EndToEndTimeout {
        timeout: Duration,
        last_error: Option<ServiceError>,
        diagnostics: Box<OperationDiagnostics>,
    },

    #[error("no regions configured for partition {0}")]
    NoRegions(PartitionIdentity),
}

fn last_error_suffix(last_error: &Option<ServiceError>) -> String {
    match last_error {
        Some(error) => format!(" (last error {})", error),
        None => String::new(),
    }
}

impl ExecutionError {
    /// Diagnostics of the failed operation, when any attempt was made.
    pub fn diagnostics(&self) -> Option<&OperationDiagnostics> {
        match self {
            ExecutionError::Service { diagnostics, .. } | ExecutionError::EndToEndTimeout { diagnostics, .. } => {
                Some(diagnostics)
            }
            ExecutionError::NoRegions(_) => None,
        }
    }

    /// The last status pair a region returned, if any.
    pub fn last_service_error(&self) -> Option<&ServiceError> {
        match self {
            ExecutionError::Service { error, .. } => Some(error),
            ExecutionError::EndToEndTimeout { last_error, .. } => last_error.as_ref(),
            ExecutionError::NoRegions(_) => None,
        }
    }
}
