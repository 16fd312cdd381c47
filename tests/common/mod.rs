//! Shared utilities for integration and load testing.

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use partition_failover::config::RegionConfig;
use partition_failover::execution::{RegionRequest, TransportError, TransportResponse};
use partition_failover::{ClientConfig, OperationKind, PartitionIdentity, Transport};

/// What a region does with a request.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum Behavior {
    Respond(u16, u32),
    /// Sleep, then answer 200.
    Stall(Duration),
    Disconnect,
}

/// In-memory transport scripted per (region, operation kind).
///
/// Regions without a script answer 200.
#[derive(Default)]
pub struct ScriptedTransport {
    behaviors: DashMap<(String, OperationKind), Behavior>,
    calls: DashMap<String, AtomicUsize>,
    log: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, region: &str, behavior: Behavior) {
        self.set_for(region, OperationKind::Read, behavior);
        self.set_for(region, OperationKind::Write, behavior);
    }

    pub fn set_for(&self, region: &str, kind: OperationKind, behavior: Behavior) {
        self.behaviors.insert((region.to_string(), kind), behavior);
    }

    pub fn calls(&self, region: &str) -> usize {
        self.calls
            .get(region)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Regions contacted so far, in call order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: &RegionRequest<'_>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        let region = request.region.name.clone();
        let behavior = self
            .behaviors
            .get(&(region.clone(), request.operation.kind()))
            .map(|b| *b)
            .unwrap_or(Behavior::Respond(200, 0));

        self.calls
            .entry(region.clone())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(region.clone());

        async move {
            match behavior {
                Behavior::Respond(status, sub_status) => Ok(TransportResponse::new(status, sub_status)),
                Behavior::Stall(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(TransportResponse::new(200, 0))
                }
                Behavior::Disconnect => Err(TransportError::Connection {
                    region,
                    reason: "connection reset by peer".into(),
                }),
            }
        }
    }
}

/// Two-region account, preferred order A then B.
pub fn two_region_config() -> ClientConfig {
    ClientConfig {
        regions: vec![
            RegionConfig::new("A", "https://acct-a.documents.example.com/"),
            RegionConfig::new("B", "https://acct-b.documents.example.com/"),
        ],
        preferred_regions: vec!["A".into(), "B".into()],
        ..Default::default()
    }
}

pub fn partition() -> PartitionIdentity {
    PartitionIdentity::new("dbs/orders/colls/items", "3")
}
