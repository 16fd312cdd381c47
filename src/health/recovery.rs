//! Time-driven recovery of unavailable locations.
//!
//! # Responsibilities
//! - Move `Unavailable` kinds to `HealthyTentative` once the cooldown elapsed
//! - Evaluate lazily on access and on a periodic sweep
//!
//! # Design Decisions
//! - Pure function of `now - unavailable_since`; no sleeping threads
//! - Runs under the context lock, so concurrent callers transition once
//! - Contexts still inside their cooldown are left untouched

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::CircuitBreakerConfig;
use crate::health::state::{HealthStatus, KindHealth, LocationHealthContext};
use crate::health::store::HealthRecordStore;
use crate::observability::metrics;
use crate::partition::OperationKind;

const KINDS: [OperationKind; 2] = [OperationKind::Read, OperationKind::Write];

/// Cooldown evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryProber {
    cooldown: Duration,
}

impl RecoveryProber {
    /// Create a prober with the given cooldown.
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    /// Transition one kind if its cooldown has elapsed. Returns true on transition.
    pub fn evaluate(&self, health: &mut KindHealth, now: Instant) -> bool {
        if health.status != HealthStatus::Unavailable {
            return false;
        }
        let Some(since) = health.unavailable_since else {
            return false;
        };
        if now.saturating_duration_since(since) < self.cooldown {
            return false;
        }
        health.status = HealthStatus::HealthyTentative;
        health.probes_in_flight = 0;
        true
    }

    /// Evaluate both kinds of a context. Returns the kinds that transitioned.
    pub fn evaluate_context(&self, ctx: &mut LocationHealthContext, now: Instant) -> Vec<OperationKind> {
        KINDS
            .into_iter()
            .filter(|kind| self.evaluate(ctx.kind_mut(*kind), now))
            .collect()
    }

    /// Evaluate every unavailable record in the store. Returns the number
    /// of kind transitions performed.
    pub fn sweep(&self, store: &HealthRecordStore, now: Instant) -> usize {
        let mut transitions = 0;
        for key in store.unavailable_keys() {
            let recovered = store
                .update_existing(&key, |ctx| self.evaluate_context(ctx, now))
                .unwrap_or_default();
            for kind in &recovered {
                tracing::info!(location = %key, kind = %kind, "Location cooldown elapsed, allowing probe traffic");
                metrics::record_breaker_transition(*kind, HealthStatus::Unavailable, HealthStatus::HealthyTentative);
            }
            transitions += recovered.len();
        }
        transitions
    }
}

/// Cooldown and sweep cadence, swapped as a unit on reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverySettings {
    pub cooldown: Duration,
    pub sweep_interval: Duration,
}

impl RecoverySettings {
    /// Settings carried by a breaker configuration.
    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self {
            cooldown: config.cooldown(),
            sweep_interval: config.sweep_interval(),
        }
    }
}

/// Background task running the recovery sweep on an interval.
///
/// Settings are loaded on every tick, so a reconfiguration takes effect
/// from the next sweep without restarting the task.
pub struct RecoverySweeper {
    store: Arc<HealthRecordStore>,
    settings: Arc<ArcSwap<RecoverySettings>>,
}

impl RecoverySweeper {
    /// Create a sweeper over a store and a shared settings cell.
    pub fn new(store: Arc<HealthRecordStore>, settings: Arc<ArcSwap<RecoverySettings>>) -> Self {
        Self { store, settings }
    }

    /// Sweep until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = self.settings.load().sweep_interval;
        tracing::info!(interval = ?interval, "Recovery sweeper starting");

        let mut ticker = sweep_ticker(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let settings = **self.settings.load();
                    let recovered = RecoveryProber::new(settings.cooldown).sweep(&self.store, Instant::now());
                    if recovered > 0 {
                        tracing::debug!(recovered, "Recovery sweep complete");
                    }
                    metrics::record_tracked_locations(self.store.len());

                    if settings.sweep_interval != interval {
                        tracing::info!(from = ?interval, to = ?settings.sweep_interval, "Recovery sweep interval changed");
                        interval = settings.sweep_interval;
                        ticker = delayed_sweep_ticker(interval);
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Recovery sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

fn sweep_ticker(period: Duration) -> time::Interval {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    ticker
}

/// Like `sweep_ticker`, without the immediate first tick.
fn delayed_sweep_ticker(period: Duration) -> time::Interval {
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    ticker
}
