//! The advisory computation itself (§4.6).

use forge_core::job::Lane;
use serde::{Deserialize, Serialize};

use crate::snapshot::ClusterSnapshot;

/// A lane the autoscaler should weigh more heavily in its next scaling
/// decision, together with the reasoning the recommendation carries for
/// operators reading the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    NoChange { reason: String },
    ScaleUp { n: u32, lane_hint: Lane, reason: String },
    ScaleDown { n: u32, lane_hint: Lane, reason: String },
    Rebalance { lane_hint: Lane, reason: String },
}

impl Recommendation {
    pub fn reason(&self) -> &str {
        match self {
            Self::NoChange { reason }
            | Self::ScaleUp { reason, .. }
            | Self::ScaleDown { reason, .. }
            | Self::Rebalance { reason, .. } => reason,
        }
    }
}

/// A backlog-per-worker ratio above this means a lane is falling behind
/// fast enough to deserve a scale-up hint ahead of the autoscaler's own
/// threshold check (§4.6/§4.7).
const BACKLOG_PER_WORKER_HOT: f64 = 3.0;

/// A lane with no backlog and at least this many idle workers is a
/// scale-down candidate.
const IDLE_SURPLUS_THRESHOLD: u32 = 2;

/// Resource saturation at or above this utilization overrides a
/// lane-local scale-up hint: admitting more concurrency wouldn't help, so
/// the advisor reports `NoChange` instead of recommending growth it knows
/// RAG would reject (§4.2/§4.6).
const RESOURCE_SATURATION_OVERRIDE: f64 = 0.95;

/// The pure, side-effect-free recommendation engine (§4.6). Holds no
/// state across calls — every recommendation is a function of the
/// snapshot passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalancer;

impl LoadBalancer {
    pub fn new() -> Self {
        Self
    }

    /// Computes one recommendation from `snapshot` (§4.6). Never mutates
    /// anything; the autoscaler decides whether and how to act on it.
    #[tracing::instrument(skip(self, snapshot), target = "forge_balancer::recommend")]
    pub fn recommend(&self, snapshot: &ClusterSnapshot) -> Recommendation {
        if let Some(ledger) = snapshot.resource {
            if ledger.paused || ledger.concurrency_utilization() >= RESOURCE_SATURATION_OVERRIDE {
                return Recommendation::NoChange {
                    reason: "resource ledger saturated, scaling would not relieve backlog".into(),
                };
            }
        }

        if let Some(hottest) = self.hottest_lane(snapshot) {
            return hottest;
        }

        if let Some(coldest) = self.coldest_lane(snapshot) {
            return coldest;
        }

        if let Some(rebalance) = self.imbalance(snapshot) {
            return rebalance;
        }

        Recommendation::NoChange {
            reason: "queue depth and worker distribution within normal bounds".into(),
        }
    }

    /// The lane with the worst backlog-per-worker ratio, if any lane is
    /// hot enough to warrant a scale-up hint.
    fn hottest_lane(&self, snapshot: &ClusterSnapshot) -> Option<Recommendation> {
        let mut worst: Option<(Lane, f64, u32)> = None;

        for lane in Lane::ALL {
            let waiting = snapshot.waiting(lane);
            if waiting == 0 {
                continue;
            }
            let workers = snapshot.workers(lane);
            let denom = workers.total().max(1) as f64;
            let ratio = waiting as f64 / denom;

            if ratio >= BACKLOG_PER_WORKER_HOT {
                let is_worse = worst.map(|(_, best, _)| ratio > best).unwrap_or(true);
                if is_worse {
                    worst = Some((lane, ratio, waiting));
                }
            }
        }

        worst.map(|(lane, ratio, waiting)| {
            let n = (ratio / BACKLOG_PER_WORKER_HOT).ceil().max(1.0) as u32;
            Recommendation::ScaleUp {
                n,
                lane_hint: lane,
                reason: format!(
                    "{lane} has {waiting} waiting against a backlog-per-worker ratio of {ratio:.1}"
                ),
            }
        })
    }

    /// A lane with no backlog and a surplus of idle workers, if any.
    fn coldest_lane(&self, snapshot: &ClusterSnapshot) -> Option<Recommendation> {
        let mut best: Option<(Lane, u32)> = None;

        for lane in Lane::ALL {
            if snapshot.waiting(lane) != 0 {
                continue;
            }
            let workers = snapshot.workers(lane);
            if workers.idle < IDLE_SURPLUS_THRESHOLD {
                continue;
            }
            let surplus = workers.idle - IDLE_SURPLUS_THRESHOLD + 1;
            if best.map(|(_, s)| surplus > s).unwrap_or(true) {
                best = Some((lane, surplus));
            }
        }

        best.map(|(lane, surplus)| Recommendation::ScaleDown {
            n: surplus,
            lane_hint: lane,
            reason: format!("{lane} is idle with no backlog, {surplus} workers are surplus"),
        })
    }

    /// Detects sustained imbalance: one lane starved of capacity while
    /// another sits fully idle, neither hot nor cold enough to trigger
    /// the checks above on its own (Design Notes open question 2: the
    /// remedy for cross-lane starvation lives at the scaler).
    fn imbalance(&self, snapshot: &ClusterSnapshot) -> Option<Recommendation> {
        let starved = Lane::ALL
            .into_iter()
            .find(|&lane| snapshot.waiting(lane) > 0 && snapshot.workers(lane).total() == 0)?;

        Some(Recommendation::Rebalance {
            lane_hint: starved,
            reason: format!("{starved} has waiting work but no workers assigned"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::LaneWorkerSnapshot;
    use forge_queue::LaneStats;

    fn snapshot_with(lane: Lane, waiting: u32, idle: u32, processing: u32) -> ClusterSnapshot {
        let mut snapshot = ClusterSnapshot::default();
        snapshot.lane_stats.insert(
            lane,
            LaneStats {
                waiting,
                ..Default::default()
            },
        );
        snapshot.lane_workers.insert(
            lane,
            LaneWorkerSnapshot {
                idle,
                processing,
                avg_processing_ms: 500.0,
            },
        );
        snapshot
    }

    #[test]
    fn no_backlog_and_balanced_workers_recommends_no_change() {
        let mut snapshot = ClusterSnapshot::default();
        for lane in Lane::ALL {
            snapshot.lane_workers.insert(
                lane,
                LaneWorkerSnapshot {
                    idle: 1,
                    processing: 1,
                    avg_processing_ms: 200.0,
                },
            );
        }
        let lb = LoadBalancer::new();
        assert!(matches!(lb.recommend(&snapshot), Recommendation::NoChange { .. }));
    }

    #[test]
    fn hot_backlog_recommends_scale_up_for_that_lane() {
        let snapshot = snapshot_with(Lane::Normal, 20, 1, 1);
        let lb = LoadBalancer::new();
        match lb.recommend(&snapshot) {
            Recommendation::ScaleUp { lane_hint, .. } => assert_eq!(lane_hint, Lane::Normal),
            other => panic!("expected ScaleUp, got {other:?}"),
        }
    }

    #[test]
    fn idle_surplus_with_no_backlog_recommends_scale_down() {
        let snapshot = snapshot_with(Lane::Premium, 0, 4, 0);
        let lb = LoadBalancer::new();
        match lb.recommend(&snapshot) {
            Recommendation::ScaleDown { lane_hint, .. } => assert_eq!(lane_hint, Lane::Premium),
            other => panic!("expected ScaleDown, got {other:?}"),
        }
    }

    #[test]
    fn starved_lane_with_zero_workers_recommends_rebalance() {
        let snapshot = snapshot_with(Lane::Large, 1, 0, 0);
        let lb = LoadBalancer::new();
        match lb.recommend(&snapshot) {
            Recommendation::Rebalance { lane_hint, .. } => assert_eq!(lane_hint, Lane::Large),
            other => panic!("expected Rebalance, got {other:?}"),
        }
    }

    #[test]
    fn saturated_resource_ledger_overrides_scale_up() {
        let mut snapshot = snapshot_with(Lane::Normal, 50, 1, 1);
        snapshot.resource = Some(forge_core::ledger::ResourceLedger {
            active_jobs: 10,
            mem_estimate_bytes: 0,
            large_in_flight: 0,
            paused: false,
            max_concurrent: 10,
            mem_ceiling_bytes: 1,
            large_threshold_bytes: 1,
            max_large_concurrent: 1,
        });
        let lb = LoadBalancer::new();
        assert!(matches!(lb.recommend(&snapshot), Recommendation::NoChange { .. }));
    }
}
