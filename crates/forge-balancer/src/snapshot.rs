//! The read-only inputs the advisor reasons over (§4.6).

use std::collections::HashMap;

use forge_core::job::Lane;
use forge_core::ledger::ResourceLedger;
use forge_queue::LaneStats;

/// Worker-side counts and throughput for one lane, the part of a
/// [`ClusterSnapshot`] the queue manager doesn't already track.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaneWorkerSnapshot {
    pub idle: u32,
    pub processing: u32,
    pub avg_processing_ms: f64,
}

impl LaneWorkerSnapshot {
    pub fn total(&self) -> u32 {
        self.idle + self.processing
    }
}

/// A point-in-time read of everything the load balancer needs: per-lane
/// queue stats, per-lane worker distribution, and resource saturation
/// (§4.6).
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub lane_stats: HashMap<Lane, LaneStats>,
    pub lane_workers: HashMap<Lane, LaneWorkerSnapshot>,
    pub resource: Option<ResourceLedger>,
}

impl ClusterSnapshot {
    pub fn waiting(&self, lane: Lane) -> u32 {
        self.lane_stats.get(&lane).map(|s| s.waiting).unwrap_or(0)
    }

    pub fn workers(&self, lane: Lane) -> LaneWorkerSnapshot {
        self.lane_workers.get(&lane).copied().unwrap_or_default()
    }

    pub fn total_waiting(&self) -> u32 {
        Lane::ALL.iter().map(|&l| self.waiting(l)).sum()
    }
}
