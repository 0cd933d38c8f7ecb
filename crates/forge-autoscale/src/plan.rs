//! The reconciler's output: a target worker count per lane (§4.7 rule 4).

use forge_core::job::Lane;

/// The current and desired worker count for one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneTarget {
    pub lane: Lane,
    pub current: u32,
    pub target: u32,
}

impl LaneTarget {
    /// Positive when the lane needs more workers, negative when it has a
    /// surplus, zero when it's already at target.
    pub fn delta(&self) -> i64 {
        self.target as i64 - self.current as i64
    }
}

/// A reconciliation decision the Cluster Controller applies via
/// `ScaleTo(target_per_lane)` (§4.8).
#[derive(Debug, Clone)]
pub struct ScalePlan {
    pub lane_targets: Vec<LaneTarget>,
    pub reason: String,
}

impl ScalePlan {
    pub fn total_current(&self) -> u32 {
        self.lane_targets.iter().map(|t| t.current).sum()
    }

    pub fn total_target(&self) -> u32 {
        self.lane_targets.iter().map(|t| t.target).sum()
    }

    pub fn target_for(&self, lane: Lane) -> Option<u32> {
        self.lane_targets.iter().find(|t| t.lane == lane).map(|t| t.target)
    }

    /// A plan is a no-op when every lane's target equals its current
    /// count, e.g. when the reconciler ran but neither threshold fired.
    pub fn is_no_op(&self) -> bool {
        self.lane_targets.iter().all(|t| t.delta() == 0)
    }
}
