//! The reconciliation rules themselves (§4.7).

use forge_balancer::{ClusterSnapshot, LoadBalancer, Recommendation};
use forge_core::clock::Debounce;
use forge_core::job::Lane;
use jiff::Timestamp;

use crate::config::AutoscaleConfig;
use crate::plan::{LaneTarget, ScalePlan};

const TRACING_TARGET_AUTOSCALE: &str = "forge_autoscale::engine";

/// Lane preference order when removing idle workers on scale-down:
/// Normal first, then Large, Premium last (§4.7 rule 3 — "Normal-lane
/// idle workers are preferred over Premium").
const SCALE_DOWN_PREFERENCE: [Lane; 3] = [Lane::Normal, Lane::Large, Lane::Premium];

/// The stateful side of the autoscaler: owns the debounce clock and the
/// pure advisor, and turns one snapshot into at most one [`ScalePlan`]
/// per cycle (§4.7, §4.8).
pub struct Autoscaler {
    config: AutoscaleConfig,
    debounce: Debounce,
    balancer: LoadBalancer,
}

impl Autoscaler {
    pub fn new(config: AutoscaleConfig) -> Self {
        Self {
            debounce: Debounce::new(config.scale_debounce()),
            config,
            balancer: LoadBalancer::new(),
        }
    }

    pub fn config(&self) -> &AutoscaleConfig {
        &self.config
    }

    /// Replaces the live configuration (`UpdateConfig`, §4.8). Takes
    /// effect at the next cycle; does not reset the debounce clock, so a
    /// config change cannot itself be used to bypass it.
    pub fn update_config(&mut self, config: AutoscaleConfig) {
        self.config = config;
    }

    /// Runs one reconciliation cycle (§4.7 rules 1-4). `now` drives both
    /// the debounce check and is forwarded to the caller for logging;
    /// `current` is this cycle's per-lane worker snapshot, already
    /// folded into `snapshot`.
    #[tracing::instrument(skip(self, snapshot), target = "forge_autoscale::engine")]
    pub fn reconcile(&mut self, now: Timestamp, snapshot: &ClusterSnapshot) -> Option<ScalePlan> {
        if !self.debounce.try_fire(now) {
            tracing::trace!(target: TRACING_TARGET_AUTOSCALE, "debounced, skipping cycle");
            return None;
        }

        let recommendation = self.balancer.recommend(snapshot);
        let total_waiting = snapshot.total_waiting();
        let current_total: u32 = Lane::ALL.iter().map(|&l| snapshot.workers(l).total()).sum();

        let plan = if total_waiting > self.config.scale_up_threshold {
            Some(self.scale_up_plan(snapshot, &recommendation, current_total, total_waiting))
        } else if total_waiting < self.config.scale_down_threshold {
            Some(self.scale_down_plan(snapshot, current_total, total_waiting))
        } else {
            None
        };

        if let Some(plan) = &plan {
            tracing::info!(
                target: TRACING_TARGET_AUTOSCALE,
                total_waiting,
                current_total,
                target_total = plan.total_target(),
                reason = %plan.reason,
                "reconciled worker count"
            );
        }

        plan
    }

    /// §4.7 rule 2: grow the pool, biasing new capacity toward Premium
    /// when the backlog is premium-heavy.
    fn scale_up_plan(
        &self,
        snapshot: &ClusterSnapshot,
        recommendation: &Recommendation,
        current_total: u32,
        total_waiting: u32,
    ) -> ScalePlan {
        let grow_by = div_ceil(total_waiting, 5);
        let new_total = (current_total + grow_by).min(self.config.max_workers).max(self.config.min_workers);
        let added = new_total.saturating_sub(current_total);

        let premium_waiting = snapshot.waiting(Lane::Premium);
        let premium_share = 2u32.max(div_ceil(premium_waiting, 3)).min(added);

        let mut order = vec![Lane::Premium];
        if let Recommendation::ScaleUp { lane_hint, .. } | Recommendation::Rebalance { lane_hint, .. } =
            recommendation
        {
            if !order.contains(lane_hint) {
                order.insert(0, *lane_hint);
            }
        }
        for lane in Lane::ALL {
            if !order.contains(&lane) {
                order.push(lane);
            }
        }

        let mut allocation: Vec<(Lane, u32)> = order.iter().map(|&l| (l, 0)).collect();
        allocation[position(&allocation, Lane::Premium)].1 += premium_share;

        let mut remaining = added - premium_share;
        let mut idx = 0;
        while remaining > 0 {
            let lane_idx = idx % allocation.len();
            allocation[lane_idx].1 += 1;
            remaining -= 1;
            idx += 1;
        }

        let lane_targets = Lane::ALL
            .iter()
            .map(|&lane| {
                let current = snapshot.workers(lane).total();
                let grant = allocation.iter().find(|(l, _)| *l == lane).map(|(_, n)| *n).unwrap_or(0);
                LaneTarget {
                    lane,
                    current,
                    target: current + grant,
                }
            })
            .collect();

        ScalePlan {
            lane_targets,
            reason: format!(
                "{total_waiting} jobs waiting exceeds scale-up threshold of {}; {}",
                self.config.scale_up_threshold,
                recommendation.reason()
            ),
        }
    }

    /// §4.7 rule 3: shrink the pool by removing only Idle workers,
    /// Normal lane first, never dipping below `normal_worker_floor` or
    /// `min_workers` in total.
    fn scale_down_plan(&self, snapshot: &ClusterSnapshot, current_total: u32, total_waiting: u32) -> ScalePlan {
        let slack = current_total.saturating_sub(total_waiting);
        let shrink_by = div_ceil(slack, 3);
        let new_total = current_total.saturating_sub(shrink_by).max(self.config.min_workers);
        let mut remaining_to_remove = current_total.saturating_sub(new_total);

        let mut targets: Vec<LaneTarget> = Lane::ALL
            .iter()
            .map(|&lane| LaneTarget {
                lane,
                current: snapshot.workers(lane).total(),
                target: snapshot.workers(lane).total(),
            })
            .collect();

        for &lane in &SCALE_DOWN_PREFERENCE {
            if remaining_to_remove == 0 {
                break;
            }
            let idx = position(&targets.iter().map(|t| (t.lane, ())).collect::<Vec<_>>(), lane);
            let idle = snapshot.workers(lane).idle;
            let floor = if lane == Lane::Normal { self.config.normal_worker_floor } else { 0 };
            let headroom = targets[idx].current.saturating_sub(floor);
            let removable = idle.min(headroom).min(remaining_to_remove);

            targets[idx].target -= removable;
            remaining_to_remove -= removable;
        }

        ScalePlan {
            lane_targets: targets,
            reason: format!(
                "{total_waiting} jobs waiting is below scale-down threshold of {}",
                self.config.scale_down_threshold
            ),
        }
    }
}

fn div_ceil(n: u32, d: u32) -> u32 {
    n.div_ceil(d)
}

fn position<T: PartialEq>(items: &[(Lane, T)], lane: Lane) -> usize {
    items.iter().position(|(l, _)| *l == lane).expect("lane present in fixed-size allocation table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_balancer::LaneWorkerSnapshot;
    use forge_queue::LaneStats;

    fn snapshot(entries: &[(Lane, u32, u32, u32)]) -> ClusterSnapshot {
        let mut snapshot = ClusterSnapshot::default();
        for &(lane, waiting, idle, processing) in entries {
            snapshot.lane_stats.insert(lane, LaneStats { waiting, ..Default::default() });
            snapshot.lane_workers.insert(
                lane,
                LaneWorkerSnapshot {
                    idle,
                    processing,
                    avg_processing_ms: 400.0,
                },
            );
        }
        snapshot
    }

    #[test]
    fn within_bounds_produces_no_plan() {
        let snap = snapshot(&[(Lane::Premium, 1, 1, 1), (Lane::Normal, 5, 2, 2), (Lane::Large, 0, 1, 0)]);
        let mut autoscaler = Autoscaler::new(AutoscaleConfig::default());
        let now = Timestamp::now();
        assert!(autoscaler.reconcile(now, &snap).is_none());
    }

    #[test]
    fn heavy_backlog_scales_up_and_biases_premium() {
        let snap = snapshot(&[(Lane::Premium, 30, 0, 2), (Lane::Normal, 20, 1, 3), (Lane::Large, 0, 1, 0)]);
        let mut autoscaler = Autoscaler::new(AutoscaleConfig::default());
        let now = Timestamp::now();
        let plan = autoscaler.reconcile(now, &snap).expect("expected scale-up plan");
        assert!(plan.total_target() > plan.total_current());
        let premium = plan.lane_targets.iter().find(|t| t.lane == Lane::Premium).unwrap();
        assert!(premium.target > premium.current);
    }

    #[test]
    fn light_backlog_scales_down_idle_normal_workers_first() {
        let snap = snapshot(&[(Lane::Premium, 0, 3, 1), (Lane::Normal, 0, 4, 1), (Lane::Large, 0, 0, 0)]);
        let mut autoscaler = Autoscaler::new(AutoscaleConfig {
            min_workers: 2,
            ..AutoscaleConfig::default()
        });
        let now = Timestamp::now();
        let plan = autoscaler.reconcile(now, &snap).expect("expected scale-down plan");
        assert!(plan.total_target() < plan.total_current());

        let normal = plan.lane_targets.iter().find(|t| t.lane == Lane::Normal).unwrap();
        let premium = plan.lane_targets.iter().find(|t| t.lane == Lane::Premium).unwrap();
        assert!(normal.delta() <= 0);
        assert!(normal.target >= autoscaler.config().normal_worker_floor);
        assert_eq!(premium.target, premium.current, "premium should be untouched while normal has idle slack");
    }

    #[test]
    fn scale_down_never_drops_below_min_workers() {
        let snap = snapshot(&[(Lane::Premium, 0, 1, 0), (Lane::Normal, 0, 1, 0), (Lane::Large, 0, 1, 0)]);
        let mut autoscaler = Autoscaler::new(AutoscaleConfig {
            min_workers: 3,
            ..AutoscaleConfig::default()
        });
        let now = Timestamp::now();
        let plan = autoscaler.reconcile(now, &snap).expect("expected scale-down plan");
        assert!(plan.total_target() >= 3);
    }

    #[test]
    fn debounce_suppresses_back_to_back_cycles() {
        let snap = snapshot(&[(Lane::Normal, 50, 0, 1)]);
        let mut autoscaler = Autoscaler::new(AutoscaleConfig::default());
        let t0 = Timestamp::now();

        assert!(autoscaler.reconcile(t0, &snap).is_some());
        assert!(autoscaler.reconcile(t0 + jiff::SignedDuration::from_secs(1), &snap).is_none());
        assert!(autoscaler
            .reconcile(t0 + jiff::SignedDuration::from_secs(11), &snap)
            .is_some());
    }
}
