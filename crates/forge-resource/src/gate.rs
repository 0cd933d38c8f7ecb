//! Resource Admission Gate (component C5, §4.2).

use forge_core::job::{Job, Lane};
use forge_core::ledger::ResourceLedger;
use parking_lot::Mutex;
use rand::Rng;

use crate::config::ResourceConfig;
use crate::error::Error;
use crate::estimate::{DefaultEstimator, Estimator};

const TRACING_TARGET_RESOURCE: &str = "forge_resource::gate";

/// Proof of a successful `Acquire`, consumed by `Release`. Holds the
/// accounting the gate needs to reverse on release without re-deriving it
/// from the job (the job's memory estimate may differ if the estimator is
/// non-deterministic).
#[derive(Debug, Clone, Copy)]
pub struct Ticket {
    lane: Lane,
    mem_bytes: u64,
}

/// The lock-guarded Resource Ledger plus the `Acquire`/`Release` admission
/// logic (§4.2). RAG never reorders across workers — it only gates;
/// ordering is the priority queue manager's responsibility (§4.2
/// Fairness).
pub struct Gate {
    ledger: Mutex<ResourceLedger>,
    estimator: Box<dyn Estimator>,
}

impl Gate {
    pub fn new(config: ResourceConfig) -> Self {
        Self::with_estimator(config, Box::new(DefaultEstimator))
    }

    pub fn with_estimator(config: ResourceConfig, estimator: Box<dyn Estimator>) -> Self {
        Self {
            ledger: Mutex::new(ResourceLedger::new(
                config.max_concurrent,
                config.mem_ceiling_bytes,
                config.large_threshold_bytes,
                config.max_large_concurrent,
            )),
            estimator,
        }
    }

    /// Attempts to admit `job` (§4.2 `Acquire`). On success, increments the
    /// ledger counters and returns a `Ticket`; on rejection, the ledger is
    /// left unchanged.
    #[tracing::instrument(skip(self, job), target = "forge_resource::gate", fields(job_id = %job.job_id))]
    pub fn acquire(&self, job: &Job) -> Result<Ticket, Error> {
        let estimate = self.estimator.estimate(job);
        let mut ledger = self.ledger.lock();

        if ledger.paused {
            return Err(Error::Paused);
        }
        if ledger.active_jobs >= ledger.max_concurrent {
            return Err(Error::AtConcurrencyCeiling);
        }
        if job.lane == Lane::Large && ledger.large_in_flight >= ledger.max_large_concurrent {
            return Err(Error::AtLargeConcurrencyCeiling);
        }
        if ledger.mem_estimate_bytes + estimate > ledger.mem_ceiling_bytes {
            return Err(Error::AtMemoryCeiling);
        }

        ledger.active_jobs += 1;
        ledger.mem_estimate_bytes += estimate;
        if job.lane == Lane::Large {
            ledger.large_in_flight += 1;
        }

        tracing::debug!(
            target: TRACING_TARGET_RESOURCE,
            active_jobs = ledger.active_jobs,
            mem_pct = ledger.mem_utilization(),
            "admitted job"
        );

        Ok(Ticket {
            lane: job.lane,
            mem_bytes: estimate,
        })
    }

    /// Releases the resources reserved by `ticket` (§4.2 `Release`).
    pub fn release(&self, ticket: Ticket) {
        let mut ledger = self.ledger.lock();
        ledger.active_jobs = ledger.active_jobs.saturating_sub(1);
        ledger.mem_estimate_bytes = ledger.mem_estimate_bytes.saturating_sub(ticket.mem_bytes);
        if ticket.lane == Lane::Large {
            ledger.large_in_flight = ledger.large_in_flight.saturating_sub(1);
        }
    }

    /// The memory monitor's pause/resume rule (§4.2 Backpressure): sets
    /// `paused` at `>= mem_pause_pct`, clears it at `<= mem_resume_pct`.
    /// Called on a timer by whoever owns memory telemetry (`forge-health`
    /// or the host process); `Gate` itself does not sample memory.
    pub fn update_backpressure(&self, mem_pause_pct: f64, mem_resume_pct: f64) {
        let mut ledger = self.ledger.lock();
        let utilization = ledger.mem_utilization();
        if !ledger.paused && utilization >= mem_pause_pct {
            ledger.paused = true;
            tracing::warn!(target: TRACING_TARGET_RESOURCE, utilization, "backpressure engaged");
        } else if ledger.paused && utilization <= mem_resume_pct {
            ledger.paused = false;
            tracing::info!(target: TRACING_TARGET_RESOURCE, utilization, "backpressure cleared");
        }
    }

    pub fn snapshot(&self) -> ResourceLedger {
        *self.ledger.lock()
    }

    pub fn is_paused(&self) -> bool {
        self.ledger.lock().paused
    }
}

/// A jittered delay (100-500ms) for a worker whose `Acquire` lost the
/// race, so it doesn't retry in a tight loop (§4.2).
pub fn backpressure_retry_delay() -> std::time::Duration {
    let millis = rand::rng().random_range(100..=500);
    std::time::Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::job::TenantPlan;
    use jiff::Timestamp;
    use uuid::Uuid;

    fn job(lane: Lane, file_size_bytes: u64) -> Job {
        let mut j = Job::submit(
            Uuid::new_v4(),
            "ref",
            file_size_bytes,
            TenantPlan::Free,
            Timestamp::now(),
            50_000_000,
            forge_core::job::DEFAULT_MAX_ATTEMPTS,
        );
        j.lane = lane;
        j
    }

    #[test]
    fn rejects_past_concurrency_ceiling() {
        let config = ResourceConfig {
            max_concurrent: 1,
            ..ResourceConfig::default()
        };
        let gate = Gate::new(config);
        let first = job(Lane::Normal, 1_000);
        let second = job(Lane::Normal, 1_000);

        assert!(gate.acquire(&first).is_ok());
        assert_eq!(gate.acquire(&second), Err(Error::AtConcurrencyCeiling));
    }

    #[test]
    fn release_frees_capacity() {
        let config = ResourceConfig {
            max_concurrent: 1,
            ..ResourceConfig::default()
        };
        let gate = Gate::new(config);
        let first = job(Lane::Normal, 1_000);
        let ticket = gate.acquire(&first).unwrap();
        gate.release(ticket);

        let second = job(Lane::Normal, 1_000);
        assert!(gate.acquire(&second).is_ok());
    }

    #[test]
    fn large_lane_has_its_own_sub_budget() {
        let config = ResourceConfig {
            max_concurrent: 10,
            max_large_concurrent: 1,
            ..ResourceConfig::default()
        };
        let gate = Gate::new(config);
        let first = job(Lane::Large, 80_000_000);
        let second = job(Lane::Large, 80_000_000);

        assert!(gate.acquire(&first).is_ok());
        assert_eq!(gate.acquire(&second), Err(Error::AtLargeConcurrencyCeiling));
    }

    #[test]
    fn paused_rejects_all_acquisitions() {
        let gate = Gate::new(ResourceConfig::default());
        gate.update_backpressure(0.0, -1.0);
        assert_eq!(gate.acquire(&job(Lane::Normal, 1_000)), Err(Error::Paused));
    }

    #[test]
    fn backpressure_engages_and_clears_at_configured_thresholds() {
        let config = ResourceConfig {
            max_concurrent: 10,
            mem_ceiling_bytes: 1_000,
            ..ResourceConfig::default()
        };
        let gate = Gate::new(config);
        {
            let mut ledger = gate.ledger.lock();
            ledger.mem_estimate_bytes = 900;
        }
        gate.update_backpressure(0.85, 0.70);
        assert!(gate.is_paused());

        {
            let mut ledger = gate.ledger.lock();
            ledger.mem_estimate_bytes = 600;
        }
        gate.update_backpressure(0.85, 0.70);
        assert!(!gate.is_paused());
    }
}
