//! Per-lane waiting set: an ordered multiset keyed on
//! `(priority_key, submitted_at, job_id)`, lower sorts first (§3 Lane,
//! §4.1 Intra-lane priority key).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use forge_core::job::Job;
use uuid::Uuid;

#[derive(Debug, Clone, Eq, PartialEq)]
struct Entry {
    key: (u8, jiff::Timestamp, Uuid),
    job: Job,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-ordered waiting set for a single lane. `BinaryHeap` is a max-heap,
/// so entries are wrapped in `Reverse` to pop the lexicographically
/// smallest `(priority_key, submitted_at, job_id)` first.
#[derive(Debug, Default)]
pub struct WaitingSet {
    heap: BinaryHeap<Reverse<Entry>>,
}

impl WaitingSet {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, job: Job) {
        let key = job.ordering_key();
        self.heap.push(Reverse(Entry { key, job }));
    }

    /// Removes and returns the next job in claim order, if any (§4.1
    /// `Claim`).
    pub fn pop(&mut self) -> Option<Job> {
        self.heap.pop().map(|Reverse(entry)| entry.job)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::job::TenantPlan;
    use jiff::Timestamp;

    fn job(plan: TenantPlan, submitted_at: Timestamp) -> Job {
        Job::submit(
            Uuid::new_v4(),
            "s3://bucket/key",
            1_000,
            plan,
            submitted_at,
            50_000_000,
            forge_core::job::DEFAULT_MAX_ATTEMPTS,
        )
    }

    #[test]
    fn pops_lower_priority_key_first() {
        let now = Timestamp::now();
        let mut set = WaitingSet::new();
        set.push(job(TenantPlan::Free, now));
        set.push(job(TenantPlan::Unlimited, now));

        let first = set.pop().unwrap();
        assert_eq!(first.tenant_plan, TenantPlan::Unlimited);
    }

    #[test]
    fn ties_broken_by_submitted_at_fifo() {
        let t0 = Timestamp::now();
        let t1 = t0 + jiff::SignedDuration::from_millis(10);
        let mut set = WaitingSet::new();
        let earlier = job(TenantPlan::Free, t0);
        let earlier_id = earlier.job_id;
        set.push(job(TenantPlan::Free, t1));
        set.push(earlier);

        let first = set.pop().unwrap();
        assert_eq!(first.job_id, earlier_id);
    }
}
