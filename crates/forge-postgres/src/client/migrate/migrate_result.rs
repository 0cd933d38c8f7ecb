use jiff::Timestamp;

/// Outcome of a single applied migration, surfaced for startup logging.
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: String,
    pub applied_at: Timestamp,
}

/// Outcome of running all pending migrations at startup.
#[derive(Debug, Clone, Default)]
pub struct MigrationResult {
    pub applied: Vec<MigrationRecord>,
}

impl MigrationResult {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.applied.len()
    }
}

/// Schema drift check used by the cluster controller's readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    UpToDate,
    Pending(Vec<String>),
}

impl MigrationStatus {
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, MigrationStatus::UpToDate)
    }
}
