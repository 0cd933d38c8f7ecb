mod job;
mod queue_stat;
mod worker;

pub use job::{JobChangeset, JobRow, NewJobRow};
pub use queue_stat::{NewQueueStatRow, QueueStatRow};
pub use worker::{NewWorkerRow, WorkerRow};
