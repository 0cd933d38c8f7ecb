mod job;
mod queue_stat;
mod worker;

pub use job::JobRepository;
pub use queue_stat::QueueStatRepository;
pub use worker::WorkerRepository;
