pub mod worker;

pub use worker::{start_workers, Job, JobQueue, JobReceiver, Workers};
