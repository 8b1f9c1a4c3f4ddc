pub mod job_feed_sync;

pub use job_feed_sync::JobFeedSyncJob;
