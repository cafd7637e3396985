use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Time source and sleeper for the polling loop, swappable so tests run on virtual time.
#[async_trait]
pub trait Scheduler: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Wall time elapsed since `start` according to `scheduler`; zero if the clock went backwards.
pub(crate) fn elapsed_since(scheduler: &dyn Scheduler, start: DateTime<Utc>) -> Duration {
    (scheduler.now() - start).to_std().unwrap_or_default()
}
