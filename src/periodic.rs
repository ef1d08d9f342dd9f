//! Self-rescheduling periodic task
//!
//! The next run is scheduled only after the current one completes, so a slow
//! run delays the following one instead of piling up behind it.

use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct PeriodicTask {
    task: JoinHandle<()>,
}

impl PeriodicTask {
    /// Run `tick` now and then `interval` after each completed run.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            loop {
                tick();
                tokio::time::sleep(interval).await;
            }
        });

        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_interval() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let task = PeriodicTask::start(Duration::from_millis(1000), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(task.is_running());

        task.stop();
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(!task.is_running());
    }
}
