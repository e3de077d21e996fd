//! Periodic trigger of the auto-sync.

use std::time::Duration;

use futures::{
    future::{AbortHandle, Abortable},
    Future,
};
use tokio::time::{self, MissedTickBehavior};

/// Runs a tick on a fixed period. At most one timer is active at any time.
#[derive(Debug, Default)]
pub struct Scheduler {
    current: Option<(AbortHandle, u64)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Period of the active timer, in seconds
    pub fn interval(&self) -> Option<u64> {
        self.current.as_ref().map(|(_, secs)| *secs)
    }

    pub fn is_armed(&self) -> bool {
        self.current.is_some()
    }

    /// Replace the active timer.
    ///
    /// With a zero interval the scheduler is left disarmed. Otherwise `tick` runs
    /// right away and then every `interval_secs` seconds. A tick that is still
    /// running when the next one is due delays it, ticks never overlap.
    pub fn arm<F, Fut>(&mut self, interval_secs: u64, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.disarm();
        if interval_secs == 0 {
            log::info!("auto-sync disabled");
            return;
        }
        log::info!("auto-sync every {interval_secs}s");

        let period = Duration::from_secs(interval_secs);
        let (abort, reg) = AbortHandle::new_pair();
        let fut = async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                tick().await;
            }
        };
        tokio::spawn(Abortable::new(fut, reg));
        self.current = Some((abort, interval_secs));
    }

    pub fn disarm(&mut self) {
        if let Some((abort, secs)) = self.current.take() {
            log::debug!("cancelling auto-sync timer of {secs}s");
            abort.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}
