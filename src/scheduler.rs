use tokio::task::AbortHandle;
use tokio::time::Duration;

/// What the engine should do after a record was buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Count threshold reached: register a flush right away. Any pending
    /// timer has already been cancelled.
    FlushNow,
    /// Nothing is scheduled yet: start a timer for the time threshold.
    ArmTimer,
    /// A timer or an in-flight flush will pick the record up.
    Wait,
}

struct PendingTimer {
    id: u64,
    handle: AbortHandle,
}

/// Dual-trigger flush scheduling with at most one pending timer.
pub struct FlushScheduler {
    count_threshold: usize,
    time_threshold: Duration,
    pending: Option<PendingTimer>,
    next_timer_id: u64,
}

impl FlushScheduler {
    /// Thresholds are taken as given; the engine passes them through
    /// `LoggerConfig::normalized` first.
    pub fn new(count_threshold: usize, time_threshold: Duration) -> Self {
        Self {
            count_threshold,
            time_threshold,
            pending: None,
            next_timer_id: 0,
        }
    }

    pub fn time_threshold(&self) -> Duration {
        self.time_threshold
    }

    pub fn has_pending_timer(&self) -> bool {
        self.pending.is_some()
    }

    /// Evaluate both triggers for a buffer that now holds `buffered` records.
    pub fn on_append(&mut self, buffered: usize, flush_in_flight: bool) -> Trigger {
        if buffered >= self.count_threshold {
            // The count trigger preempts the timer; no replacement is armed.
            self.cancel_pending();
            return Trigger::FlushNow;
        }

        if self.pending.is_none() && !flush_in_flight {
            Trigger::ArmTimer
        } else {
            Trigger::Wait
        }
    }

    /// Start the timer through `spawn`, which receives the timer id and delay
    /// and returns the task's abort handle, or `None` if no timer could be
    /// started. No-op while another timer is pending.
    pub fn arm<F>(&mut self, spawn: F) -> Option<u64>
    where
        F: FnOnce(u64, Duration) -> Option<AbortHandle>,
    {
        if self.pending.is_some() {
            return None;
        }
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let handle = spawn(id, self.time_threshold)?;
        self.pending = Some(PendingTimer { id, handle });
        Some(id)
    }

    /// Forget timer `id` after it fired. A handle belonging to a newer timer
    /// is left alone.
    pub fn clear_fired(&mut self, id: u64) -> bool {
        match &self.pending {
            Some(timer) if timer.id == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.handle.abort();
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn idle_task() -> AbortHandle {
        tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        })
        .abort_handle()
    }

    #[tokio::test]
    async fn arms_timer_once_below_threshold() {
        let mut scheduler = FlushScheduler::new(3, Duration::from_secs(10));

        assert_eq!(scheduler.on_append(1, false), Trigger::ArmTimer);
        assert_eq!(scheduler.arm(|_, _| Some(idle_task())), Some(0));
        assert_eq!(scheduler.on_append(2, false), Trigger::Wait);
        assert_eq!(scheduler.arm(|_, _| Some(idle_task())), None);
    }

    #[tokio::test]
    async fn no_timer_while_flush_in_flight() {
        let mut scheduler = FlushScheduler::new(3, Duration::from_secs(10));
        assert_eq!(scheduler.on_append(1, true), Trigger::Wait);
        assert!(!scheduler.has_pending_timer());
    }

    #[tokio::test]
    async fn count_threshold_cancels_pending_timer() {
        let mut scheduler = FlushScheduler::new(2, Duration::from_secs(10));
        let fired = Arc::new(AtomicBool::new(false));
        let fired_task = Arc::clone(&fired);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            fired_task.store(true, Ordering::SeqCst);
        });
        let abort = handle.abort_handle();

        scheduler.on_append(1, false);
        scheduler.arm(|_, _| Some(abort));

        assert_eq!(scheduler.on_append(2, false), Trigger::FlushNow);
        assert!(!scheduler.has_pending_timer());
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stale_timer_does_not_clear_newer_one() {
        let mut scheduler = FlushScheduler::new(10, Duration::from_secs(10));
        let first = scheduler.arm(|_, _| Some(idle_task())).unwrap();
        assert!(scheduler.clear_fired(first));

        let second = scheduler.arm(|_, _| Some(idle_task())).unwrap();
        assert!(!scheduler.clear_fired(first));
        assert!(scheduler.has_pending_timer());
        assert!(scheduler.clear_fired(second));
    }

    #[test]
    fn failed_spawn_leaves_nothing_pending() {
        let mut scheduler = FlushScheduler::new(10, Duration::from_secs(10));
        assert_eq!(scheduler.arm(|_, _| None), None);
        assert!(!scheduler.has_pending_timer());
    }
}
