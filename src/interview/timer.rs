use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerEventKind {
    Tick { remaining_secs: u32 },
    Expired,
}

/// Event from one armed countdown; `timer_id` tells stale instances apart
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerEvent {
    pub timer_id: u64,
    pub kind: TimerEventKind,
}

struct ActiveCountdown {
    id: u64,
    stop_signal: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Per-question countdown. At most one countdown is alive; arming replaces it.
pub struct QuestionTimer {
    next_id: u64,
    active: Option<ActiveCountdown>,
}

impl Default for QuestionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionTimer {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            active: None,
        }
    }

    /// Start counting down from `seconds`, ticking once per second into `sink`.
    /// Returns the id carried by every event of this countdown.
    pub fn arm<E, F>(&mut self, seconds: u32, sink: UnboundedSender<E>, map: F) -> u64
    where
        E: Send + 'static,
        F: Fn(TimerEvent) -> E + Send + 'static,
    {
        self.cancel();

        let id = self.next_id;
        self.next_id += 1;
        let seconds = seconds.max(1);
        let stop_signal = Arc::new(AtomicBool::new(false));
        let task_stop = stop_signal.clone();

        debug!("⏱️ Arming question timer #{} for {}s", id, seconds);
        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + period, period);
            let mut remaining = seconds;

            loop {
                ticker.tick().await;
                if task_stop.load(Ordering::Relaxed) {
                    break;
                }
                remaining -= 1;
                let kind = if remaining == 0 {
                    TimerEventKind::Expired
                } else {
                    TimerEventKind::Tick { remaining_secs: remaining }
                };
                if sink.send(map(TimerEvent { timer_id: id, kind })).is_err() || remaining == 0 {
                    break;
                }
            }
        });

        self.active = Some(ActiveCountdown {
            id,
            stop_signal,
            handle,
        });
        id
    }

    /// Stop the live countdown. Safe to call any number of times.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(countdown) => {
                countdown.stop_signal.store(true, Ordering::Relaxed);
                countdown.handle.abort();
                debug!("⏹️ Question timer #{} cancelled", countdown.id);
                true
            }
            None => false,
        }
    }

    /// Id of the countdown whose events are still meaningful
    pub fn active_id(&self) -> Option<u64> {
        self.active.as_ref().map(|c| c.id)
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_then_expires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = QuestionTimer::new();
        let started = Instant::now();
        let id = timer.arm(3, tx, |e| e);

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.timer_id, id);
            kinds.push(event.kind);
        }

        assert_eq!(
            kinds,
            vec![
                TimerEventKind::Tick { remaining_secs: 2 },
                TimerEventKind::Tick { remaining_secs: 1 },
                TimerEventKind::Expired,
            ]
        );
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_silences_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = QuestionTimer::new();
        timer.arm(5, tx, |e| e);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(
            rx.recv().await.map(|e| e.kind),
            Some(TimerEventKind::Tick { remaining_secs: 4 })
        );

        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert_eq!(timer.active_id(), None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        // sender dropped with the aborted task, nothing else was delivered
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_countdown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = QuestionTimer::new();
        let first = timer.arm(5, tx.clone(), |e| e);
        let second = timer.arm(2, tx, |e| e);
        assert_ne!(first, second);
        assert_eq!(timer.active_id(), Some(second));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert!(events.iter().all(|e| e.timer_id == second));
        assert_eq!(events.last().map(|e| e.kind), Some(TimerEventKind::Expired));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let mut timer = QuestionTimer::new();
            timer.arm(2, tx, |e| e);
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.recv().await, None);
    }
}
