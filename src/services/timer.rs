// src/services/timer.rs

//! One-second countdowns for full-test and per-question timers.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::task::JoinHandle;

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still counting; seconds left.
    Running(u64),
    /// Reached zero on this tick.
    Expired,
    /// Inactive or already at zero.
    Idle,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u64,
    active: bool,
}

impl Countdown {
    pub fn new(seconds: u64) -> Self {
        Self {
            remaining: seconds,
            active: true,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn tick(&mut self) -> Tick {
        if !self.active || self.remaining == 0 {
            return Tick::Idle;
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            self.active = false;
            return Tick::Expired;
        }
        self.remaining -= 1;
        Tick::Running(self.remaining)
    }
}

/// `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// A countdown running on the runtime. Dropping the handle cancels it.
#[derive(Debug)]
pub struct TimerHandle {
    remaining: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Ticks a `Countdown` once per second and, on reaching zero, spawns
/// `on_expire` as its own task. The callback therefore outlives the handle
/// and may freely drop it.
pub fn spawn_countdown<F, Fut>(seconds: u64, on_expire: F) -> TimerHandle
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let remaining = Arc::new(AtomicU64::new(seconds));
    let shared = remaining.clone();

    let task = tokio::spawn(async move {
        let mut countdown = Countdown::new(seconds);
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            match countdown.tick() {
                Tick::Running(left) => shared.store(left, Ordering::Relaxed),
                Tick::Expired => {
                    shared.store(0, Ordering::Relaxed);
                    tokio::spawn(on_expire());
                    break;
                }
                Tick::Idle => break,
            }
        }
    });

    TimerHandle { remaining, task }
}
