//! Sleep timer
//!
//! Monotonic countdown that preempts playback: when the deadline passes, a
//! worker thread invokes the stop routine it was armed with. Arming always
//! supersedes the previous timer; a generation counter lets a superseded
//! worker notice and exit on its next poll, so no joins are needed.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Worker poll granularity
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Default)]
struct TimerState {
    /// Monotonic deadline; `None` while inactive
    deadline: Option<Instant>,

    /// Bumped on every arm/cancel; a worker whose generation no longer
    /// matches has been superseded
    generation: u64,
}

/// Countdown that stops playback when it expires
///
/// Only one timer is ever live: `arm` cancels any existing one.
pub struct SleepTimer {
    state: Arc<Mutex<TimerState>>,
}

impl SleepTimer {
    /// Create an inactive timer
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::default())),
        }
    }

    /// Arm the timer for `minutes` from now
    ///
    /// `on_expire` runs on the worker thread when the deadline passes;
    /// callers pass their stop routine. Returns false (leaving any armed
    /// timer in place) for a non-positive or non-finite duration.
    pub fn arm<F>(&self, minutes: f64, on_expire: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !minutes.is_finite() || minutes <= 0.0 {
            return false;
        }

        let deadline = Instant::now() + Duration::from_secs_f64(minutes * 60.0);
        let generation = {
            let mut state = self.state.lock().unwrap();
            state.generation += 1;
            state.deadline = Some(deadline);
            state.generation
        };

        log::debug!("sleep timer armed for {:.2} min", minutes);

        let state = Arc::clone(&self.state);
        thread::spawn(move || {
            loop {
                thread::sleep(POLL_INTERVAL);

                let mut guard = state.lock().unwrap();
                if guard.generation != generation {
                    // Superseded by a newer arm or a cancel
                    return;
                }
                let Some(deadline) = guard.deadline else {
                    return;
                };
                if Instant::now() >= deadline {
                    guard.deadline = None;
                    drop(guard);
                    log::debug!("sleep timer expired, stopping playback");
                    on_expire();
                    return;
                }
            }
        });

        true
    }

    /// Clear the timer; the worker observes the change on its next poll
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        if state.deadline.take().is_some() {
            log::debug!("sleep timer cancelled");
        }
        state.generation += 1;
    }

    /// Minutes until expiry, or 0.0 when inactive
    pub fn remaining_minutes(&self) -> f64 {
        self.state
            .lock()
            .unwrap()
            .deadline
            .map(|deadline| {
                deadline
                    .saturating_duration_since(Instant::now())
                    .as_secs_f64()
                    / 60.0
            })
            .unwrap_or(0.0)
    }

    /// True while a timer is counting down
    pub fn is_armed(&self) -> bool {
        self.state.lock().unwrap().deadline.is_some()
    }
}

impl Default for SleepTimer {
    fn default() -> Self {
        Self::new()
    }
}
