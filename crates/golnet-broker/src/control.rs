//! Run control shared between the run loop and the control methods.
//!
//! `Broker.Pause` and `Broker.Quit` arrive on their own tasks while a
//! `Broker.Run` is in flight. They communicate with the run loop only
//! through [`RunControl`]: atomic flags for the signals, plus a [`Notify`]
//! that wakes the loop out of a pause. A `Notify` permit is stored when
//! nobody is waiting, so a resume or quit that lands just before the loop
//! parks is never lost.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tokio::sync::Notify;

use crate::error::BrokerError;

/// Where the broker is in its run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunState {
    /// No run has been started, or the last one failed.
    Idle = 0,
    /// A run is computing turns.
    Running = 1,
    /// A run is parked waiting for resume or quit.
    Paused = 2,
    /// The last run finished all its turns.
    Completed = 3,
    /// The last run was aborted by quit.
    Quit = 4,
}

impl RunState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Running,
            2 => Self::Paused,
            3 => Self::Completed,
            4 => Self::Quit,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Quit => "quit",
        };
        f.write_str(name)
    }
}

/// Pause and quit signals plus the current [`RunState`].
#[derive(Debug)]
pub struct RunControl {
    /// Whether the pause flag is set.
    paused: AtomicBool,
    /// Whether a quit is pending for the active run.
    quit_requested: AtomicBool,
    /// Whether a run holds the [`RunGuard`].
    running: AtomicBool,
    /// Current [`RunState`] as its `u8` discriminant.
    state: AtomicU8,
    /// Wakes the run loop out of a pause.
    wake: Notify,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    /// Fresh control state: idle, not paused, nothing pending.
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            quit_requested: AtomicBool::new(false),
            running: AtomicBool::new(false),
            state: AtomicU8::new(RunState::Idle as u8),
            wake: Notify::new(),
        }
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: RunState) {
        self.state.store(state as u8, Ordering::Release);
    }

    // -----------------------------------------------------------------------
    // Run lifecycle
    // -----------------------------------------------------------------------

    /// Claim the single run slot.
    ///
    /// Clears any pause or quit left over from before this run.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::RunInProgress`] if another run holds the slot.
    pub fn begin_run(&self) -> Result<RunGuard<'_>, BrokerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BrokerError::RunInProgress);
        }
        self.paused.store(false, Ordering::Release);
        self.quit_requested.store(false, Ordering::Release);
        self.set_state(RunState::Running);
        Ok(RunGuard {
            control: self,
            finished: false,
        })
    }

    /// Whether a run currently holds the slot.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the pause flag is set.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Flip the pause flag and wake the run loop. Returns the new value.
    pub fn toggle_pause(&self) -> bool {
        let paused = !self.paused.fetch_xor(true, Ordering::AcqRel);
        if self.is_running() {
            self.set_state(if paused {
                RunState::Paused
            } else {
                RunState::Running
            });
        }
        self.wake.notify_one();
        paused
    }

    /// Wait while paused. Returns early once a quit is pending.
    pub async fn wait_while_paused(&self) {
        while self.is_paused() && !self.is_quit_requested() {
            self.wake.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Quit
    // -----------------------------------------------------------------------

    /// Ask the active run to stop before its next turn.
    pub fn request_quit(&self) {
        self.quit_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Check whether a quit is pending.
    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested.load(Ordering::Acquire)
    }

    /// Consume a pending quit. Returns whether one was pending.
    pub fn take_quit(&self) -> bool {
        self.quit_requested.swap(false, Ordering::AcqRel)
    }
}

/// Holds the run slot for the duration of one `Broker.Run`.
///
/// Dropping the guard without [`finish`](Self::finish) (an error or a
/// cancelled call) releases the slot and returns the broker to
/// [`RunState::Idle`].
#[derive(Debug)]
pub struct RunGuard<'a> {
    control: &'a RunControl,
    finished: bool,
}

impl RunGuard<'_> {
    /// Release the slot, recording how the run ended.
    pub fn finish(mut self, end: RunState) {
        self.control.set_state(end);
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.control.set_state(RunState::Idle);
        }
        self.control.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn only_one_run_at_a_time() {
        let control = RunControl::new();
        let guard = control.begin_run().unwrap();
        assert!(matches!(control.begin_run(), Err(BrokerError::RunInProgress)));
        guard.finish(RunState::Completed);
        assert_eq!(control.state(), RunState::Completed);
        assert!(control.begin_run().is_ok());
    }

    #[test]
    fn dropped_guard_returns_to_idle() {
        let control = RunControl::new();
        {
            let _guard = control.begin_run().unwrap();
            assert_eq!(control.state(), RunState::Running);
        }
        assert_eq!(control.state(), RunState::Idle);
        assert!(!control.is_running());
    }

    #[test]
    fn begin_run_clears_stale_signals() {
        let control = RunControl::new();
        control.request_quit();
        assert!(control.toggle_pause());
        let _guard = control.begin_run().unwrap();
        assert!(!control.is_paused());
        assert!(!control.take_quit());
    }

    #[test]
    fn toggle_tracks_state_only_while_running() {
        let control = RunControl::new();
        assert!(control.toggle_pause());
        assert_eq!(control.state(), RunState::Idle);
        assert!(!control.toggle_pause());

        let _guard = control.begin_run().unwrap();
        assert!(control.toggle_pause());
        assert_eq!(control.state(), RunState::Paused);
        assert!(!control.toggle_pause());
        assert_eq!(control.state(), RunState::Running);
    }

    #[test]
    fn take_quit_consumes_the_signal() {
        let control = RunControl::new();
        control.request_quit();
        assert!(control.take_quit());
        assert!(!control.take_quit());
    }

    #[tokio::test]
    async fn resume_wakes_a_paused_waiter() {
        let control = Arc::new(RunControl::new());
        control.toggle_pause();

        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.wait_while_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        control.toggle_pause();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn quit_wakes_a_paused_waiter() {
        let control = Arc::new(RunControl::new());
        control.toggle_pause();

        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.wait_while_paused().await })
        };
        control.request_quit();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(control.is_paused());
        assert!(control.take_quit());
    }
}
