//! Engine run-state shared by the overlay stack and the host lifecycle.
//!
//! The engine is Running only when no pause reason is held. Each reason is
//! owned by exactly one party, so an overlay being dismissed can never resume
//! an engine the host has backgrounded, and vice versa.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use bitflags::bitflags;

use crate::engine::SurfaceSize;
use crate::overlay::{Overlay, OverlayKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// Held from creation until the first graphics-ready signal.
    Startup,
    /// Held while the overlay stack is non-empty.
    Overlay,
    /// Held while the host surface is backgrounded.
    Host,
}

bitflags! {
    /// Set of held [`PauseReason`]s.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct PauseReasons: u8 {
        const STARTUP = 1 << 0;
        const OVERLAY = 1 << 1;
        const HOST = 1 << 2;
    }
}

impl From<PauseReason> for PauseReasons {
    fn from(reason: PauseReason) -> Self {
        match reason {
            PauseReason::Startup => PauseReasons::STARTUP,
            PauseReason::Overlay => PauseReasons::OVERLAY,
            PauseReason::Host => PauseReasons::HOST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    reasons: PauseReasons,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            reasons: PauseReasons::STARTUP,
        }
    }

    pub fn is_running(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn is_paused_for(&self, reason: PauseReason) -> bool {
        self.reasons.contains(reason.into())
    }

    pub fn reasons(&self) -> PauseReasons {
        self.reasons
    }

    /// Add `reason`. Returns true when this took the engine out of Running.
    pub fn pause(&mut self, reason: PauseReason) -> bool {
        let was_running = self.is_running();
        self.reasons.insert(reason.into());
        was_running
    }

    /// Clear `reason`. Returns true when this put the engine back in Running.
    pub fn resume(&mut self, reason: PauseReason) -> bool {
        let was_running = self.is_running();
        self.reasons.remove(reason.into());
        !was_running && self.is_running()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything guarded by the single session lock.
#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) overlays: Vec<Overlay>,
    pub(crate) run: RunState,
    pub(crate) surface: Option<SurfaceSize>,
    /// Set once the engine has been told graphics exist.
    pub(crate) graphics_ready: bool,
}

impl SessionState {
    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn surface(&self) -> Option<SurfaceSize> {
        self.surface
    }

    pub fn is_graphics_ready(&self) -> bool {
        self.graphics_ready
    }

    pub fn depth(&self) -> usize {
        self.overlays.len()
    }

    pub fn contains(&self, kind: OverlayKind) -> bool {
        self.overlays.iter().any(|o| o.kind() == kind)
    }
}

/// Session state shared between the overlay controller and the lifecycle handler.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionState>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the session lock. A poisoned lock still yields the state: a
    /// panic elsewhere must not wedge teardown paths that drain the stack.
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn run_state(&self) -> RunState {
        self.lock().run
    }

    /// `None` while another caller holds the lock.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, SessionState>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_paused_until_startup_clears() {
        let mut state = RunState::new();
        assert!(!state.is_running());
        assert!(state.is_paused_for(PauseReason::Startup));
        assert!(state.resume(PauseReason::Startup));
        assert!(state.is_running());
    }

    #[test]
    fn running_requires_every_reason_absent() {
        let mut state = RunState::new();
        state.resume(PauseReason::Startup);

        assert!(state.pause(PauseReason::Host));
        assert!(!state.pause(PauseReason::Overlay));

        assert!(!state.resume(PauseReason::Overlay));
        assert!(!state.is_running());
        assert!(state.resume(PauseReason::Host));
        assert!(state.is_running());
    }

    #[test]
    fn reasons_accumulate_independently() {
        let mut state = RunState::new();
        state.pause(PauseReason::Overlay);
        state.pause(PauseReason::Host);
        assert_eq!(
            state.reasons(),
            PauseReasons::STARTUP | PauseReasons::OVERLAY | PauseReasons::HOST
        );
        state.resume(PauseReason::Startup);
        assert_eq!(state.reasons(), PauseReasons::OVERLAY | PauseReasons::HOST);
    }

    #[test]
    fn clearing_an_absent_reason_is_not_a_transition() {
        let mut state = RunState::new();
        state.resume(PauseReason::Startup);
        assert!(!state.resume(PauseReason::Overlay));
        assert!(state.is_running());
    }
}
