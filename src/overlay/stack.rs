//! Overlay stack controller.
//!
//! The stack is the only party that pauses the engine for overlay reasons.
//! Every push signals a pause; the pop that empties the stack signals a
//! resume, unless another pause reason (host, startup) is still held. The
//! stack mutation commits and the session lock is released before the signal
//! is issued, so an engine may call back into the controller from
//! `on_pause`/`on_resume`.

use std::sync::Arc;

use super::{Overlay, OverlayKind};
use crate::engine::EngineBridge;
use crate::run_state::{PauseReason, SessionState, SharedSession};

pub struct OverlayStackController {
    engine: Arc<dyn EngineBridge>,
    session: SharedSession,
}

impl OverlayStackController {
    pub fn new(engine: Arc<dyn EngineBridge>, session: SharedSession) -> Self {
        Self { engine, session }
    }

    /// Push `overlay` on top and pause the engine.
    ///
    /// # Panics
    ///
    /// If an overlay of the same kind is already on the stack.
    pub fn push(&self, overlay: impl Into<Overlay>) {
        let mut state = self.session.lock();
        Self::push_locked(&mut state, overlay.into());
        drop(state);
        self.engine.on_pause(false);
    }

    /// Push `overlay` unless one of its kind is already showing.
    /// Returns whether it was pushed.
    pub fn show(&self, overlay: impl Into<Overlay>) -> bool {
        let overlay = overlay.into();
        let mut state = self.session.lock();
        if state.contains(overlay.kind()) {
            log::debug!("{:?} already showing", overlay.kind());
            return false;
        }
        Self::push_locked(&mut state, overlay);
        drop(state);
        self.engine.on_pause(false);
        true
    }

    /// Remove and return the top overlay. Safe to call on an empty stack.
    pub fn pop(&self) -> Option<Overlay> {
        let mut state = self.session.lock();
        let overlay = state.overlays.pop()?;
        let disposed = Self::dispose_locked(&mut state, overlay);
        drop(state);
        Some(self.signal(disposed))
    }

    /// Remove the overlay of `kind` wherever it sits in the stack.
    pub fn pop_named(&self, kind: OverlayKind) -> Option<Overlay> {
        let mut state = self.session.lock();
        let index = state.overlays.iter().position(|o| o.kind() == kind)?;
        let overlay = state.overlays.remove(index);
        let disposed = Self::dispose_locked(&mut state, overlay);
        drop(state);
        Some(self.signal(disposed))
    }

    /// User-initiated dismiss. A non-dismissable overlay stays put.
    pub fn dismiss(&self, kind: OverlayKind) -> Option<Overlay> {
        let mut state = self.session.lock();
        let index = state.overlays.iter().position(|o| o.kind() == kind)?;
        if !state.overlays[index].is_dismissable() {
            log::debug!("{:?} is not dismissable", kind);
            return None;
        }
        let overlay = state.overlays.remove(index);
        let disposed = Self::dispose_locked(&mut state, overlay);
        drop(state);
        Some(self.signal(disposed))
    }

    /// Pop until empty, returning the overlays top-first.
    pub fn drain(&self) -> Vec<Overlay> {
        std::iter::from_fn(|| self.pop()).collect()
    }

    pub fn peek(&self) -> Option<OverlayKind> {
        self.session.lock().overlays.last().map(Overlay::kind)
    }

    pub fn depth(&self) -> usize {
        self.session.lock().depth()
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    pub fn contains(&self, kind: OverlayKind) -> bool {
        self.session.lock().contains(kind)
    }

    /// Run `f` against the overlay of `kind`, if it is on the stack.
    pub fn with_overlay<R>(&self, kind: OverlayKind, f: impl FnOnce(&mut Overlay) -> R) -> Option<R> {
        let mut state = self.session.lock();
        state.overlays.iter_mut().find(|o| o.kind() == kind).map(f)
    }

    fn push_locked(state: &mut SessionState, mut overlay: Overlay) {
        let kind = overlay.kind();
        assert!(
            !state.contains(kind),
            "overlay {kind:?} is already on the stack"
        );

        overlay.attach(state.surface.unwrap_or_default());
        state.overlays.push(overlay);

        if state.run.pause(PauseReason::Overlay) {
            log::info!("Engine paused for {:?}", kind);
        }
        log::debug!("push {:?}, depth {}", kind, state.overlays.len());
    }

    /// Detach `overlay` and decide whether the engine should resume. The
    /// caller signals after releasing the session lock.
    fn dispose_locked(state: &mut SessionState, mut overlay: Overlay) -> Disposed {
        overlay.detach();
        log::debug!("pop {:?}, depth {}", overlay.kind(), state.overlays.len());

        let mut resume = false;
        if state.overlays.is_empty() {
            resume = state.run.resume(PauseReason::Overlay);
            if resume {
                log::info!("Overlays cleared, resuming engine");
            } else {
                log::debug!("Overlays cleared, engine still paused: {:?}", state.run);
            }
        }
        Disposed { overlay, resume }
    }

    fn signal(&self, disposed: Disposed) -> Overlay {
        if disposed.resume {
            self.engine.on_resume(false);
        }
        disposed.overlay
    }
}

struct Disposed {
    overlay: Overlay,
    resume: bool,
}
