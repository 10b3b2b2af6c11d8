//! Multi-touch translation into the engine's touch protocol.
//!
//! A host batch is copied into a fixed-capacity [`TouchSample`], handed to
//! the engine, and the engine's [`TouchResultFlags`] are interpreted into a
//! [`TouchOutcome`] for the host. Overlays take input before it gets here,
//! so the translator is only consulted while the stack is empty.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::engine::EngineBridge;

/// Pointer slots forwarded per batch. Extra simultaneous touches are dropped.
pub const MAX_POINTERS: usize = 32;

/// Host touch action codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TouchAction {
    Down = 0,
    Up = 1,
    Move = 2,
    Cancel = 3,
    PointerDown = 5,
    PointerUp = 6,
}

impl From<i32> for TouchAction {
    fn from(value: i32) -> Self {
        match value {
            0 => TouchAction::Down,
            1 => TouchAction::Up,
            2 => TouchAction::Move,
            5 => TouchAction::PointerDown,
            6 => TouchAction::PointerUp,
            // Unknown gestures end the interaction rather than start one
            _ => TouchAction::Cancel,
        }
    }
}

/// One batch of pointer coordinates, rebuilt for every host event.
#[derive(Clone, PartialEq)]
pub struct TouchSample {
    action: TouchAction,
    pointer_count: usize,
    action_index: usize,
    xs: [f32; MAX_POINTERS],
    ys: [f32; MAX_POINTERS],
}

impl TouchSample {
    /// Copy at most [`MAX_POINTERS`] coordinates out of the host arrays.
    ///
    /// `pointer_count` is also capped by the shorter of `xs`/`ys`. When the
    /// action's own pointer falls in a dropped slot, the batch is forwarded
    /// as a `Move` of the pointers that were kept.
    pub fn new(
        action: TouchAction,
        pointer_count: usize,
        action_index: usize,
        xs: &[f32],
        ys: &[f32],
    ) -> Self {
        let count = pointer_count.min(MAX_POINTERS).min(xs.len()).min(ys.len());

        let mut sample = Self {
            action,
            pointer_count: count,
            action_index,
            xs: [0.0; MAX_POINTERS],
            ys: [0.0; MAX_POINTERS],
        };
        sample.xs[..count].copy_from_slice(&xs[..count]);
        sample.ys[..count].copy_from_slice(&ys[..count]);

        let indexes_pointer = matches!(action, TouchAction::PointerDown | TouchAction::PointerUp);
        if indexes_pointer && action_index >= count {
            log::trace!("Dropping {:?} for pointer slot {}", action, action_index);
            sample.action = TouchAction::Move;
            sample.action_index = 0;
        }
        sample
    }

    pub fn action(&self) -> TouchAction {
        self.action
    }

    pub fn pointer_count(&self) -> usize {
        self.pointer_count
    }

    pub fn action_index(&self) -> usize {
        self.action_index
    }

    pub fn xs(&self) -> &[f32] {
        &self.xs[..self.pointer_count]
    }

    pub fn ys(&self) -> &[f32] {
        &self.ys[..self.pointer_count]
    }
}

impl fmt::Debug for TouchSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchSample")
            .field("action", &self.action)
            .field("action_index", &self.action_index)
            .field("xs", &self.xs())
            .field("ys", &self.ys())
            .finish()
    }
}

bitflags! {
    /// Bitmask returned by the engine for a submitted batch.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct TouchResultFlags: u32 {
        /// The engine consumed the batch.
        const HANDLED = 1 << 0;
        const REQUEST_SHOW_MENU = 1 << 1;
        const KEY_TAP = 1 << 4;
        const ROUTE_KEYBOARD = 1 << 5;
        const ROUTE_JOYSTICK = 1 << 6;
        const ROUTE_MENU = 1 << 7;
    }
}

/// Which virtual device the engine routed the batch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchRoute {
    Keyboard,
    Joystick,
    Menu,
}

/// Host-facing interpretation of [`TouchResultFlags`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TouchOutcome {
    pub flags: TouchResultFlags,
    /// The host must not run its default handling.
    pub consumed: bool,
    /// The main menu should be raised.
    pub show_menu: bool,
    /// An audible key click may be played.
    pub key_click: bool,
}

impl TouchOutcome {
    /// Nothing is acted on unless the engine marked the batch handled.
    pub fn from_flags(flags: TouchResultFlags) -> Self {
        if !flags.contains(TouchResultFlags::HANDLED) {
            return Self {
                flags,
                ..Self::default()
            };
        }
        Self {
            flags,
            consumed: true,
            show_menu: flags.contains(TouchResultFlags::REQUEST_SHOW_MENU),
            key_click: flags.contains(TouchResultFlags::KEY_TAP),
        }
    }

    pub fn route(&self) -> Option<TouchRoute> {
        if self.flags.contains(TouchResultFlags::ROUTE_KEYBOARD) {
            Some(TouchRoute::Keyboard)
        } else if self.flags.contains(TouchResultFlags::ROUTE_JOYSTICK) {
            Some(TouchRoute::Joystick)
        } else if self.flags.contains(TouchResultFlags::ROUTE_MENU) {
            Some(TouchRoute::Menu)
        } else {
            None
        }
    }
}

pub struct TouchEventTranslator {
    engine: Arc<dyn EngineBridge>,
}

impl TouchEventTranslator {
    pub fn new(engine: Arc<dyn EngineBridge>) -> Self {
        Self { engine }
    }

    /// Build a batch from host arrays and forward it. Coordinates pass through
    /// untouched; the engine's flags come back unchanged.
    pub fn translate(
        &self,
        action: TouchAction,
        pointer_count: usize,
        action_index: usize,
        xs: &[f32],
        ys: &[f32],
    ) -> TouchResultFlags {
        let sample = TouchSample::new(action, pointer_count, action_index, xs, ys);
        let flags = self.engine.on_touch(&sample);
        log::trace!("{:?} -> {:#x}", sample, flags.bits());
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, RecordingEngine};

    #[test]
    fn unknown_action_codes_cancel() {
        assert_eq!(TouchAction::from(2), TouchAction::Move);
        assert_eq!(TouchAction::from(6), TouchAction::PointerUp);
        assert_eq!(TouchAction::from(4), TouchAction::Cancel);
        assert_eq!(TouchAction::from(-1), TouchAction::Cancel);
    }

    #[test]
    fn sample_caps_pointer_count() {
        let xs: Vec<f32> = (0..40).map(|i| i as f32).collect();
        let ys: Vec<f32> = (0..40).map(|i| -(i as f32)).collect();
        let sample = TouchSample::new(TouchAction::Move, 40, 0, &xs, &ys);
        assert_eq!(sample.pointer_count(), MAX_POINTERS);
        assert_eq!(sample.xs(), &xs[..MAX_POINTERS]);
        assert_eq!(sample.ys()[31], -31.0);
    }

    #[test]
    fn sample_never_reads_past_short_arrays() {
        let sample = TouchSample::new(TouchAction::Down, 5, 0, &[1.0, 2.0], &[3.0]);
        assert_eq!(sample.pointer_count(), 1);
        assert_eq!(sample.xs(), &[1.0]);
    }

    #[test]
    fn dropped_pointer_action_becomes_move() {
        let xs = [0.0; 40];
        let sample = TouchSample::new(TouchAction::PointerDown, 40, 35, &xs, &xs);
        assert_eq!(sample.action(), TouchAction::Move);
        assert_eq!(sample.action_index(), 0);

        let kept = TouchSample::new(TouchAction::PointerUp, 3, 2, &xs, &xs);
        assert_eq!(kept.action(), TouchAction::PointerUp);
        assert_eq!(kept.action_index(), 2);
    }

    #[test]
    fn unhandled_flags_are_not_acted_on() {
        let flags = TouchResultFlags::REQUEST_SHOW_MENU | TouchResultFlags::KEY_TAP;
        let outcome = TouchOutcome::from_flags(flags);
        assert!(!outcome.consumed);
        assert!(!outcome.show_menu);
        assert!(!outcome.key_click);
    }

    #[test]
    fn handled_flags_are_interpreted() {
        let flags = TouchResultFlags::HANDLED
            | TouchResultFlags::KEY_TAP
            | TouchResultFlags::ROUTE_KEYBOARD;
        let outcome = TouchOutcome::from_flags(flags);
        assert!(outcome.consumed);
        assert!(outcome.key_click);
        assert!(!outcome.show_menu);
        assert_eq!(outcome.route(), Some(TouchRoute::Keyboard));
        assert_eq!(flags.bits(), 0b11_0001);
    }

    #[test]
    fn unknown_engine_bits_are_kept() {
        let flags = TouchResultFlags::from_bits_retain(0x8000_0001);
        assert!(flags.contains(TouchResultFlags::HANDLED));
        assert_eq!(flags.bits(), 0x8000_0001);
        assert!(TouchOutcome::from_flags(flags).consumed);
    }

    #[test]
    fn translator_forwards_coordinates_unchanged() {
        let engine = Arc::new(RecordingEngine::new());
        engine.reply_to_touch(TouchResultFlags::HANDLED);
        let translator = TouchEventTranslator::new(engine.clone());

        let flags = translator.translate(TouchAction::Down, 2, 0, &[10.5, 700.0], &[20.0, 5.25]);
        assert_eq!(flags, TouchResultFlags::HANDLED);

        let calls = engine.calls();
        let Some(EngineCall::Touch(sample)) = calls.last() else {
            panic!("expected a touch call, got {calls:?}");
        };
        assert_eq!(sample.xs(), &[10.5, 700.0]);
        assert_eq!(sample.ys(), &[20.0, 5.25]);
    }
}
