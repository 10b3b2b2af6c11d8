//! Test doubles for hosts and engines.
//!
//! [`RecordingEngine`] logs every bridge call so tests can assert on the
//! exact signal sequence; [`RecordingTransport`] and [`MemoryPreferences`]
//! stand in for the host side.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::Preferences;
use crate::crash::ReportTransport;
use crate::engine::{AudioParams, EngineBridge, SurfaceSize};
use crate::error::{BridgeError, Result};
use crate::run_state::SharedSession;
use crate::touch::{TouchResultFlags, TouchSample};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Create(PathBuf, AudioParams),
    GraphicsReady(SurfaceSize),
    GraphicsResized(SurfaceSize),
    KeyDown(i32, i32),
    KeyUp(i32, i32),
    Pause(bool),
    Resume(bool),
    Quit,
    Reboot,
    Render,
    Touch(TouchSample),
    ChooseDisk(PathBuf, bool, bool),
    UncaughtFailure(PathBuf, String),
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    touch_reply: Mutex<TouchResultFlags>,
    watched: Mutex<Option<SharedSession>>,
    depths: Mutex<Vec<Option<usize>>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags returned from every later `on_touch`.
    pub fn reply_to_touch(&self, flags: TouchResultFlags) {
        *lock(&self.touch_reply) = flags;
    }

    /// Sample the stack depth of `session` on every pause and resume, the
    /// way an engine that calls back into the bridge would.
    pub fn watch(&self, session: SharedSession) {
        *lock(&self.watched) = Some(session);
    }

    /// Depths seen by [`watch`](Self::watch); `None` where the session lock
    /// was still held during the signal.
    pub fn depths_seen(&self) -> Vec<Option<usize>> {
        lock(&self.depths).clone()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    fn push(&self, call: EngineCall) {
        lock(&self.calls).push(call);
    }

    fn sample_depth(&self) {
        let watched = lock(&self.watched).clone();
        if let Some(session) = watched {
            let depth = session.try_lock().map(|state| state.depth());
            lock(&self.depths).push(depth);
        }
    }
}

impl EngineBridge for RecordingEngine {
    fn on_create(&self, data_dir: &Path, audio: AudioParams) {
        self.push(EngineCall::Create(data_dir.to_path_buf(), audio));
    }

    fn on_graphics_ready(&self, size: SurfaceSize) {
        self.push(EngineCall::GraphicsReady(size));
    }

    fn on_graphics_resized(&self, size: SurfaceSize) {
        self.push(EngineCall::GraphicsResized(size));
    }

    fn on_key_down(&self, code: i32, modifiers: i32) {
        self.push(EngineCall::KeyDown(code, modifiers));
    }

    fn on_key_up(&self, code: i32, modifiers: i32) {
        self.push(EngineCall::KeyUp(code, modifiers));
    }

    fn on_pause(&self, host_initiated: bool) {
        self.sample_depth();
        self.push(EngineCall::Pause(host_initiated));
    }

    fn on_resume(&self, host_initiated: bool) {
        self.sample_depth();
        self.push(EngineCall::Resume(host_initiated));
    }

    fn on_quit(&self) {
        self.push(EngineCall::Quit);
    }

    fn on_reboot(&self) {
        self.push(EngineCall::Reboot);
    }

    fn on_render(&self) {
        self.push(EngineCall::Render);
    }

    fn on_touch(&self, sample: &TouchSample) -> TouchResultFlags {
        self.push(EngineCall::Touch(sample.clone()));
        *lock(&self.touch_reply)
    }

    fn choose_disk(&self, path: &Path, drive_a: bool, read_only: bool) {
        self.push(EngineCall::ChooseDisk(path.to_path_buf(), drive_a, read_only));
    }

    fn on_uncaught_failure(&self, home_dir: &Path, text: &str) {
        self.push(EngineCall::UncaughtFailure(home_dir.to_path_buf(), text.to_string()));
    }
}

/// Transport that records the reports it was given, optionally refusing them.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(PathBuf, String)>>,
    refuse: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Report paths with their contents at send time.
    pub fn sent(&self) -> Vec<(PathBuf, String)> {
        lock(&self.sent).clone()
    }
}

impl ReportTransport for RecordingTransport {
    fn send(&self, report: &Path) -> Result<()> {
        let contents =
            std::fs::read_to_string(report).map_err(|e| BridgeError::io(report, e))?;
        lock(&self.sent).push((report.to_path_buf(), contents));
        if self.refuse {
            return Err(BridgeError::Transport("refused".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryPreferences {
    configured: bool,
}

impl Preferences for MemoryPreferences {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn set_configured(&mut self, configured: bool) {
        self.configured = configured;
    }
}
