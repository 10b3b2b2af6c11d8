//! Host lifecycle handler.
//!
//! [`Frontend`] is what the host UI thread talks to. It owns the overlay
//! stack, the touch translator and the crash reporter, and shares one session
//! lock with the stack so that host pauses and overlay pauses are decided
//! against the same run-state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ensure_configured, BridgeConfig, Preferences};
use crate::crash::{CrashHandler, CrashReporter, ReportOutcome, ReportTransport};
use crate::engine::{EngineBridge, SurfaceSize};
use crate::error::Result;
use crate::overlay::{
    ConfirmDialog, ConfirmKind, DisksMenu, MainMenu, MainMenuAction, Overlay, OverlayKind,
    OverlayStackController, SettingsItem, SettingsMenu, SplashAction, SplashButton, SplashScreen,
};
use crate::run_state::{PauseReason, RunState, SharedSession};
use crate::touch::{TouchAction, TouchEventTranslator, TouchOutcome};

pub const KEYCODE_BACK: i32 = 4;
pub const KEYCODE_VOLUME_UP: i32 = 24;
pub const KEYCODE_VOLUME_DOWN: i32 = 25;
pub const KEYCODE_MENU: i32 = 82;
pub const KEYCODE_VOLUME_MUTE: i32 = 164;

fn is_volume_key(code: i32) -> bool {
    matches!(
        code,
        KEYCODE_VOLUME_UP | KEYCODE_VOLUME_DOWN | KEYCODE_VOLUME_MUTE
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ConfirmOutcome {
    /// The engine was told to quit; the host should finish the process.
    QuitRequested = 0,
    Rebooted = 1,
    Cancelled = 2,
    NotShowing = 3,
}

pub struct Frontend {
    config: BridgeConfig,
    engine: Arc<dyn EngineBridge>,
    session: SharedSession,
    overlays: OverlayStackController,
    touch: TouchEventTranslator,
    reporter: CrashReporter,
}

impl Frontend {
    pub fn new(config: BridgeConfig, engine: Arc<dyn EngineBridge>) -> Self {
        let session = SharedSession::new();
        Self {
            overlays: OverlayStackController::new(engine.clone(), session.clone()),
            touch: TouchEventTranslator::new(engine.clone()),
            reporter: config.crash_reporter(),
            config,
            engine,
            session,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn overlays(&self) -> &OverlayStackController {
        &self.overlays
    }

    pub fn run_state(&self) -> RunState {
        self.session.run_state()
    }

    pub fn surface(&self) -> Option<SurfaceSize> {
        self.session.lock().surface()
    }

    pub fn is_graphics_ready(&self) -> bool {
        self.session.lock().is_graphics_ready()
    }

    /// Install crash capture, run first-time setup if needed, then create the
    /// engine. Returns whether first-time setup ran.
    pub fn on_create<E>(
        &self,
        prefs: &mut dyn Preferences,
        first_run: impl FnOnce(&Path) -> std::result::Result<(), E>,
    ) -> std::result::Result<bool, E> {
        CrashHandler::install(self.config.crash_capture(self.engine.clone()));
        let ran = ensure_configured(prefs, &self.config.data_dir, first_run)?;

        log::info!(
            "Creating engine in {} ({:?})",
            self.config.data_dir.display(),
            self.config.audio
        );
        self.engine.on_create(&self.config.data_dir, self.config.audio);
        Ok(ran)
    }

    /// First frame of the drawable surface. Releases the startup pause and
    /// shows the splash screen.
    pub fn graphics_ready(&self, width: i32, height: i32) {
        let size = SurfaceSize::landscape(width, height);
        {
            let mut state = self.session.lock();
            state.surface = Some(size);
            state.graphics_ready = true;
            state.run.resume(PauseReason::Startup);
        }
        log::info!("Graphics ready: {}x{}", size.width, size.height);
        self.engine.on_graphics_ready(size);
        self.show_splash();
    }

    /// Layout change. Before graphics are ready only the size is recorded.
    pub fn graphics_resized(&self, width: i32, height: i32) {
        let size = SurfaceSize::landscape(width, height);
        {
            let mut state = self.session.lock();
            state.surface = Some(size);
            if !state.graphics_ready {
                log::debug!("Resize to {}x{} before graphics ready", size.width, size.height);
                return;
            }
            for overlay in state.overlays.iter_mut() {
                overlay.attach(size);
            }
        }
        log::debug!("Graphics resized: {}x{}", size.width, size.height);
        self.engine.on_graphics_resized(size);
    }

    /// Returns whether the key was consumed.
    pub fn key_down(&self, code: i32, modifiers: i32) -> bool {
        if is_volume_key(code) {
            return false;
        }
        self.engine.on_key_down(code, modifiers);
        true
    }

    /// Back dismisses the top overlay or opens the main menu; Menu opens the
    /// main menu. Returns whether the key was consumed.
    pub fn key_up(&self, code: i32, modifiers: i32) -> bool {
        match code {
            KEYCODE_BACK => {
                self.back();
                true
            }
            KEYCODE_MENU => {
                self.show_main_menu();
                true
            }
            code if is_volume_key(code) => false,
            _ => {
                self.engine.on_key_up(code, modifiers);
                true
            }
        }
    }

    pub fn back(&self) {
        match self.overlays.peek() {
            Some(kind) => {
                self.overlays.dismiss(kind);
            }
            None => {
                self.show_main_menu();
            }
        }
    }

    /// Forward a touch batch while no overlay is showing.
    pub fn touch(
        &self,
        action: TouchAction,
        pointer_count: usize,
        action_index: usize,
        xs: &[f32],
        ys: &[f32],
    ) -> TouchOutcome {
        {
            let state = self.session.lock();
            if !state.graphics_ready || state.depth() > 0 {
                return TouchOutcome::default();
            }
        }

        let flags = self.touch.translate(action, pointer_count, action_index, xs, ys);
        let outcome = TouchOutcome::from_flags(flags);
        if outcome.show_menu {
            self.show_main_menu();
        }
        outcome
    }

    /// Render tick, skipped before graphics are ready and while backgrounded.
    pub fn render(&self) {
        let ready = {
            let state = self.session.lock();
            state.graphics_ready && !state.run.is_paused_for(PauseReason::Host)
        };
        if ready {
            self.engine.on_render();
        }
    }

    /// Host surface went to the background: tear down every overlay and
    /// pause the engine. Emptying the stack does not resume because the host
    /// pause is taken first.
    pub fn host_paused(&self) {
        if self.session.lock().run.pause(PauseReason::Host) {
            log::info!("Host paused");
        }
        for overlay in self.overlays.drain() {
            log::debug!("Dismissed {:?} on background", overlay.kind());
        }
        self.engine.on_pause(true);
    }

    /// Host surface is back. The engine resumes only if nothing else holds it.
    pub fn host_resumed(&self) {
        let resumed = self.session.lock().run.resume(PauseReason::Host);
        if resumed {
            log::info!("Host resumed");
            self.engine.on_resume(true);
        } else {
            log::debug!("Host resumed, engine held: {:?}", self.run_state());
        }
    }

    pub fn show_splash(&self) -> bool {
        self.overlays.show(SplashScreen::new(true))
    }

    pub fn show_main_menu(&self) -> bool {
        self.overlays.show(MainMenu::new())
    }

    pub fn show_settings(&self) -> bool {
        self.overlays.show(SettingsMenu::new())
    }

    pub fn show_disks(&self) -> bool {
        if self.overlays.contains(OverlayKind::DisksMenu) {
            return false;
        }
        self.overlays.show(DisksMenu::scan(&self.config.disks_dir()))
    }

    pub fn press_splash(&self, button: SplashButton) -> Option<SplashAction> {
        let action = self
            .overlays
            .with_overlay(OverlayKind::SplashScreen, |o| match o {
                Overlay::SplashScreen(splash) => Some(splash.press(button)),
                _ => None,
            })
            .flatten()?;

        match action {
            SplashAction::Dismiss => {
                self.overlays.dismiss(OverlayKind::SplashScreen);
            }
            SplashAction::ShowSettings => {
                self.show_settings();
            }
            SplashAction::ShowDisks => {
                self.show_disks();
            }
            SplashAction::Ignored => {}
        }
        Some(action)
    }

    pub fn select_main_menu(&self, index: usize) -> Option<MainMenuAction> {
        let action = self
            .overlays
            .with_overlay(OverlayKind::MainMenu, |o| match o {
                Overlay::MainMenu(menu) => Some(menu.select(index)),
                _ => None,
            })
            .flatten()?;

        match action {
            MainMenuAction::ShowSettings => {
                self.show_settings();
            }
            MainMenuAction::ShowDisks => {
                self.show_disks();
            }
            MainMenuAction::Dismiss => {
                self.overlays.dismiss(OverlayKind::MainMenu);
            }
        }
        Some(action)
    }

    /// Editing the chosen preference is left to the host.
    pub fn select_setting(&self, index: usize) -> Option<SettingsItem> {
        self.overlays
            .with_overlay(OverlayKind::SettingsMenu, |o| match o {
                Overlay::SettingsMenu(menu) => menu.select(index),
                _ => None,
            })
            .flatten()
    }

    /// Insert the chosen image and close the disks menu.
    pub fn choose_disk(&self, index: usize, drive_a: bool, read_only: bool) -> Option<PathBuf> {
        let path = self
            .overlays
            .with_overlay(OverlayKind::DisksMenu, |o| match o {
                Overlay::DisksMenu(menu) => menu.choose(index).map(Path::to_path_buf),
                _ => None,
            })
            .flatten()?;

        log::info!("Inserting {} (drive {})", path.display(), if drive_a { 1 } else { 2 });
        self.engine.choose_disk(&path, drive_a, read_only);
        self.overlays.dismiss(OverlayKind::DisksMenu);
        Some(path)
    }

    pub fn maybe_quit(&self) -> bool {
        self.overlays.show(ConfirmDialog::new(ConfirmKind::Quit))
    }

    pub fn maybe_reboot(&self) -> bool {
        self.overlays.show(ConfirmDialog::new(ConfirmKind::Reboot))
    }

    /// Answer a confirmation prompt.
    ///
    /// An accepted quit leaves the prompt up so the engine stays paused while
    /// the host shuts down.
    pub fn confirm(&self, kind: ConfirmKind, accepted: bool) -> ConfirmOutcome {
        let overlay_kind = match kind {
            ConfirmKind::Quit => OverlayKind::QuitConfirm,
            ConfirmKind::Reboot => OverlayKind::RebootConfirm,
        };
        if !self.overlays.contains(overlay_kind) {
            return ConfirmOutcome::NotShowing;
        }
        if !accepted {
            self.overlays.dismiss(overlay_kind);
            return ConfirmOutcome::Cancelled;
        }

        match kind {
            ConfirmKind::Quit => {
                log::info!("Quit confirmed");
                self.engine.on_quit();
                ConfirmOutcome::QuitRequested
            }
            ConfirmKind::Reboot => {
                log::info!("Reboot confirmed");
                self.engine.on_reboot();
                self.overlays.pop_named(OverlayKind::RebootConfirm);
                self.overlays.pop_named(OverlayKind::MainMenu);
                ConfirmOutcome::Rebooted
            }
        }
    }

    pub fn crash_reporter(&self) -> &CrashReporter {
        &self.reporter
    }

    /// Whether the host should offer to send a crash report. True at most
    /// once per process.
    pub fn check_crashes(&self) -> bool {
        self.reporter.check_once().is_some()
    }

    pub fn send_crash_report(&self, transport: &dyn ReportTransport) -> Result<ReportOutcome> {
        self.reporter.transmit(transport)
    }

    pub fn discard_crash_report(&self) -> usize {
        self.reporter.discard()
    }
}
