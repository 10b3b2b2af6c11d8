use std::fs;
use std::sync::Arc;

use emu_bridge::overlay::{ConfirmKind, MainMenuAction, SplashAction, SplashButton};
use emu_bridge::testing::{EngineCall, RecordingEngine};
use emu_bridge::{BridgeConfig, ConfirmOutcome, Frontend, OverlayKind, PauseReason, SurfaceSize};
use proptest::prelude::*;

fn started() -> (Arc<RecordingEngine>, Frontend) {
    let engine = Arc::new(RecordingEngine::new());
    let frontend = Frontend::new(BridgeConfig::new("/nonexistent"), engine.clone());
    frontend.graphics_ready(480, 800);
    (engine, frontend)
}

fn pauses(engine: &RecordingEngine) -> usize {
    engine.count(|c| *c == EngineCall::Pause(false))
}

fn resumes(engine: &RecordingEngine) -> usize {
    engine.count(|c| *c == EngineCall::Resume(false))
}

#[test]
fn splash_settings_pop_pop() {
    let (engine, frontend) = started();
    assert_eq!(frontend.overlays().peek(), Some(OverlayKind::SplashScreen));

    assert_eq!(
        frontend.press_splash(SplashButton::Settings),
        Some(SplashAction::ShowSettings)
    );
    assert_eq!(frontend.overlays().depth(), 2);
    assert!(!frontend.run_state().is_running());

    frontend.overlays().pop();
    assert_eq!(resumes(&engine), 0);
    assert!(frontend.run_state().is_paused_for(PauseReason::Overlay));

    assert_eq!(
        frontend.press_splash(SplashButton::Start),
        Some(SplashAction::Dismiss)
    );
    assert!(frontend.overlays().is_empty());
    assert!(frontend.run_state().is_running());

    assert_eq!(
        engine.calls(),
        [
            EngineCall::GraphicsReady(SurfaceSize {
                width: 800,
                height: 480
            }),
            EngineCall::Pause(false),
            EngineCall::Pause(false),
            EngineCall::Resume(false),
        ]
    );
}

#[derive(Debug, Clone, Copy)]
enum Op {
    MainMenu,
    Settings,
    Quit,
    Reboot,
    Pop,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::MainMenu),
        Just(Op::Settings),
        Just(Op::Quit),
        Just(Op::Reboot),
        Just(Op::Pop),
    ]
}

proptest! {
    #[test]
    fn show_and_pop_keep_pause_coupling(ops in prop::collection::vec(op(), 0..200)) {
        let (engine, frontend) = started();
        frontend.overlays().pop();
        engine.clear();

        let mut shown = 0;
        let mut emptied = 0;
        for op in ops {
            let before = frontend.overlays().depth();
            match op {
                Op::MainMenu => shown += usize::from(frontend.show_main_menu()),
                Op::Settings => shown += usize::from(frontend.show_settings()),
                Op::Quit => shown += usize::from(frontend.maybe_quit()),
                Op::Reboot => shown += usize::from(frontend.maybe_reboot()),
                Op::Pop => {
                    if frontend.overlays().pop().is_some() && before == 1 {
                        emptied += 1;
                    }
                }
            }

            let depth = frontend.overlays().depth();
            prop_assert!(depth <= 4, "depth {}", depth);
            prop_assert_eq!(frontend.run_state().is_running(), depth == 0);
        }

        prop_assert_eq!(pauses(&engine), shown);
        prop_assert_eq!(resumes(&engine), emptied);
    }
}

#[test]
fn backgrounding_drains_without_overlay_resume() {
    let (engine, frontend) = started();
    frontend.show_main_menu();
    engine.clear();

    frontend.host_paused();
    assert!(frontend.overlays().is_empty());
    assert!(frontend.run_state().is_paused_for(PauseReason::Host));
    assert_eq!(engine.calls(), [EngineCall::Pause(true)]);

    frontend.host_resumed();
    assert!(frontend.run_state().is_running());
    assert_eq!(engine.calls(), [EngineCall::Pause(true), EngineCall::Resume(true)]);
}

#[test]
fn overlay_shown_while_backgrounded_holds_engine_after_resume() {
    let (engine, frontend) = started();
    frontend.overlays().pop();
    frontend.host_paused();
    frontend.show_main_menu();
    engine.clear();

    frontend.host_resumed();
    assert!(!frontend.run_state().is_running());
    assert_eq!(engine.count(|c| *c == EngineCall::Resume(true)), 0);

    assert_eq!(frontend.select_main_menu(2), Some(MainMenuAction::Dismiss));
    assert!(frontend.run_state().is_running());
    assert_eq!(engine.calls(), [EngineCall::Resume(false)]);
}

#[test]
fn quit_confirmation() {
    let (engine, frontend) = started();
    frontend.overlays().pop();

    assert_eq!(frontend.confirm(ConfirmKind::Quit, true), ConfirmOutcome::NotShowing);

    assert!(frontend.maybe_quit());
    assert!(!frontend.maybe_quit());
    assert_eq!(frontend.confirm(ConfirmKind::Quit, false), ConfirmOutcome::Cancelled);
    assert!(frontend.overlays().is_empty());

    frontend.maybe_quit();
    assert_eq!(frontend.confirm(ConfirmKind::Quit, true), ConfirmOutcome::QuitRequested);
    assert_eq!(frontend.overlays().peek(), Some(OverlayKind::QuitConfirm));
    assert!(!frontend.run_state().is_running());
    assert_eq!(engine.count(|c| *c == EngineCall::Quit), 1);
}

#[test]
fn reboot_closes_menu_and_resumes() {
    let (engine, frontend) = started();
    frontend.overlays().pop();
    frontend.show_main_menu();
    frontend.maybe_reboot();
    engine.clear();

    assert_eq!(frontend.confirm(ConfirmKind::Reboot, true), ConfirmOutcome::Rebooted);
    assert!(frontend.overlays().is_empty());
    assert_eq!(engine.calls(), [EngineCall::Reboot, EngineCall::Resume(false)]);
}

#[test]
fn choosing_a_disk_inserts_it_and_closes_the_menu() {
    let data = tempfile::tempdir().unwrap();
    let disks = data.path().join("disks");
    fs::create_dir(&disks).unwrap();
    for name in ["b.dsk", "a.po.gz", "notes.txt"] {
        fs::write(disks.join(name), b"image").unwrap();
    }

    let engine = Arc::new(RecordingEngine::new());
    let frontend = Frontend::new(BridgeConfig::new(data.path()), engine.clone());
    frontend.graphics_ready(800, 480);

    assert_eq!(
        frontend.press_splash(SplashButton::Disks),
        Some(SplashAction::ShowDisks)
    );
    assert_eq!(frontend.choose_disk(5, true, false), None);

    let chosen = frontend.choose_disk(1, true, false).unwrap();
    assert_eq!(chosen, disks.join("b.dsk"));
    assert!(engine
        .calls()
        .contains(&EngineCall::ChooseDisk(disks.join("b.dsk"), true, false)));
    assert_eq!(frontend.overlays().peek(), Some(OverlayKind::SplashScreen));
}

#[test]
fn settings_selection() {
    let (_, frontend) = started();
    assert_eq!(frontend.select_setting(0), None);

    frontend.show_settings();
    assert!(frontend.select_setting(0).is_some());
    assert_eq!(frontend.select_setting(99), None);
}
