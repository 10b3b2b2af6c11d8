//! C ABI for native hosts.
//!
//! The host creates a [`Frontend`] with [`emu_bridge_new`], passing the
//! engine as a table of `extern "C"` entry points, and drives it through the
//! opaque handle. Null handles are ignored. Nothing here unwinds into C.

use std::ffi::{c_char, c_void, CStr, CString};
use std::path::Path;
use std::sync::Arc;

use crate::config::{BridgeConfig, DeviceInfo, Preferences};
use crate::crash::{CrashHandler, CrashKind, ReportOutcome, ReportTransport};
use crate::engine::{AudioParams, EngineBridge, SurfaceSize};
use crate::error::{BridgeError, Result};
use crate::frontend::Frontend;
use crate::overlay::{ConfirmKind, SplashButton};
use crate::touch::{TouchAction, TouchResultFlags, TouchSample};

/// Engine entry points. `user_data` is passed back on every call.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct EngineVTable {
    pub user_data: *mut c_void,
    pub on_create: extern "C" fn(*mut c_void, *const c_char, i32, i32, i32),
    pub on_graphics_ready: extern "C" fn(*mut c_void, i32, i32),
    pub on_graphics_resized: extern "C" fn(*mut c_void, i32, i32),
    pub on_key_down: extern "C" fn(*mut c_void, i32, i32),
    pub on_key_up: extern "C" fn(*mut c_void, i32, i32),
    pub on_pause: extern "C" fn(*mut c_void, bool),
    pub on_resume: extern "C" fn(*mut c_void, bool),
    pub on_quit: extern "C" fn(*mut c_void),
    pub on_reboot: extern "C" fn(*mut c_void),
    pub on_render: extern "C" fn(*mut c_void),
    pub on_touch:
        extern "C" fn(*mut c_void, i32, i32, i32, *const f32, *const f32) -> u32,
    pub choose_disk: extern "C" fn(*mut c_void, *const c_char, bool, bool),
    pub on_uncaught_failure: extern "C" fn(*mut c_void, *const c_char, *const c_char),
}

/// Host parameters for [`emu_bridge_new`]. Strings may be null except
/// `data_dir`.
#[repr(C)]
pub struct BridgeParams {
    pub data_dir: *const c_char,
    pub home_dir: *const c_char,
    pub shared_dir: *const c_char,
    pub brand: *const c_char,
    pub model: *const c_char,
    pub manufacturer: *const c_char,
    pub device: *const c_char,
    pub sample_rate: i32,
    pub mono_buffer_bytes: i32,
    pub stereo_buffer_bytes: i32,
}

struct NativeEngine {
    vtable: EngineVTable,
}

// The engine owns its own synchronization; the vtable only forwards signals.
unsafe impl Send for NativeEngine {}
unsafe impl Sync for NativeEngine {}

fn path_to_cstring(path: &Path) -> Option<CString> {
    match CString::new(path.to_string_lossy().into_owned()) {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("{}", BridgeError::InvalidString(e.to_string()));
            None
        }
    }
}

/// Text with interior NULs is cut at the first one.
fn text_to_cstring(text: &str) -> CString {
    let end = text.find('\0').unwrap_or(text.len());
    CString::new(&text[..end]).unwrap_or_default()
}

impl EngineBridge for NativeEngine {
    fn on_create(&self, data_dir: &Path, audio: AudioParams) {
        if let Some(dir) = path_to_cstring(data_dir) {
            (self.vtable.on_create)(
                self.vtable.user_data,
                dir.as_ptr(),
                audio.sample_rate,
                audio.mono_buffer_bytes,
                audio.stereo_buffer_bytes,
            );
        }
    }

    fn on_graphics_ready(&self, size: SurfaceSize) {
        (self.vtable.on_graphics_ready)(self.vtable.user_data, size.width, size.height);
    }

    fn on_graphics_resized(&self, size: SurfaceSize) {
        (self.vtable.on_graphics_resized)(self.vtable.user_data, size.width, size.height);
    }

    fn on_key_down(&self, code: i32, modifiers: i32) {
        (self.vtable.on_key_down)(self.vtable.user_data, code, modifiers);
    }

    fn on_key_up(&self, code: i32, modifiers: i32) {
        (self.vtable.on_key_up)(self.vtable.user_data, code, modifiers);
    }

    fn on_pause(&self, host_initiated: bool) {
        (self.vtable.on_pause)(self.vtable.user_data, host_initiated);
    }

    fn on_resume(&self, host_initiated: bool) {
        (self.vtable.on_resume)(self.vtable.user_data, host_initiated);
    }

    fn on_quit(&self) {
        (self.vtable.on_quit)(self.vtable.user_data);
    }

    fn on_reboot(&self) {
        (self.vtable.on_reboot)(self.vtable.user_data);
    }

    fn on_render(&self) {
        (self.vtable.on_render)(self.vtable.user_data);
    }

    fn on_touch(&self, sample: &TouchSample) -> TouchResultFlags {
        let bits = (self.vtable.on_touch)(
            self.vtable.user_data,
            sample.action() as i32,
            sample.pointer_count() as i32,
            sample.action_index() as i32,
            sample.xs().as_ptr(),
            sample.ys().as_ptr(),
        );
        TouchResultFlags::from_bits_retain(bits)
    }

    fn choose_disk(&self, path: &Path, drive_a: bool, read_only: bool) {
        if let Some(path) = path_to_cstring(path) {
            (self.vtable.choose_disk)(self.vtable.user_data, path.as_ptr(), drive_a, read_only);
        }
    }

    fn on_uncaught_failure(&self, home_dir: &Path, text: &str) {
        if let Some(home) = path_to_cstring(home_dir) {
            let text = text_to_cstring(text);
            (self.vtable.on_uncaught_failure)(self.vtable.user_data, home.as_ptr(), text.as_ptr());
        }
    }
}

/// Owning pointer to a [`Frontend`], handed to the host by [`emu_bridge_new`].
pub type BridgeHandle = *mut Frontend;

/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn opt_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

/// Create a bridge. Returns null if `params` or its `data_dir` is null.
///
/// # Safety
///
/// `params` must point to a valid [`BridgeParams`] whose strings are null or
/// NUL-terminated, and `engine`'s function pointers must stay callable for
/// the life of the process.
#[no_mangle]
pub unsafe extern "C" fn emu_bridge_new(
    engine: EngineVTable,
    params: *const BridgeParams,
) -> BridgeHandle {
    crate::init_logging();

    let Some(params) = params.as_ref() else {
        return std::ptr::null_mut();
    };
    let Some(data_dir) = opt_string(params.data_dir) else {
        log::error!("emu_bridge_new: data_dir is required");
        return std::ptr::null_mut();
    };

    let mut config = BridgeConfig::new(data_dir)
        .with_audio(AudioParams {
            sample_rate: params.sample_rate,
            mono_buffer_bytes: params.mono_buffer_bytes,
            stereo_buffer_bytes: params.stereo_buffer_bytes,
        })
        .with_device(DeviceInfo {
            brand: opt_string(params.brand).unwrap_or_default(),
            model: opt_string(params.model).unwrap_or_default(),
            manufacturer: opt_string(params.manufacturer).unwrap_or_default(),
            device: opt_string(params.device).unwrap_or_default(),
        });
    if let Some(home) = opt_string(params.home_dir) {
        config = config.with_home_dir(home);
    }
    if let Some(shared) = opt_string(params.shared_dir) {
        config = config.with_shared_dir(shared);
    }

    log::info!("emu_bridge_new: {}", config.data_dir.display());
    let engine: Arc<dyn EngineBridge> = Arc::new(NativeEngine { vtable: engine });
    Box::into_raw(Box::new(Frontend::new(config, engine)))
}

fn with_bridge<R>(handle: BridgeHandle, default: R, f: impl FnOnce(&Frontend) -> R) -> R {
    if handle.is_null() {
        return default;
    }
    // Handles come from emu_bridge_new and stay valid until emu_bridge_destroy
    let frontend = unsafe { &*handle };
    f(frontend)
}

/// The host keeps the first-run flag; this mirrors it for one call.
struct FlagPreferences(bool);

impl Preferences for FlagPreferences {
    fn is_configured(&self) -> bool {
        self.0
    }

    fn set_configured(&mut self, configured: bool) {
        self.0 = configured;
    }
}

/// Host first-run hook: extract assets into the data directory. Returns true
/// on success.
pub type FirstRunFn = extern "C" fn(*mut c_void, *const c_char) -> bool;

/// Install crash capture, run `first_run` if the host is not `configured` yet,
/// then create the engine.
///
/// Returns 1 when setup ran (the host should persist its configured flag),
/// 0 when it was not needed, and -1 when setup failed, in which case the
/// engine is not created. A null `first_run` counts as a successful no-op.
#[no_mangle]
pub extern "C" fn emu_bridge_on_create(
    handle: BridgeHandle,
    configured: bool,
    first_run: Option<FirstRunFn>,
    user_data: *mut c_void,
) -> i32 {
    with_bridge(handle, -1, |bridge| {
        let mut prefs = FlagPreferences(configured);
        let result = bridge.on_create(&mut prefs, |dir| {
            let Some(first_run) = first_run else {
                return Ok(());
            };
            let path = path_to_cstring(dir)
                .ok_or_else(|| BridgeError::InvalidString(dir.display().to_string()))?;
            if first_run(user_data, path.as_ptr()) {
                Ok(())
            } else {
                Err(BridgeError::FirstRun(dir.to_path_buf()))
            }
        });
        match result {
            Ok(true) => 1,
            Ok(false) => 0,
            Err(e) => {
                log::error!("emu_bridge_on_create: {}", e);
                -1
            }
        }
    })
}

#[no_mangle]
pub extern "C" fn emu_bridge_graphics_ready(handle: BridgeHandle, width: i32, height: i32) {
    with_bridge(handle, (), |bridge| bridge.graphics_ready(width, height));
}

#[no_mangle]
pub extern "C" fn emu_bridge_graphics_resized(handle: BridgeHandle, width: i32, height: i32) {
    with_bridge(handle, (), |bridge| bridge.graphics_resized(width, height));
}

#[no_mangle]
pub extern "C" fn emu_bridge_key_down(handle: BridgeHandle, code: i32, modifiers: i32) -> bool {
    with_bridge(handle, false, |bridge| bridge.key_down(code, modifiers))
}

#[no_mangle]
pub extern "C" fn emu_bridge_key_up(handle: BridgeHandle, code: i32, modifiers: i32) -> bool {
    with_bridge(handle, false, |bridge| bridge.key_up(code, modifiers))
}

/// Bit 0 of the result: consumed. Bit 1: play a key click.
pub const TOUCH_OUTCOME_CONSUMED: u32 = 1 << 0;
pub const TOUCH_OUTCOME_KEY_CLICK: u32 = 1 << 1;

/// # Safety
///
/// `xs` and `ys` must each be null or point to at least `len` floats.
#[no_mangle]
pub unsafe extern "C" fn emu_bridge_touch(
    handle: BridgeHandle,
    action: i32,
    pointer_count: i32,
    action_index: i32,
    xs: *const f32,
    ys: *const f32,
    len: usize,
) -> u32 {
    if xs.is_null() || ys.is_null() {
        return 0;
    }
    let xs = std::slice::from_raw_parts(xs, len);
    let ys = std::slice::from_raw_parts(ys, len);
    with_bridge(handle, 0, |bridge| {
        let outcome = bridge.touch(
            TouchAction::from(action),
            pointer_count.max(0) as usize,
            action_index.max(0) as usize,
            xs,
            ys,
        );
        let mut bits = 0;
        if outcome.consumed {
            bits |= TOUCH_OUTCOME_CONSUMED;
        }
        if outcome.key_click {
            bits |= TOUCH_OUTCOME_KEY_CLICK;
        }
        bits
    })
}

#[no_mangle]
pub extern "C" fn emu_bridge_render(handle: BridgeHandle) {
    with_bridge(handle, (), |bridge| bridge.render());
}

#[no_mangle]
pub extern "C" fn emu_bridge_host_paused(handle: BridgeHandle) {
    with_bridge(handle, (), |bridge| bridge.host_paused());
}

#[no_mangle]
pub extern "C" fn emu_bridge_host_resumed(handle: BridgeHandle) {
    with_bridge(handle, (), |bridge| bridge.host_resumed());
}

#[no_mangle]
pub extern "C" fn emu_bridge_show_main_menu(handle: BridgeHandle) -> bool {
    with_bridge(handle, false, |bridge| bridge.show_main_menu())
}

/// Top overlay kind, or -1 when the stack is empty.
#[no_mangle]
pub extern "C" fn emu_bridge_top_overlay(handle: BridgeHandle) -> i32 {
    with_bridge(handle, -1, |bridge| {
        bridge.overlays().peek().map_or(-1, |kind| kind as i32)
    })
}

#[no_mangle]
pub extern "C" fn emu_bridge_press_splash(handle: BridgeHandle, button: i32) -> bool {
    with_bridge(handle, false, |bridge| {
        bridge.press_splash(SplashButton::from(button)).is_some()
    })
}

#[no_mangle]
pub extern "C" fn emu_bridge_select_main_menu(handle: BridgeHandle, index: i32) -> bool {
    with_bridge(handle, false, |bridge| {
        usize::try_from(index).is_ok_and(|i| bridge.select_main_menu(i).is_some())
    })
}

/// Index of the chosen settings item, or -1.
#[no_mangle]
pub extern "C" fn emu_bridge_select_setting(handle: BridgeHandle, index: i32) -> i32 {
    with_bridge(handle, -1, |bridge| {
        usize::try_from(index)
            .ok()
            .and_then(|i| bridge.select_setting(i))
            .map_or(-1, |_| index)
    })
}

#[no_mangle]
pub extern "C" fn emu_bridge_choose_disk(
    handle: BridgeHandle,
    index: i32,
    drive_a: bool,
    read_only: bool,
) -> bool {
    with_bridge(handle, false, |bridge| {
        usize::try_from(index).is_ok_and(|i| bridge.choose_disk(i, drive_a, read_only).is_some())
    })
}

#[no_mangle]
pub extern "C" fn emu_bridge_maybe_quit(handle: BridgeHandle) -> bool {
    with_bridge(handle, false, |bridge| bridge.maybe_quit())
}

#[no_mangle]
pub extern "C" fn emu_bridge_maybe_reboot(handle: BridgeHandle) -> bool {
    with_bridge(handle, false, |bridge| bridge.maybe_reboot())
}

/// `kind`: 0 quit, anything else reboot. Returns a [`crate::ConfirmOutcome`]
/// discriminant.
#[no_mangle]
pub extern "C" fn emu_bridge_confirm(handle: BridgeHandle, kind: i32, accepted: bool) -> i32 {
    let kind = if kind == 0 {
        ConfirmKind::Quit
    } else {
        ConfirmKind::Reboot
    };
    with_bridge(handle, crate::ConfirmOutcome::NotShowing as i32, |bridge| {
        bridge.confirm(kind, accepted) as i32
    })
}

#[no_mangle]
pub extern "C" fn emu_bridge_check_crashes(handle: BridgeHandle) -> bool {
    with_bridge(handle, false, |bridge| bridge.check_crashes())
}

/// Host callback that ships the report at `path`. Returns true on success.
pub type SendReportFn = extern "C" fn(*mut c_void, *const c_char) -> bool;

struct CallbackTransport {
    send: SendReportFn,
    user_data: *mut c_void,
}

impl ReportTransport for CallbackTransport {
    fn send(&self, report: &Path) -> Result<()> {
        let path = path_to_cstring(report)
            .ok_or_else(|| BridgeError::InvalidString(report.display().to_string()))?;
        if (self.send)(self.user_data, path.as_ptr()) {
            Ok(())
        } else {
            Err(BridgeError::Transport(report.display().to_string()))
        }
    }
}

/// 1 sent, 0 already sent this session or nothing to send, -1 failed.
#[no_mangle]
pub extern "C" fn emu_bridge_send_crash_report(
    handle: BridgeHandle,
    send: SendReportFn,
    user_data: *mut c_void,
) -> i32 {
    with_bridge(handle, -1, |bridge| {
        match bridge.send_crash_report(&CallbackTransport { send, user_data }) {
            Ok(ReportOutcome::Sent { .. }) => 1,
            Ok(_) => 0,
            Err(e) => {
                log::error!("Crash report failed: {}", e);
                -1
            }
        }
    })
}

#[no_mangle]
pub extern "C" fn emu_bridge_discard_crash_report(handle: BridgeHandle) -> i32 {
    with_bridge(handle, 0, |bridge| bridge.discard_crash_report() as i32)
}

/// Record a failure the host caught itself. `kind` is a [`CrashKind`]
/// discriminant.
///
/// # Safety
///
/// `trace` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn emu_bridge_report_crash(kind: i32, trace: *const c_char) -> bool {
    let trace = opt_string(trace).unwrap_or_default();
    CrashHandler::report(CrashKind::from(kind), &trace)
}

/// Release a bridge created by [`emu_bridge_new`]. The handle must not be used
/// afterwards.
#[no_mangle]
pub extern "C" fn emu_bridge_destroy(handle: BridgeHandle) {
    if handle.is_null() {
        return;
    }
    // Ownership returns from the host here
    let _ = unsafe { Box::from_raw(handle) };
    log::info!("emu_bridge_destroy: cleaned up");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles_are_ignored() {
        let null = std::ptr::null_mut();
        emu_bridge_graphics_ready(null, 800, 480);
        assert!(!emu_bridge_key_down(null, 30, 0));
        assert_eq!(emu_bridge_top_overlay(null), -1);
        assert_eq!(emu_bridge_confirm(null, 0, true), 3);
        emu_bridge_destroy(null);
    }

    #[test]
    fn interior_nul_truncates_text() {
        assert_eq!(text_to_cstring("abc\0def").as_bytes(), b"abc");
        assert_eq!(text_to_cstring("plain").as_bytes(), b"plain");
    }
}
