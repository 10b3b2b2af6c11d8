#![allow(non_snake_case)]

use std::cell::RefCell;
use std::ffi::CString;

use jni::objects::{JClass, JFloatArray, JObject, JString, JValue};
use jni::sys::{jboolean, jint, jlong, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;

use crate::config::Preferences;
use crate::crash::{ReportOutcome, ReportTransport};
use crate::error::{BridgeError, Result};
use crate::ffi::{
    emu_bridge_check_crashes, emu_bridge_choose_disk, emu_bridge_confirm, emu_bridge_destroy,
    emu_bridge_discard_crash_report, emu_bridge_graphics_ready, emu_bridge_graphics_resized,
    emu_bridge_host_paused, emu_bridge_host_resumed, emu_bridge_key_down, emu_bridge_key_up,
    emu_bridge_maybe_quit, emu_bridge_maybe_reboot, emu_bridge_new,
    emu_bridge_press_splash, emu_bridge_render, emu_bridge_report_crash,
    emu_bridge_select_main_menu, emu_bridge_select_setting, emu_bridge_show_main_menu,
    emu_bridge_top_overlay, emu_bridge_touch, BridgeHandle, BridgeParams, EngineVTable,
};
use crate::touch::MAX_POINTERS;

fn to_jboolean(value: bool) -> jboolean {
    if value {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Null Java strings map to `None`.
fn c_string(env: &mut JNIEnv, s: &JString) -> Option<CString> {
    if s.is_null() {
        return None;
    }
    let s: String = env.get_string(s).ok()?.into();
    CString::new(s).ok()
}

fn c_ptr(s: &Option<CString>) -> *const std::ffi::c_char {
    s.as_ref().map_or(std::ptr::null(), |s| s.as_ptr())
}

/// `engine` is the address of the engine library's [`EngineVTable`].
#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeCreate(
    mut env: JNIEnv,
    _class: JClass,
    engine: jlong,
    data_dir: JString,
    home_dir: JString,
    shared_dir: JString,
    brand: JString,
    model: JString,
    manufacturer: JString,
    device: JString,
    sample_rate: jint,
    mono_buffer_bytes: jint,
    stereo_buffer_bytes: jint,
) -> jlong {
    let engine = engine as *const EngineVTable;
    if engine.is_null() {
        log::error!("nativeCreate: null engine");
        return 0;
    }

    let data_dir = c_string(&mut env, &data_dir);
    let home_dir = c_string(&mut env, &home_dir);
    let shared_dir = c_string(&mut env, &shared_dir);
    let brand = c_string(&mut env, &brand);
    let model = c_string(&mut env, &model);
    let manufacturer = c_string(&mut env, &manufacturer);
    let device = c_string(&mut env, &device);

    let params = BridgeParams {
        data_dir: c_ptr(&data_dir),
        home_dir: c_ptr(&home_dir),
        shared_dir: c_ptr(&shared_dir),
        brand: c_ptr(&brand),
        model: c_ptr(&model),
        manufacturer: c_ptr(&manufacturer),
        device: c_ptr(&device),
        sample_rate,
        mono_buffer_bytes,
        stereo_buffer_bytes,
    };
    // The vtable is owned by the engine library and outlives the bridge
    let handle = unsafe { emu_bridge_new(*engine, &params) };
    handle as jlong
}

/// The host mirrors its persisted first-run flag for one call.
struct FlagPreferences(bool);

impl Preferences for FlagPreferences {
    fn is_configured(&self) -> bool {
        self.0
    }

    fn set_configured(&mut self, configured: bool) {
        self.0 = configured;
    }
}

/// Calls `boolean extract(String dataDir)` on `extractor` before the engine is
/// created when the host is not configured yet. Returns 1 when extraction ran,
/// 0 when it was not needed, -1 on failure.
#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeOnCreate(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    configured: jboolean,
    extractor: JObject,
) -> jint {
    let handle = handle as BridgeHandle;
    if handle.is_null() {
        return -1;
    }
    // Handles come from nativeCreate and stay valid until nativeDestroy
    let bridge = unsafe { &*handle };

    let mut prefs = FlagPreferences(configured != JNI_FALSE);
    let result = bridge.on_create(&mut prefs, |dir| {
        if extractor.is_null() {
            return Ok(());
        }
        let path = env
            .new_string(dir.to_string_lossy())
            .map_err(|e| BridgeError::InvalidString(e.to_string()))?;
        let extracted = env
            .call_method(
                &extractor,
                "extract",
                "(Ljava/lang/String;)Z",
                &[JValue::Object(&path)],
            )
            .and_then(|v| v.z())
            .map_err(|_| BridgeError::FirstRun(dir.to_path_buf()))?;
        if extracted {
            Ok(())
        } else {
            Err(BridgeError::FirstRun(dir.to_path_buf()))
        }
    });
    match result {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            log::error!("nativeOnCreate: {}", e);
            -1
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeGraphicsReady(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    width: jint,
    height: jint,
) {
    emu_bridge_graphics_ready(handle as BridgeHandle, width, height);
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeGraphicsResized(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    width: jint,
    height: jint,
) {
    emu_bridge_graphics_resized(handle as BridgeHandle, width, height);
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeKeyDown(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    code: jint,
    modifiers: jint,
) -> jboolean {
    to_jboolean(emu_bridge_key_down(handle as BridgeHandle, code, modifiers))
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeKeyUp(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    code: jint,
    modifiers: jint,
) -> jboolean {
    to_jboolean(emu_bridge_key_up(handle as BridgeHandle, code, modifiers))
}

fn pointer_slots(env: &JNIEnv, arr: &JFloatArray) -> usize {
    env.get_array_length(arr)
        .map_or(0, |n| (n.max(0) as usize).min(MAX_POINTERS))
}

/// Returns the touch outcome bits from [`crate::ffi`].
#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeTouch(
    env: JNIEnv,
    _class: JClass,
    handle: jlong,
    action: jint,
    pointer_count: jint,
    action_index: jint,
    xs: JFloatArray,
    ys: JFloatArray,
) -> jint {
    let len = pointer_slots(&env, &xs).min(pointer_slots(&env, &ys));

    let mut x_buf = [0.0f32; MAX_POINTERS];
    let mut y_buf = [0.0f32; MAX_POINTERS];
    if env.get_float_array_region(&xs, 0, &mut x_buf[..len]).is_err()
        || env.get_float_array_region(&ys, 0, &mut y_buf[..len]).is_err()
    {
        log::warn!("nativeTouch: could not read coordinates");
        return 0;
    }

    let bits = unsafe {
        emu_bridge_touch(
            handle as BridgeHandle,
            action,
            pointer_count,
            action_index,
            x_buf.as_ptr(),
            y_buf.as_ptr(),
            len,
        )
    };
    bits as jint
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeRender(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    emu_bridge_render(handle as BridgeHandle);
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeHostPaused(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    emu_bridge_host_paused(handle as BridgeHandle);
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeHostResumed(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    emu_bridge_host_resumed(handle as BridgeHandle);
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeShowMainMenu(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jboolean {
    to_jboolean(emu_bridge_show_main_menu(handle as BridgeHandle))
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeTopOverlay(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jint {
    emu_bridge_top_overlay(handle as BridgeHandle)
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativePressSplash(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    button: jint,
) -> jboolean {
    to_jboolean(emu_bridge_press_splash(handle as BridgeHandle, button))
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeSelectMainMenu(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    index: jint,
) -> jboolean {
    to_jboolean(emu_bridge_select_main_menu(handle as BridgeHandle, index))
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeSelectSetting(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    index: jint,
) -> jint {
    emu_bridge_select_setting(handle as BridgeHandle, index)
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeChooseDisk(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    index: jint,
    drive_a: jboolean,
    read_only: jboolean,
) -> jboolean {
    to_jboolean(emu_bridge_choose_disk(
        handle as BridgeHandle,
        index,
        drive_a != JNI_FALSE,
        read_only != JNI_FALSE,
    ))
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeMaybeQuit(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jboolean {
    to_jboolean(emu_bridge_maybe_quit(handle as BridgeHandle))
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeMaybeReboot(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jboolean {
    to_jboolean(emu_bridge_maybe_reboot(handle as BridgeHandle))
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeConfirm(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    kind: jint,
    accepted: jboolean,
) -> jint {
    emu_bridge_confirm(handle as BridgeHandle, kind, accepted != JNI_FALSE)
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeCheckCrashes(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jboolean {
    to_jboolean(emu_bridge_check_crashes(handle as BridgeHandle))
}

/// Calls `boolean send(String path)` on a Java object.
struct JavaTransport<'a, 'local> {
    env: RefCell<&'a mut JNIEnv<'local>>,
    sender: &'a JObject<'local>,
}

impl ReportTransport for JavaTransport<'_, '_> {
    fn send(&self, report: &std::path::Path) -> Result<()> {
        let mut env = self.env.borrow_mut();
        let path = env
            .new_string(report.to_string_lossy())
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        let sent = env
            .call_method(
                self.sender,
                "send",
                "(Ljava/lang/String;)Z",
                &[JValue::Object(&path)],
            )
            .and_then(|v| v.z())
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        if sent {
            Ok(())
        } else {
            Err(BridgeError::Transport(report.display().to_string()))
        }
    }
}

/// 1 sent, 0 nothing sent, -1 failed.
#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeSendCrashReport(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    sender: JObject,
) -> jint {
    let handle = handle as BridgeHandle;
    if handle.is_null() || sender.is_null() {
        return -1;
    }
    // Handles come from nativeCreate and stay valid until nativeDestroy
    let bridge = unsafe { &*handle };
    let transport = JavaTransport {
        env: RefCell::new(&mut env),
        sender: &sender,
    };
    match bridge.send_crash_report(&transport) {
        Ok(ReportOutcome::Sent { .. }) => 1,
        Ok(_) => 0,
        Err(e) => {
            log::error!("Crash report failed: {}", e);
            -1
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeDiscardCrashReport(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jint {
    emu_bridge_discard_crash_report(handle as BridgeHandle)
}

/// Uncaught exception on a Java thread.
#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeReportCrash(
    mut env: JNIEnv,
    _class: JClass,
    kind: jint,
    trace: JString,
) -> jboolean {
    let trace = c_string(&mut env, &trace);
    to_jboolean(unsafe { emu_bridge_report_crash(kind, c_ptr(&trace)) })
}

#[no_mangle]
pub extern "system" fn Java_org_emubridge_NativeBridge_nativeDestroy(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    emu_bridge_destroy(handle as BridgeHandle);
}
