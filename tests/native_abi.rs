//! C ABI driven the way a native host would. Own binary: `on_create`
//! installs the process-wide panic hook.

use std::ffi::{c_char, c_void, CStr, CString};
use std::sync::Mutex;

use emu_bridge::ffi::{
    emu_bridge_destroy, emu_bridge_new, emu_bridge_on_create, emu_bridge_top_overlay,
    BridgeParams, EngineVTable,
};

type Log = Mutex<Vec<String>>;

fn log_of<'a>(user_data: *mut c_void) -> &'a Log {
    unsafe { &*(user_data as *const Log) }
}

extern "C" fn on_create(ud: *mut c_void, dir: *const c_char, rate: i32, _: i32, _: i32) {
    let dir = unsafe { CStr::from_ptr(dir) }.to_string_lossy();
    log_of(ud).lock().unwrap().push(format!("create {dir} {rate}"));
}
extern "C" fn size_noop(_: *mut c_void, _: i32, _: i32) {}
extern "C" fn flag_noop(_: *mut c_void, _: bool) {}
extern "C" fn noop(_: *mut c_void) {}
extern "C" fn on_touch(_: *mut c_void, _: i32, _: i32, _: i32, _: *const f32, _: *const f32) -> u32 {
    0
}
extern "C" fn choose_disk(_: *mut c_void, _: *const c_char, _: bool, _: bool) {}
extern "C" fn on_failure(_: *mut c_void, _: *const c_char, _: *const c_char) {}

extern "C" fn extract_ok(ud: *mut c_void, dir: *const c_char) -> bool {
    let dir = unsafe { CStr::from_ptr(dir) }.to_string_lossy();
    log_of(ud).lock().unwrap().push(format!("extract {dir}"));
    true
}

extern "C" fn extract_fails(ud: *mut c_void, _: *const c_char) -> bool {
    log_of(ud).lock().unwrap().push("extract failed".into());
    false
}

fn vtable(log: &Log) -> EngineVTable {
    EngineVTable {
        user_data: log as *const Log as *mut c_void,
        on_create,
        on_graphics_ready: size_noop,
        on_graphics_resized: size_noop,
        on_key_down: size_noop,
        on_key_up: size_noop,
        on_pause: flag_noop,
        on_resume: flag_noop,
        on_quit: noop,
        on_reboot: noop,
        on_render: noop,
        on_touch,
        choose_disk,
        on_uncaught_failure: on_failure,
    }
}

fn with_handle(log: &Log, f: impl FnOnce(emu_bridge::ffi::BridgeHandle)) {
    let data_dir = CString::new("/data/emu").unwrap();
    let params = BridgeParams {
        data_dir: data_dir.as_ptr(),
        home_dir: std::ptr::null(),
        shared_dir: std::ptr::null(),
        brand: std::ptr::null(),
        model: std::ptr::null(),
        manufacturer: std::ptr::null(),
        device: std::ptr::null(),
        sample_rate: 44100,
        mono_buffer_bytes: 512,
        stereo_buffer_bytes: 1024,
    };
    let handle = unsafe { emu_bridge_new(vtable(log), &params) };
    assert!(!handle.is_null());
    f(handle);
    emu_bridge_destroy(handle);
}

fn user_data(log: &Log) -> *mut c_void {
    log as *const Log as *mut c_void
}

#[test]
fn first_run_extracts_before_engine_creation() {
    let log = Log::default();
    with_handle(&log, |handle| {
        assert_eq!(emu_bridge_on_create(handle, false, Some(extract_ok), user_data(&log)), 1);
        assert_eq!(emu_bridge_top_overlay(handle), -1);
    });
    assert_eq!(
        *log.lock().unwrap(),
        ["extract /data/emu", "create /data/emu 44100"]
    );
}

#[test]
fn configured_host_skips_extraction() {
    let log = Log::default();
    with_handle(&log, |handle| {
        assert_eq!(emu_bridge_on_create(handle, true, Some(extract_ok), user_data(&log)), 0);
    });
    assert_eq!(*log.lock().unwrap(), ["create /data/emu 44100"]);
}

#[test]
fn failed_extraction_leaves_engine_uncreated() {
    let log = Log::default();
    with_handle(&log, |handle| {
        assert_eq!(
            emu_bridge_on_create(handle, false, Some(extract_fails), user_data(&log)),
            -1
        );
    });
    assert_eq!(*log.lock().unwrap(), ["extract failed"]);
}

#[test]
fn null_handle_reports_failure() {
    assert_eq!(
        emu_bridge_on_create(std::ptr::null_mut(), false, None, std::ptr::null_mut()),
        -1
    );
}
