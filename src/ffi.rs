//! FFI bindings for cogflux
//!
//! This module provides C-compatible functions for calling cogflux from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `cog_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::AnalysisConfig;
use crate::pipeline::{history_to_report, sessions_to_data_points, CognitiveProcessor};
use crate::safety::is_message_safe;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Read a required string argument, recording an error naming it if invalid
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn result_to_cstr(result: Result<String, crate::ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Extract features from a JSON array of raw sessions.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated JSON array of data points that must be freed with `cog_free_string`.
/// - Returns NULL on error; call `cog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cog_extract_features(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };
    result_to_cstr(sessions_to_data_points(json_str))
}

/// Analyze a JSON array of data points and return the report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `cog_free_string`.
/// - Returns NULL on error; call `cog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cog_history_to_report(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };
    result_to_cstr(history_to_report(json_str))
}

/// Check a display string against the forbidden-term list.
///
/// # Safety
/// - `text` must be a valid null-terminated C string.
/// - Returns 1 if safe, 0 if unsafe, -1 on invalid input.
#[no_mangle]
pub unsafe extern "C" fn cog_is_message_safe(text: *const c_char) -> i32 {
    clear_last_error();

    match required_arg(text, "text") {
        Some(s) => i32::from(is_message_safe(&s)),
        None => -1,
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a CognitiveProcessor
pub struct CognitiveProcessorHandle {
    processor: CognitiveProcessor,
}

/// Create a processor.
///
/// # Safety
/// - `config_json` may be NULL for defaults, otherwise a valid null-terminated C string.
/// - `model_path` may be NULL to use the statistical predictor only.
/// - Returns a pointer that must be freed with `cog_processor_free`.
/// - Returns NULL on error; call `cog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cog_processor_new(
    config_json: *const c_char,
    model_path: *const c_char,
) -> *mut CognitiveProcessorHandle {
    clear_last_error();

    let config = match cstr_to_string(config_json) {
        Some(json) => match AnalysisConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        None => AnalysisConfig::default(),
    };

    let mut processor = CognitiveProcessor::with_config(config);
    if let Some(path) = cstr_to_string(model_path) {
        processor = processor.with_model(path);
    }

    Box::into_raw(Box::new(CognitiveProcessorHandle { processor }))
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cog_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cog_processor_free(processor: *mut CognitiveProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Append raw sessions to the processor history and return the report JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cog_processor_new`.
/// - `json` must be a valid null-terminated C string holding a JSON array of sessions.
/// - Returns a newly allocated string that must be freed with `cog_free_string`.
/// - Returns NULL on error; call `cog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cog_processor_ingest(
    processor: *mut CognitiveProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };

    let result = handle
        .processor
        .ingest_sessions_json(&json_str)
        .and_then(|_| handle.processor.report());
    result_to_cstr(result)
}

/// Save the processor history to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cog_processor_new`.
/// - Returns a newly allocated string that must be freed with `cog_free_string`.
/// - Returns NULL on error; call `cog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cog_processor_save_history(
    processor: *mut CognitiveProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;
    result_to_cstr(handle.processor.save_history())
}

/// Load the processor history from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `cog_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error; call `cog_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cog_processor_load_history(
    processor: *mut CognitiveProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let Some(json_str) = required_arg(json, "JSON") else {
        return -1;
    };

    match handle.processor.load_history(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by cogflux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a cogflux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cog_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next cogflux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn cog_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the cogflux library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn cog_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AssessmentSession, RawSessionMetrics, ReactionMetrics, ReactionTrial};

    fn sessions_json() -> CString {
        let sessions: Vec<AssessmentSession> = (0..3)
            .map(|i| {
                AssessmentSession::new(1_700_000_000_000 + i * 86_400_000)
                    .with_session_id(format!("s{i}"))
                    .with_task(RawSessionMetrics::Reaction(ReactionMetrics {
                        trials: vec![ReactionTrial::new(300.0), ReactionTrial::new(320.0)],
                    }))
            })
            .collect();
        CString::new(serde_json::to_string(&sessions).unwrap()).unwrap()
    }

    #[test]
    fn test_ffi_extract_then_report() {
        let json = sessions_json();
        unsafe {
            let points = cog_extract_features(json.as_ptr());
            assert!(!points.is_null());
            let points_str = CStr::from_ptr(points).to_str().unwrap();
            assert!(points_str.contains("reactionTimeAvg"));
            let parsed: serde_json::Value = serde_json::from_str(points_str).unwrap();
            assert_eq!(parsed[0]["domains"]["reaction"]["valid_trials"], 2);

            let report = cog_history_to_report(points);
            assert!(!report.is_null());
            let report_str = CStr::from_ptr(report).to_str().unwrap();
            assert!(report_str.contains("report_version"));

            cog_free_string(points);
            cog_free_string(report);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = cog_processor_new(ptr::null(), ptr::null());
            assert!(!processor.is_null());

            let json = sessions_json();
            let report = cog_processor_ingest(processor, json.as_ptr());
            assert!(!report.is_null());
            cog_free_string(report);

            let history = cog_processor_save_history(processor);
            assert!(!history.is_null());

            let processor2 = cog_processor_new(ptr::null(), ptr::null());
            assert_eq!(cog_processor_load_history(processor2, history), 0);

            // the same sessions again are duplicates
            let again = cog_processor_ingest(processor2, json.as_ptr());
            assert!(again.is_null());
            assert!(!cog_last_error().is_null());

            cog_free_string(history);
            cog_processor_free(processor);
            cog_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_invalid_config() {
        let config = CString::new(r#"{"anomaly": {"z_threshold": -1}}"#).unwrap();
        unsafe {
            let processor = cog_processor_new(config.as_ptr(), ptr::null());
            assert!(processor.is_null());
            assert!(!cog_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_message_safety() {
        let safe = CString::new("Your results look steady").unwrap();
        let unsafe_text = CString::new("possible dementia").unwrap();
        unsafe {
            assert_eq!(cog_is_message_safe(safe.as_ptr()), 1);
            assert_eq!(cog_is_message_safe(unsafe_text.as_ptr()), 0);
            assert_eq!(cog_is_message_safe(ptr::null()), -1);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();
        unsafe {
            let result = cog_history_to_report(invalid.as_ptr());
            assert!(result.is_null());

            let error = cog_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = cog_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
