//! C ABI
//!
//! ```c
//! char *result = NULL;
//! const char *error = NULL;
//! int rc = jsonata_evaluate("a.b", "{\"a\":{\"b\":42}}", &result, &error);
//! /* rc == 0: result is set, error is NULL
//!    rc != 0: error is set, result is NULL */
//! jsonata_free_result(result); /* always safe */
//! /* never free(error) */
//! ```
//!
//! The error string lives in a per-thread slot owned by this library and
//! stays valid until the next `jsonata_evaluate` call on the same thread.

use crate::bridge::{Bridge, Classification, EvalError, EvaluationOutcome};
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;

static BRIDGE: Lazy<Bridge> = Lazy::new(Bridge::default);

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Evaluate `expression` against `json`.
///
/// Returns the classification code; `0` on success.
///
/// # Safety
///
/// `expression` and `json` must be null or point to NUL-terminated strings.
/// `result` and `error` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsonata_evaluate(
    expression: *const c_char,
    json: *const c_char,
    result: *mut *mut c_char,
    error: *mut *const c_char,
) -> c_int {
    if result.is_null() || error.is_null() {
        return Classification::InvalidArguments.code();
    }
    // SAFETY: both out-pointers were checked non-null and the caller
    // guarantees they are writable.
    unsafe {
        *result = ptr::null_mut();
        *error = ptr::null();
    }

    let outcome = if expression.is_null() || json.is_null() {
        EvaluationOutcome::Failure(EvalError::invalid_arguments(
            "expression or input JSON is NULL",
        ))
    } else {
        // SAFETY: non-null and NUL-terminated per the caller contract.
        let (expression, json) = unsafe { (CStr::from_ptr(expression), CStr::from_ptr(json)) };
        BRIDGE.evaluate(&expression.to_string_lossy(), &json.to_string_lossy())
    };

    let failure = match outcome {
        EvaluationOutcome::Success(text) => match CString::new(text.into_string()) {
            Ok(owned) => {
                // SAFETY: checked non-null above.
                unsafe { *result = owned.into_raw() };
                return Classification::Success.code();
            }
            Err(_) => EvalError::internal("result contains an interior NUL byte"),
        },
        EvaluationOutcome::Failure(err) => err,
    };

    let code = failure.classification().code();
    let message = publish_error(&failure);
    // SAFETY: checked non-null above.
    unsafe { *error = message };
    code
}

/// Release a result returned by [`jsonata_evaluate`]. Null is ignored.
///
/// # Safety
///
/// `result` must be null or a pointer obtained from `jsonata_evaluate` that
/// has not been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsonata_free_result(result: *mut c_char) -> c_int {
    if !result.is_null() {
        // SAFETY: produced by CString::into_raw in jsonata_evaluate.
        drop(unsafe { CString::from_raw(result) });
    }
    0
}

/// Store the error text in this thread's slot and return a pointer into it.
fn publish_error(err: &EvalError) -> *const c_char {
    let text = CString::new(err.to_string().replace('\0', "\\0")).unwrap_or_default();
    LAST_ERROR.with(|slot| {
        let mut slot = slot.borrow_mut();
        *slot = Some(text);
        slot.as_ref().map_or(ptr::null(), |text| text.as_ptr())
    })
}
