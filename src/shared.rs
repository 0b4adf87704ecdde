//! Shared-library function dispatch.
//!
//! A function call whose name matches no builtin is offered to an
//! externally configured dynamic library: the `CLASSAD_LIB_PATH`
//! environment variable names the library, and the function name is the
//! symbol looked up inside it. Values cross the boundary through a plain
//! `#[repr(C)]` tagged struct so the library needs no knowledge of this
//! crate. Every failure mode -- variable unset, library unloadable,
//! symbol missing -- is an ordinary Error value, never a crash.

use std::ffi::{c_char, c_int, CStr, CString};

use libloading::Library;

use crate::value::Value;

/// Environment variable naming the extension library.
pub const LIB_PATH_VAR: &str = "CLASSAD_LIB_PATH";

/// Value kinds understood on both sides of the ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedValueKind {
    Integer = 0,
    Real = 1,
    Text = 2,
    Undefined = 3,
    Error = 4,
}

/// The marshalled value. Exactly one payload field is meaningful for a
/// given `kind`; `text` is only read for `Text` and must be NUL-terminated.
#[repr(C)]
pub struct SharedValue {
    pub kind: SharedValueKind,
    pub integer: i64,
    pub real: f64,
    pub text: *const c_char,
}

impl SharedValue {
    fn error() -> Self {
        SharedValue {
            kind: SharedValueKind::Error,
            integer: 0,
            real: 0.0,
            text: std::ptr::null(),
        }
    }
}

/// The signature an extension function must export:
/// `(argc, argv, result_out)`.
pub type SharedFunction = unsafe extern "C" fn(c_int, *const SharedValue, *mut SharedValue);

/// Call `name` in the configured library with the given arguments.
pub(crate) fn dispatch(name: &str, args: &[Value]) -> Value {
    let Ok(path) = std::env::var(LIB_PATH_VAR) else {
        return Value::Error;
    };

    // keep the argument strings alive across the call
    let mut texts: Vec<CString> = Vec::new();
    let marshalled: Vec<SharedValue> = args
        .iter()
        .map(|arg| marshal(arg, &mut texts))
        .collect();

    let mut result = SharedValue::error();

    // The library and symbol come from the host's configuration; the call
    // itself is the unavoidable trust boundary of this extension point.
    unsafe {
        let Ok(library) = Library::new(&path) else {
            return Value::Error;
        };
        let Ok(function) = library.get::<SharedFunction>(name.as_bytes()) else {
            return Value::Error;
        };
        function(
            marshalled.len() as c_int,
            marshalled.as_ptr(),
            &mut result,
        );

        unmarshal(&result)
    }
}

fn marshal(value: &Value, texts: &mut Vec<CString>) -> SharedValue {
    let mut out = SharedValue::error();
    match value {
        Value::Integer(n) => {
            out.kind = SharedValueKind::Integer;
            out.integer = *n;
        }
        Value::Float(n) => {
            out.kind = SharedValueKind::Real;
            out.real = *n;
        }
        Value::Str(s) => match CString::new(s.as_str()) {
            Ok(text) => {
                out.kind = SharedValueKind::Text;
                // the buffer address survives the move into the vec
                out.text = text.as_ptr();
                texts.push(text);
            }
            // interior NUL cannot cross the boundary
            Err(_) => out.kind = SharedValueKind::Error,
        },
        Value::Undefined => out.kind = SharedValueKind::Undefined,
        // times, booleans, and null have no ABI representation
        _ => out.kind = SharedValueKind::Error,
    }
    out
}

unsafe fn unmarshal(result: &SharedValue) -> Value {
    match result.kind {
        SharedValueKind::Integer => Value::Integer(result.integer),
        SharedValueKind::Real => Value::Float(result.real),
        SharedValueKind::Text => {
            if result.text.is_null() {
                Value::Str(String::new())
            } else {
                let text = unsafe { CStr::from_ptr(result.text) };
                Value::Str(text.to_string_lossy().into_owned())
            }
        }
        SharedValueKind::Undefined => Value::Undefined,
        SharedValueKind::Error => Value::Error,
    }
}
