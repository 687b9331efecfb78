//! The exported `hello_world` symbol.

use std::ffi::CStr;
use std::os::raw::c_char;

/// Text returned by [`hello_world`].
pub const GREETING: &CStr = c"hello world";

/// Name under which [`hello_world`] is exported.
pub const HELLO_WORLD_SYMBOL: &str = "hello_world";

/// Returns a static, NUL-terminated "hello world" string.
///
/// The pointer refers to read-only static storage. Callers must not free or
/// modify it.
#[unsafe(no_mangle)]
pub extern "C" fn hello_world() -> *const c_char {
    GREETING.as_ptr()
}
