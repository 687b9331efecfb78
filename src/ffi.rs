//! Shared utilities for reading values returned across the C boundary.

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::error::{LoadError, LoadResult};

pub(crate) fn read_cstr(value: *const c_char, symbol: &str) -> LoadResult<String> {
    if value.is_null() {
        return Err(LoadError::NullString {
            symbol: symbol.to_string(),
        });
    }
    // Safety: caller guarantees a valid, NUL-terminated C string.
    let cstr = unsafe { CStr::from_ptr(value) };
    cstr.to_str()
        .map(str::to_owned)
        .map_err(|source| LoadError::InvalidUtf8 {
            symbol: symbol.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn null_is_an_error() {
        let err = read_cstr(ptr::null(), "hello_world").unwrap_err();
        assert!(matches!(err, LoadError::NullString { ref symbol } if symbol == "hello_world"));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let bytes = b"hello \xff\0";
        let err = read_cstr(bytes.as_ptr().cast(), "hello_world").unwrap_err();
        assert!(matches!(err, LoadError::InvalidUtf8 { .. }));
    }

    #[test]
    fn copies_valid_text() {
        let text = read_cstr(c"hello world".as_ptr(), "hello_world").unwrap();
        assert_eq!(text, "hello world");
    }
}
