//! Host-side loading of the compiled extension.

use std::ffi::{CStr, CString, c_void};
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Mutex;

use crate::error::{LoadError, LoadResult};
use crate::ffi::read_cstr;
use crate::hello::HELLO_WORLD_SYMBOL;

/// Serializes `dl*` calls with the `dlerror` read that follows them.
static DL_LOCK: Mutex<()> = Mutex::new(());

type HelloWorldFn = extern "C" fn() -> *const c_char;

/// Returns the platform file name for a shared library called `name`.
pub fn library_filename(name: &str) -> String {
    format!(
        "{}{name}{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// An open shared object. Closed on drop.
pub struct Library {
    handle: NonNull<c_void>,
    path: PathBuf,
}

// Safety: dlopen handles may be used from any thread.
unsafe impl Send for Library {}
unsafe impl Sync for Library {}

impl Library {
    /// Loads the shared object at `path`, resolving all symbols immediately.
    pub fn open(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref().to_path_buf();
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| LoadError::InvalidPath { path: path.clone() })?;

        let _guard = DL_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        // Safety: c_path is a valid, NUL-terminated C string.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        match NonNull::new(handle) {
            Some(handle) => {
                log::debug!("loaded {}", path.display());
                Ok(Self { handle, path })
            }
            None => Err(LoadError::Open {
                reason: last_dl_error(),
                path,
            }),
        }
    }

    /// Path the library was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves `name` to its address in this library.
    ///
    /// The address is only valid while this `Library` is alive; dropping it
    /// unloads the code the address points into.
    pub fn symbol(&self, name: &str) -> LoadResult<NonNull<c_void>> {
        let missing = |reason: String| LoadError::MissingSymbol {
            symbol: name.to_string(),
            reason,
        };
        let c_name = CString::new(name).map_err(|_| missing("name contains a NUL byte".into()))?;

        let _guard = DL_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        // Safety: clears any stale error so a null result can be told apart.
        unsafe {
            libc::dlerror();
        }
        // Safety: handle came from dlopen and c_name is NUL-terminated.
        let address = unsafe { libc::dlsym(self.handle.as_ptr(), c_name.as_ptr()) };
        NonNull::new(address).ok_or_else(|| missing(last_dl_error()))
    }

    /// Calls the library's `hello_world` and returns its text.
    pub fn hello_world(&self) -> LoadResult<String> {
        let address = self.symbol(HELLO_WORLD_SYMBOL)?;
        // Safety: the exported symbol has the `HelloWorldFn` signature.
        let hello_world: HelloWorldFn = unsafe { std::mem::transmute(address.as_ptr()) };
        let text = read_cstr(hello_world(), HELLO_WORLD_SYMBOL)?;
        log::trace!("{HELLO_WORLD_SYMBOL} returned {text:?}");
        Ok(text)
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        let _guard = DL_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        // Safety: handle came from dlopen and is closed exactly once.
        let status = unsafe { libc::dlclose(self.handle.as_ptr()) };
        if status != 0 {
            log::warn!("failed to close {}: {}", self.path.display(), last_dl_error());
        }
    }
}

/// Reads the dynamic loader's last error. Must be called with `DL_LOCK` held.
fn last_dl_error() -> String {
    // Safety: dlerror returns null or a NUL-terminated string owned by libc.
    let message = unsafe { libc::dlerror() };
    if message.is_null() {
        return "unknown dynamic loader error".to_string();
    }
    // Safety: non-null dlerror results are valid C strings.
    unsafe { CStr::from_ptr(message) }
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_uses_platform_affixes() {
        let name = library_filename("hello");
        assert!(name.starts_with(std::env::consts::DLL_PREFIX));
        assert!(name.ends_with(std::env::consts::DLL_SUFFIX));
        assert!(name.contains("hello"));
        #[cfg(target_os = "linux")]
        assert_eq!(name, "libhello.so");
    }

    #[test]
    fn missing_file_fails_to_open() {
        let err = Library::open("/nonexistent/libhello.so").err().unwrap();
        match err {
            LoadError::Open { path, reason } => {
                assert_eq!(path, Path::new("/nonexistent/libhello.so"));
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nul_in_path_is_rejected() {
        let err = Library::open("lib\0hello.so").err().unwrap();
        assert!(matches!(err, LoadError::InvalidPath { .. }));
    }
}
