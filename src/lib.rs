//! A loadable C-ABI extension exporting `hello_world`, plus the host-side
//! loader that calls it.

pub mod error;
mod ffi;
pub mod hello;
#[cfg(unix)]
pub mod loader;
pub mod logging;

pub use error::{LoadError, LoadResult};
pub use hello::{GREETING, HELLO_WORLD_SYMBOL, hello_world};
