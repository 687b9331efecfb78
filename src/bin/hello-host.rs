//! Loads the hello extension and prints what its `hello_world` returns.
//!
//! # Usage
//!
//! ```sh
//! hello-host --library target/debug/libhello.so
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "hello-host")]
#[command(about = "Load the hello extension and print its greeting")]
struct Args {
    /// Shared library to load. Defaults to the extension next to this executable.
    #[arg(short, long, env = "HELLO_LIBRARY")]
    library: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,
}

#[cfg(unix)]
fn default_library() -> PathBuf {
    let filename = hello::loader::library_filename("hello");
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&filename)))
        .unwrap_or_else(|| PathBuf::from(".").join(filename))
}

#[cfg(unix)]
fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = hello::logging::init(args.log_level) {
        eprintln!("hello-host: {err}");
    }

    let path = args.library.unwrap_or_else(default_library);
    let result = hello::loader::Library::open(&path).and_then(|library| library.hello_world());
    match result {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("hello-host: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(unix))]
fn main() -> ExitCode {
    let _ = Args::parse();
    eprintln!("hello-host: loading libraries is only supported on Unix hosts");
    ExitCode::FAILURE
}
