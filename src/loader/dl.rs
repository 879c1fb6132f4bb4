//! POSIX dynamic loader back end.
//!
//! Wraps `dlopen`/`dlsym`/`dlclose`/`dlerror`. The `libc` crate binds the
//! right import library per target (libdl on Linux, libc on the BSDs and
//! macOS), so one back end serves every POSIX family.
//!
//! Error discipline: `dlerror` state is process-global, so every call is
//! serialized with its error read under one lock, and any stale error left
//! by unrelated prior calls is drained before a call whose failure will be
//! attributed.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_int;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::{self, NonNull};

use parking_lot::Mutex;

use super::{NativeError, NativeLoader, SymbolFlags};

/// Serializes each dl call with the error read it is attributed to.
static DL_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Default)]
pub(super) struct PosixDl;

impl PosixDl {
    pub(super) fn new() -> Self {
        Self
    }

    fn rtld_mode(flags: SymbolFlags) -> c_int {
        let mut mode = if flags.contains(SymbolFlags::NOW) {
            libc::RTLD_NOW
        } else {
            libc::RTLD_LAZY
        };
        if flags.contains(SymbolFlags::GLOBAL) {
            mode |= libc::RTLD_GLOBAL;
        } else {
            mode |= libc::RTLD_LOCAL;
        }
        mode
    }
}

/// Clear any outstanding error state by querying until none is reported.
///
/// Caller must hold `DL_LOCK`.
fn drain_stale_errors() {
    unsafe {
        while !libc::dlerror().is_null() {}
    }
}

/// Read and consume the error left by the immediately preceding call.
///
/// Caller must hold `DL_LOCK`.
fn take_error() -> Option<String> {
    unsafe {
        let err = libc::dlerror();
        if err.is_null() {
            None
        } else {
            Some(CStr::from_ptr(err).to_string_lossy().into_owned())
        }
    }
}

impl NativeLoader for PosixDl {
    fn open(
        &self,
        library: Option<&Path>,
        flags: SymbolFlags,
    ) -> Result<NonNull<c_void>, NativeError> {
        let path = match library {
            Some(path) => Some(
                CString::new(path.as_os_str().as_bytes())
                    .map_err(|_| NativeError::new("library path contains an interior NUL byte"))?,
            ),
            // A null filename opens the main program image.
            None => None,
        };

        let _guard = DL_LOCK.lock();
        drain_stale_errors();
        let raw = unsafe {
            libc::dlopen(
                path.as_ref().map_or(ptr::null(), |p| p.as_ptr()),
                Self::rtld_mode(flags),
            )
        };
        match NonNull::new(raw) {
            Some(handle) => Ok(handle),
            None => Err(take_error().map_or_else(NativeError::unknown, NativeError::new)),
        }
    }

    fn resolve(
        &self,
        handle: NonNull<c_void>,
        symbol: &str,
    ) -> Result<NonNull<c_void>, NativeError> {
        let name = CString::new(symbol)
            .map_err(|_| NativeError::new("symbol name contains an interior NUL byte"))?;

        let _guard = DL_LOCK.lock();
        drain_stale_errors();
        let raw = unsafe { libc::dlsym(handle.as_ptr(), name.as_ptr()) };
        match NonNull::new(raw) {
            Some(address) => Ok(address),
            None => Err(take_error().map_or_else(NativeError::unknown, NativeError::new)),
        }
    }

    fn close(&self, handle: NonNull<c_void>) -> bool {
        let _guard = DL_LOCK.lock();
        drain_stale_errors();
        let closed = unsafe { libc::dlclose(handle.as_ptr()) } == 0;
        if !closed {
            // Consume the error so it cannot be misattributed later.
            let _ = take_error();
        }
        closed
    }
}
