//! Windows module loader back end.
//!
//! Wraps `LoadLibraryW`/`GetProcAddress`/`FreeLibrary`. `GetLastError` is
//! thread-local on Windows, so no cross-thread draining is needed; the error
//! read still pairs immediately with the call it is attributed to.

use std::ffi::{c_void, CString};
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;

use winapi::shared::minwindef::HMODULE;
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::libloaderapi::{FreeLibrary, GetProcAddress, LoadLibraryW};

use super::{NativeError, NativeLoader, SymbolFlags};

#[derive(Debug, Default)]
pub(super) struct WindowsNative;

impl WindowsNative {
    pub(super) fn new() -> Self {
        Self
    }
}

impl NativeLoader for WindowsNative {
    fn open(
        &self,
        library: Option<&Path>,
        _flags: SymbolFlags,
    ) -> Result<NonNull<c_void>, NativeError> {
        // The platform loader rejects the current-process marker before it
        // reaches this back end; refuse rather than dereference null.
        let path = library.ok_or_else(|| {
            NativeError::new("null library names or paths are not supported on Windows")
        })?;

        let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
        let raw = unsafe { LoadLibraryW(wide.as_ptr()) };
        match NonNull::new(raw.cast::<c_void>()) {
            Some(handle) => Ok(handle),
            None => {
                let code = unsafe { GetLastError() };
                Err(NativeError::with_code(
                    format!("LoadLibraryW failed with error code {code}"),
                    code,
                ))
            }
        }
    }

    fn resolve(
        &self,
        handle: NonNull<c_void>,
        symbol: &str,
    ) -> Result<NonNull<c_void>, NativeError> {
        let name = CString::new(symbol)
            .map_err(|_| NativeError::new("symbol name contains an interior NUL byte"))?;

        let raw = unsafe { GetProcAddress(handle.as_ptr() as HMODULE, name.as_ptr()) };
        match NonNull::new(raw.cast::<c_void>()) {
            Some(address) => Ok(address),
            None => {
                let code = unsafe { GetLastError() };
                Err(NativeError::with_code(
                    format!("GetProcAddress failed with error code {code}"),
                    code,
                ))
            }
        }
    }

    fn close(&self, handle: NonNull<c_void>) -> bool {
        unsafe { FreeLibrary(handle.as_ptr() as HMODULE) != 0 }
    }
}
