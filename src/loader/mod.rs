//! Native library loading.
//!
//! Architecture:
//! - `flags.rs` - RTLD-style symbol-resolution flags
//! - `dl.rs` - POSIX dynamic loader back end (dlopen family)
//! - `kernel32.rs` - Windows module loader back end
//!
//! The back end is selected once per process from the detected platform.
//! [`PlatformLoader`] drives it and translates native failures into
//! structured errors carrying the native message (and, on Windows, the OS
//! error code).

mod flags;

#[cfg(unix)]
mod dl;
#[cfg(windows)]
mod kernel32;


pub use flags::SymbolFlags;

use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, error};

use crate::platform::{Platform, UnsupportedPlatformError};
use crate::resolver::ResolvedLibrary;

/// Error reported by a native back end, attributed to the call that caused
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    pub message: String,
    /// OS-level error code, where the platform has one (Windows).
    pub code: Option<u32>,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: u32) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    /// The native layer failed without reporting a reason.
    pub fn unknown() -> Self {
        Self::new("unknown error")
    }
}

/// Uniform contract over the platform's native loader.
///
/// Implementations own the discipline around the platform's error state:
/// stale errors are drained before any call whose failure will be reported,
/// and each call is serialized with its own error read. Raw error queries
/// are never exposed detached from the call they attribute.
pub trait NativeLoader: Send + Sync {
    /// Map a library into the process. `None` binds against the running
    /// process image where the platform supports it.
    fn open(
        &self,
        library: Option<&Path>,
        flags: SymbolFlags,
    ) -> Result<NonNull<c_void>, NativeError>;

    /// Resolve an exported symbol to its address.
    fn resolve(
        &self,
        handle: NonNull<c_void>,
        symbol: &str,
    ) -> Result<NonNull<c_void>, NativeError>;

    /// Release a handle. Returns `false` when the native layer rejects it;
    /// must degrade gracefully on a stale handle, never crash the process.
    fn close(&self, handle: NonNull<c_void>) -> bool;
}

static DEFAULT_NATIVE: Lazy<Arc<dyn NativeLoader>> = Lazy::new(default_backend);

#[cfg(unix)]
fn default_backend() -> Arc<dyn NativeLoader> {
    Arc::new(dl::PosixDl::new())
}

#[cfg(windows)]
fn default_backend() -> Arc<dyn NativeLoader> {
    Arc::new(kernel32::WindowsNative::new())
}

#[cfg(not(any(unix, windows)))]
fn default_backend() -> Arc<dyn NativeLoader> {
    // Platform::detect already rejected this target.
    unreachable!("no native loader back end for this target")
}

/// Opaque handle to a loaded library.
///
/// Owned exclusively by whoever obtained it. Passing it to
/// [`PlatformLoader::close`] consumes it, so a closed handle cannot be used
/// or closed again through this API. There is no automatic close on drop:
/// the caller owns releasing it.
pub struct LibraryHandle {
    raw: NonNull<c_void>,
}

impl LibraryHandle {
    /// The raw native handle, for passing to foreign code. The handle stays
    /// owned by `self`.
    pub fn as_raw(&self) -> *mut c_void {
        self.raw.as_ptr()
    }
}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LibraryHandle({:p})", self.raw.as_ptr())
    }
}

// Native loader handles are process-wide, not thread-affine.
unsafe impl Send for LibraryHandle {}
unsafe impl Sync for LibraryHandle {}

/// Library loading errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The native open call failed for a resolved path.
    Load {
        library: String,
        message: String,
        code: Option<u32>,
    },
    /// The platform cannot honor the request (e.g. binding against the
    /// running process on Windows).
    UnsupportedOperation { operation: &'static str },
    /// The library path cannot be passed to the native layer.
    InvalidName,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load {
                library,
                message,
                code: Some(code),
            } => write!(
                f,
                "failed to load library {}: {} (error code {})",
                library, message, code
            ),
            Self::Load {
                library,
                message,
                code: None,
            } => write!(f, "failed to load library {}: {}", library, message),
            Self::UnsupportedOperation { operation } => {
                write!(f, "unsupported operation on this platform: {}", operation)
            }
            Self::InvalidName => write!(f, "library path contains an interior NUL byte"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Symbol lookup errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// The native symbol resolution failed for an open handle.
    Symbol {
        symbol: String,
        message: String,
        code: Option<u32>,
    },
    /// The symbol name cannot be passed to the native layer.
    InvalidName,
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol {
                symbol,
                message,
                code: Some(code),
            } => write!(
                f,
                "failed to resolve symbol {}: {} (error code {})",
                symbol, message, code
            ),
            Self::Symbol {
                symbol,
                message,
                code: None,
            } => write!(f, "failed to resolve symbol {}: {}", symbol, message),
            Self::InvalidName => write!(f, "symbol name contains an interior NUL byte"),
        }
    }
}

impl std::error::Error for SymbolError {}

/// Loads resolved libraries through the selected native back end.
pub struct PlatformLoader {
    native: Arc<dyn NativeLoader>,
    platform: Platform,
}

impl PlatformLoader {
    /// Loader over the process-wide native back end for the detected
    /// platform.
    pub fn new() -> Result<Self, UnsupportedPlatformError> {
        Ok(Self::with_native(
            Arc::clone(&DEFAULT_NATIVE),
            Platform::detect()?,
        ))
    }

    /// Loader over an injected back end. This is the substitution seam for
    /// tests and embedders.
    pub fn with_native(native: Arc<dyn NativeLoader>, platform: Platform) -> Self {
        Self { native, platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Open a resolved library. The current-process marker binds against
    /// the running image on POSIX platforms; Windows cannot honor it.
    pub fn load(
        &self,
        library: &ResolvedLibrary,
        flags: SymbolFlags,
    ) -> Result<LibraryHandle, LoadError> {
        debug_assert!(flags.is_valid());

        let path = match library {
            ResolvedLibrary::File(path) => {
                if path.as_os_str().as_encoded_bytes().contains(&0) {
                    return Err(LoadError::InvalidName);
                }
                Some(path.as_path())
            }
            ResolvedLibrary::CurrentProcess => {
                if self.platform == Platform::Windows {
                    return Err(LoadError::UnsupportedOperation {
                        operation: "binding symbols against the running process image",
                    });
                }
                None
            }
        };

        match self.native.open(path, flags) {
            Ok(raw) => {
                debug!(library = %library, "library opened");
                Ok(LibraryHandle { raw })
            }
            Err(native) => {
                error!(library = %library, message = %native.message, "native open failed");
                Err(LoadError::Load {
                    library: library.to_string(),
                    message: native.message,
                    code: native.code,
                })
            }
        }
    }

    /// Resolve an exported symbol from an open handle.
    pub fn resolve_symbol(
        &self,
        handle: &LibraryHandle,
        symbol: &str,
    ) -> Result<*const c_void, SymbolError> {
        if symbol.contains('\0') {
            return Err(SymbolError::InvalidName);
        }

        match self.native.resolve(handle.raw, symbol) {
            Ok(address) => Ok(address.as_ptr() as *const c_void),
            Err(native) => {
                error!(symbol, message = %native.message, "native symbol resolution failed");
                Err(SymbolError::Symbol {
                    symbol: symbol.to_string(),
                    message: native.message,
                    code: native.code,
                })
            }
        }
    }

    /// Release a handle, consuming it. Returns `false` when the native
    /// layer rejects the close.
    pub fn close(&self, handle: LibraryHandle) -> bool {
        let closed = self.native.close(handle.raw);
        debug!(handle = ?handle, closed, "library closed");
        closed
    }
}
