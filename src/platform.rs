//! OS family detection and platform naming conventions.
//!
//! Detection runs once per process; every resolver and loader back end is
//! selected from the same cached answer, never re-probed per call.

use std::fmt;

use once_cell::sync::OnceCell;

/// Operating-system family, as far as library search semantics differ.
///
/// BSD shares the Linux search shape (including the loader cache step);
/// macOS shares the POSIX naming conventions but not the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    Bsd,
    MacOs,
}

impl Platform {
    /// Detect the running OS family. The answer is computed once and cached.
    ///
    /// Fails with [`UnsupportedPlatformError`] when the target is none of the
    /// supported families; no resolver or loader can be selected in that
    /// case, so the error surfaces immediately.
    pub fn detect() -> Result<Self, UnsupportedPlatformError> {
        static DETECTED: OnceCell<Result<Platform, UnsupportedPlatformError>> = OnceCell::new();
        DETECTED.get_or_init(Self::probe).clone()
    }

    fn probe() -> Result<Self, UnsupportedPlatformError> {
        if cfg!(windows) {
            Ok(Self::Windows)
        } else if cfg!(target_os = "linux") {
            Ok(Self::Linux)
        } else if cfg!(any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            Ok(Self::Bsd)
        } else if cfg!(target_os = "macos") {
            Ok(Self::MacOs)
        } else {
            Err(UnsupportedPlatformError::new(std::env::consts::OS))
        }
    }

    /// Conventional shared-library filename suffix.
    pub const fn shared_lib_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".dll",
            Self::Linux | Self::Bsd => ".so",
            Self::MacOs => ".dylib",
        }
    }

    /// Conventional shared-library filename prefix ("" on Windows).
    pub const fn shared_lib_prefix(self) -> &'static str {
        match self {
            Self::Windows => "",
            Self::Linux | Self::Bsd | Self::MacOs => "lib",
        }
    }

    /// Environment variable naming the loader search path.
    pub const fn search_path_var(self) -> &'static str {
        match self {
            Self::Windows => "PATH",
            Self::Linux | Self::Bsd => "LD_LIBRARY_PATH",
            Self::MacOs => "DYLD_LIBRARY_PATH",
        }
    }

    /// Separator between entries of a path-list environment variable.
    pub const fn list_separator(self) -> char {
        match self {
            Self::Windows => ';',
            _ => ':',
        }
    }

    /// Main path component separator.
    pub const fn main_separator(self) -> char {
        match self {
            Self::Windows => '\\',
            _ => '/',
        }
    }

    pub const fn is_posix(self) -> bool {
        !matches!(self, Self::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Bsd => "bsd",
            Self::MacOs => "macos",
        };
        f.write_str(name)
    }
}

/// Pointer-width directory name used by executable-local `lib/` layouts.
pub const fn bitness_dir() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "x64"
    } else {
        "x86"
    }
}

/// The OS family could not be determined; no search semantics apply.
#[derive(Debug, Clone)]
pub struct UnsupportedPlatformError {
    os: String,
}

impl UnsupportedPlatformError {
    pub(crate) fn new(os: impl Into<String>) -> Self {
        Self { os: os.into() }
    }

    pub fn os(&self) -> &str {
        &self.os
    }
}

impl fmt::Display for UnsupportedPlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot resolve loader paths on this platform: {}", self.os)
    }
}

impl std::error::Error for UnsupportedPlatformError {}
