//! Host access seam - filesystem and environment probes.
//!
//! All lookups a resolver performs against the running system go through
//! [`HostProbe`], so tests can substitute an in-memory fake for any OS family
//! without mutating process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

/// Read-only view of the host the resolvers search.
pub trait HostProbe: Send + Sync {
    /// True when `path` names an existing regular file. Every filesystem
    /// error (absent, permission denied) is uniformly "not here".
    fn file_exists(&self, path: &Path) -> bool;

    /// Non-empty value of an environment variable.
    fn env_var(&self, name: &str) -> Option<String>;

    fn current_dir(&self) -> Option<PathBuf>;

    /// Directory containing the entry executable.
    fn current_exe_dir(&self) -> Option<PathBuf>;

    /// Directory containing the currently executing module. Coincides with
    /// [`Self::current_exe_dir`] in a statically linked program; only
    /// consulted as a fallback when it differs.
    fn current_module_dir(&self) -> Option<PathBuf> {
        self.current_exe_dir()
    }

    /// Windows system directory (System32). `None` elsewhere.
    fn system_directory(&self) -> Option<PathBuf> {
        None
    }

    /// Windows OS directory. `None` elsewhere.
    fn windows_directory(&self) -> Option<PathBuf> {
        None
    }

    /// Raw bytes of the dynamic loader cache file, where the platform keeps
    /// one (Linux/BSD `/etc/ld.so.cache`).
    fn loader_cache(&self) -> Option<Vec<u8>> {
        None
    }

    /// Make `path` absolute against the probe's current directory. No
    /// symlink resolution.
    fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.current_dir() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}

/// Linux/BSD dynamic loader cache location.
const LD_SO_CACHE: &str = "/etc/ld.so.cache";

/// The real host, backed by `std::fs` / `std::env` and, on Windows, the
/// kernel32 directory queries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl SystemProbe {
    pub fn new() -> Self {
        Self
    }
}

impl HostProbe for SystemProbe {
    fn file_exists(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn current_dir(&self) -> Option<PathBuf> {
        std::env::current_dir().ok()
    }

    fn current_exe_dir(&self) -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
    }

    fn system_directory(&self) -> Option<PathBuf> {
        windows_dirs::system_directory()
    }

    fn windows_directory(&self) -> Option<PathBuf> {
        windows_dirs::windows_directory()
    }

    fn loader_cache(&self) -> Option<Vec<u8>> {
        fs::read(LD_SO_CACHE).ok()
    }
}

#[cfg(windows)]
mod windows_dirs {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use std::path::PathBuf;

    use winapi::um::sysinfoapi::{GetSystemDirectoryW, GetWindowsDirectoryW};

    const MAX_PATH: usize = 260;

    fn query(f: unsafe extern "system" fn(*mut u16, u32) -> u32) -> Option<PathBuf> {
        let mut buf = [0u16; MAX_PATH];
        let len = unsafe { f(buf.as_mut_ptr(), buf.len() as u32) } as usize;
        if len == 0 || len > buf.len() {
            return None;
        }
        Some(PathBuf::from(OsString::from_wide(&buf[..len])))
    }

    pub(super) fn system_directory() -> Option<PathBuf> {
        query(GetSystemDirectoryW)
    }

    pub(super) fn windows_directory() -> Option<PathBuf> {
        query(GetWindowsDirectoryW)
    }
}

#[cfg(not(windows))]
mod windows_dirs {
    use std::path::PathBuf;

    pub(super) fn system_directory() -> Option<PathBuf> {
        None
    }

    pub(super) fn windows_directory() -> Option<PathBuf> {
        None
    }
}
