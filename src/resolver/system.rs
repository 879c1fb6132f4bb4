//! Operating-system search-path resolvers, one per OS family.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use crate::platform::Platform;
use crate::probe::HostProbe;

use super::result::{ResolveError, ResolveResult, ResolvedLibrary};
use super::PathResolver;

/// The OS-family resolver selected at construction from the detected
/// platform, never re-chosen per call.
pub(super) enum SystemPathResolver {
    Linux(LinuxPathResolver),
    Windows(WindowsPathResolver),
    MacOs(MacOsPathResolver),
}

impl SystemPathResolver {
    pub(super) fn for_platform(platform: Platform, probe: Arc<dyn HostProbe>) -> Self {
        match platform {
            Platform::Windows => Self::Windows(WindowsPathResolver::new(probe)),
            // BSD shares the Linux search shape, loader cache included.
            Platform::Linux | Platform::Bsd => Self::Linux(LinuxPathResolver::new(probe)),
            Platform::MacOs => Self::MacOs(MacOsPathResolver::new(probe)),
        }
    }
}

impl PathResolver for SystemPathResolver {
    fn resolve(&self, library: &str) -> ResolveResult {
        match self {
            Self::Linux(resolver) => resolver.resolve(library),
            Self::Windows(resolver) => resolver.resolve(library),
            Self::MacOs(resolver) => resolver.resolve(library),
        }
    }
}

/// Linux and BSD: `LD_LIBRARY_PATH`, the loader cache, `/lib`, `/usr/lib`.
pub struct LinuxPathResolver {
    probe: Arc<dyn HostProbe>,
}

impl LinuxPathResolver {
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        Self { probe }
    }

    /// Scan the raw loader cache bytes for a matching entry.
    ///
    /// The cache is treated as an opaque NUL-separated list of path strings,
    /// matched by suffix plus exact filename. This is deliberately a
    /// heuristic, not a parser of the cache's binary index; its looseness is
    /// part of the contract.
    fn scan_loader_cache(&self, library: &str) -> Option<PathBuf> {
        let raw = self.probe.loader_cache()?;
        let text = String::from_utf8_lossy(&raw);
        let target = Path::new(library).file_name();
        text.split('\0')
            .find(|entry| entry.ends_with(library) && Path::new(entry).file_name() == target)
            .map(PathBuf::from)
    }
}

impl PathResolver for LinuxPathResolver {
    fn resolve(&self, library: &str) -> ResolveResult {
        if let Some(search_path) = self.probe.env_var("LD_LIBRARY_PATH") {
            for dir in search_path.split(':').filter(|dir| !dir.is_empty()) {
                let location = Path::new(dir).join(library);
                if self.probe.file_exists(&location) {
                    return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
                }
            }
        }

        if let Some(cached) = self.scan_loader_cache(library) {
            trace!(library, path = %cached.display(), "loader cache hit");
            return Ok(ResolvedLibrary::File(cached));
        }

        for base in ["/lib", "/usr/lib"] {
            let location = Path::new(base).join(library);
            if self.probe.file_exists(&location) {
                return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
            }
        }

        Err(ResolveError::NotInSystemPaths {
            library: library.to_string(),
        })
    }
}

/// Windows: executable directory, system directories, working directory,
/// then every `PATH` entry.
pub struct WindowsPathResolver {
    probe: Arc<dyn HostProbe>,
}

impl WindowsPathResolver {
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        Self { probe }
    }
}

impl PathResolver for WindowsPathResolver {
    fn resolve(&self, library: &str) -> ResolveResult {
        // Entry executable's directory; the parent of the working directory
        // stands in when the executable location is unknown.
        let exe_dir = self.probe.current_exe_dir().or_else(|| {
            self.probe
                .current_dir()
                .and_then(|dir| dir.parent().map(Path::to_path_buf))
        });
        if let Some(dir) = exe_dir {
            let location = dir.join(library);
            if self.probe.file_exists(&location) {
                return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
            }
        }

        if let Some(system_dir) = self.probe.system_directory() {
            let location = system_dir.join(library);
            if self.probe.file_exists(&location) {
                return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
            }
        }

        if let Some(windows_dir) = self.probe.windows_directory() {
            // Legacy 16-bit system subdirectory precedes the OS directory.
            let legacy = windows_dir.join("System").join(library);
            if self.probe.file_exists(&legacy) {
                return Ok(ResolvedLibrary::File(self.probe.absolutize(&legacy)));
            }

            let location = windows_dir.join(library);
            if self.probe.file_exists(&location) {
                return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
            }
        }

        if let Some(current_dir) = self.probe.current_dir() {
            let location = current_dir.join(library);
            if self.probe.file_exists(&location) {
                return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
            }
        }

        if let Some(path_var) = self.probe.env_var("PATH") {
            for dir in path_var.split(';').filter(|dir| !dir.is_empty()) {
                let location = Path::new(dir).join(library);
                if self.probe.file_exists(&location) {
                    return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
                }
            }
        }

        Err(ResolveError::NotInSystemPaths {
            library: library.to_string(),
        })
    }
}

/// macOS: the Linux shape without the loader cache, with dyld's environment
/// variable and library directories.
pub struct MacOsPathResolver {
    probe: Arc<dyn HostProbe>,
}

impl MacOsPathResolver {
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        Self { probe }
    }
}

impl PathResolver for MacOsPathResolver {
    fn resolve(&self, library: &str) -> ResolveResult {
        if let Some(search_path) = self.probe.env_var("DYLD_LIBRARY_PATH") {
            for dir in search_path.split(':').filter(|dir| !dir.is_empty()) {
                let location = Path::new(dir).join(library);
                if self.probe.file_exists(&location) {
                    return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
                }
            }
        }

        if let Some(current_dir) = self.probe.current_dir() {
            let location = current_dir.join(library);
            if self.probe.file_exists(&location) {
                return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
            }
        }

        for base in ["/usr/local/lib", "/usr/lib"] {
            let location = Path::new(base).join(library);
            if self.probe.file_exists(&location) {
                return Ok(ResolvedLibrary::File(self.probe.absolutize(&location)));
            }
        }

        Err(ResolveError::NotInSystemPaths {
            library: library.to_string(),
        })
    }
}
