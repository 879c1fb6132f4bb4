//! Library path resolution.
//!
//! Architecture:
//! - `result.rs` - identifier and outcome types
//! - `candidates.rs` - filename variant generation (pure)
//! - `local.rs` - executable-adjacent search scope
//! - `system.rs` - OS-defined search scopes, one per platform family
//!
//! [`LibraryPathResolver`] composes them in a fixed priority order: explicit
//! path, native search-directory hint, then the local and platform scopes in
//! the order selected by the `search_local_first` flag. First match wins; no
//! scoring.

mod candidates;
mod local;
mod result;
mod system;

#[cfg(test)]
mod tests;

pub use local::LocalPathResolver;
pub use result::{
    LibraryIdentifier, ResolveError, ResolveResult, ResolvedLibrary, CURRENT_PROCESS_SENTINEL,
};
pub use system::{LinuxPathResolver, MacOsPathResolver, WindowsPathResolver};

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::logging;
use crate::platform::{Platform, UnsupportedPlatformError};
use crate::probe::{HostProbe, SystemProbe};

use system::SystemPathResolver;

/// Environment list of directories the host's native loader was told to
/// search, honored ahead of the local and platform scopes.
const NATIVE_SEARCH_DIRECTORIES_VAR: &str = "NATIVE_DLL_SEARCH_DIRECTORIES";

/// One search scope's jurisdiction: resolve a candidate (or full identifier)
/// to an on-disk location.
pub trait PathResolver {
    fn resolve(&self, library: &str) -> ResolveResult;
}

/// Generate the ordered filename variants the given platform's loader would
/// conventionally accept for `identifier`. Pure; no filesystem access.
pub fn library_candidates(identifier: &str, platform: Platform) -> Vec<String> {
    candidates::generate(identifier, platform)
}

/// The orchestrating resolver.
///
/// Explicitly constructed rather than a process-wide static, so callers and
/// tests choose the probe, platform, and ordering.
pub struct LibraryPathResolver {
    probe: Arc<dyn HostProbe>,
    platform: Platform,
    local: LocalPathResolver,
    system: SystemPathResolver,
    search_local_first: bool,
}

impl LibraryPathResolver {
    /// Resolver over the real host, for the detected platform.
    pub fn new(search_local_first: bool) -> Result<Self, UnsupportedPlatformError> {
        Ok(Self::with_probe(
            Arc::new(SystemProbe::new()),
            Platform::detect()?,
            search_local_first,
        ))
    }

    /// Resolver over an injected probe and platform family. This is the
    /// substitution seam: a fake probe simulates any OS on any host.
    pub fn with_probe(
        probe: Arc<dyn HostProbe>,
        platform: Platform,
        search_local_first: bool,
    ) -> Self {
        let local = LocalPathResolver::new(Arc::clone(&probe));
        let system = SystemPathResolver::for_platform(platform, Arc::clone(&probe));
        Self {
            probe,
            platform,
            local,
            system,
            search_local_first,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve a raw identifier string.
    pub fn resolve(&self, library: &str) -> ResolveResult {
        self.resolve_identifier(&LibraryIdentifier::parse(library)?)
    }

    /// Resolve a parsed identifier.
    pub fn resolve_identifier(&self, identifier: &LibraryIdentifier) -> ResolveResult {
        let _perf = logging::perf::track("resolve");

        let name = match identifier {
            // The current-process marker succeeds unconditionally; no
            // filesystem state is consulted.
            LibraryIdentifier::CurrentProcess => {
                debug!("resolved current-process marker");
                return Ok(ResolvedLibrary::CurrentProcess);
            }
            LibraryIdentifier::Named(name) => name,
        };

        let candidates = candidates::generate(name, self.platform);

        // An identifier that names a path is tested for direct existence
        // before any search scope runs.
        if candidates::has_directory(name, self.platform) {
            for candidate in &candidates {
                let location = Path::new(candidate);
                if self.probe.file_exists(location) {
                    let path = self.probe.absolutize(location);
                    debug!(library = %name, path = %path.display(), "explicit path hit");
                    return Ok(ResolvedLibrary::File(path));
                }
            }
        }

        if let Some(hint) = self.probe.env_var(NATIVE_SEARCH_DIRECTORIES_VAR) {
            let separator = self.platform.list_separator();
            for dir in hint.split(separator).filter(|dir| !dir.is_empty()) {
                for candidate in &candidates {
                    let location = Path::new(dir).join(candidate);
                    if self.probe.file_exists(&location) {
                        let path = self.probe.absolutize(&location);
                        debug!(library = %name, path = %path.display(), "native search hint hit");
                        return Ok(ResolvedLibrary::File(path));
                    }
                }
            }
        }

        // Both scopes always run; the flag only flips their priority.
        let scopes: [&dyn PathResolver; 2] = if self.search_local_first {
            [&self.local, &self.system]
        } else {
            [&self.system, &self.local]
        };
        for scope in scopes {
            for candidate in &candidates {
                if let Ok(resolved) = scope.resolve(candidate) {
                    debug!(library = %name, resolved = %resolved, "library resolved");
                    return Ok(resolved);
                }
            }
        }

        Err(ResolveError::NotFound {
            library: name.clone(),
        })
    }
}

impl PathResolver for LibraryPathResolver {
    fn resolve(&self, library: &str) -> ResolveResult {
        LibraryPathResolver::resolve(self, library)
    }
}
