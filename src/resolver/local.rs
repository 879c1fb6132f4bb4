//! Executable-adjacent library search.
//!
//! Searches directories tied to the running program: where the entry
//! executable lives, where the executing module lives (when distinct), and
//! the working directory. Each base is also probed at `lib/` and
//! `lib/<x64|x86>/` before moving on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use crate::platform::bitness_dir;
use crate::probe::HostProbe;

use super::result::{ResolveError, ResolveResult, ResolvedLibrary};
use super::PathResolver;

pub struct LocalPathResolver {
    probe: Arc<dyn HostProbe>,
    entry_dir: Option<PathBuf>,
    module_dir: Option<PathBuf>,
    current_dir: Option<PathBuf>,
}

impl LocalPathResolver {
    /// Capture the program's directories once; resolution probes against
    /// this snapshot.
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        let entry_dir = probe.current_exe_dir();
        // The module directory only matters when it differs from the entry
        // executable's.
        let module_dir = probe
            .current_module_dir()
            .filter(|dir| entry_dir.as_deref() != Some(dir.as_path()));
        let current_dir = probe.current_dir();
        Self {
            probe,
            entry_dir,
            module_dir,
            current_dir,
        }
    }

    fn scan_base(&self, base: &Path, library: &str) -> Option<PathBuf> {
        let direct = base.join(library);
        if self.probe.file_exists(&direct) {
            return Some(self.probe.absolutize(&direct));
        }

        let in_lib = base.join("lib").join(library);
        if self.probe.file_exists(&in_lib) {
            return Some(self.probe.absolutize(&in_lib));
        }

        let in_bitness = base.join("lib").join(bitness_dir()).join(library);
        if self.probe.file_exists(&in_bitness) {
            return Some(self.probe.absolutize(&in_bitness));
        }

        None
    }
}

impl PathResolver for LocalPathResolver {
    fn resolve(&self, library: &str) -> ResolveResult {
        let bases = [&self.entry_dir, &self.module_dir, &self.current_dir];
        for base in bases.into_iter().flatten() {
            if let Some(path) = self.scan_base(base, library) {
                trace!(library, path = %path.display(), "found local copy");
                return Ok(ResolvedLibrary::File(path));
            }
        }
        Err(ResolveError::NoLocalCopy {
            library: library.to_string(),
        })
    }
}
