//! Resolution identifiers and outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

/// Sentinel name meaning "bind against the running process image" (Mono
/// convention, kept for compatibility).
pub const CURRENT_PROCESS_SENTINEL: &str = "__Internal";

/// Caller-supplied name of a library to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LibraryIdentifier {
    /// A bare name, decorated name, or relative/absolute path.
    Named(String),
    /// The running process's own image.
    CurrentProcess,
}

impl LibraryIdentifier {
    /// Parse a raw identifier string. Empty input is a caller error.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        if raw.is_empty() {
            return Err(ResolveError::EmptyName);
        }
        if raw == CURRENT_PROCESS_SENTINEL {
            Ok(Self::CurrentProcess)
        } else {
            Ok(Self::Named(raw.to_string()))
        }
    }
}

impl fmt::Display for LibraryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::CurrentProcess => f.write_str(CURRENT_PROCESS_SENTINEL),
        }
    }
}

/// Successful resolution: a concrete file, or the current-process marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLibrary {
    File(PathBuf),
    CurrentProcess,
}

impl ResolvedLibrary {
    /// The resolved on-disk path; `None` for the current-process marker.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::CurrentProcess => None,
        }
    }
}

impl fmt::Display for ResolvedLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::CurrentProcess => f.write_str("<current process>"),
        }
    }
}

/// Why a resolution step (or the whole search) failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Empty identifier string.
    EmptyName,
    /// No copy exists in the executable-adjacent directories.
    NoLocalCopy { library: String },
    /// No copy exists in the OS-defined search locations.
    NotInSystemPaths { library: String },
    /// The search exhausted every scope.
    NotFound { library: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "library name must not be empty"),
            Self::NoLocalCopy { library } => {
                write!(f, "no local copy of the given library could be found: {}", library)
            }
            Self::NotInSystemPaths { library } => {
                write!(f, "the library was not found in any OS search path: {}", library)
            }
            Self::NotFound { library } => write!(
                f,
                "the specified library was not found in any of the loader search paths: {}",
                library
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Outcome of every resolution step; first success wins.
pub type ResolveResult = Result<ResolvedLibrary, ResolveError>;
