//! dynload - runtime resolution and loading of native shared libraries
//!
//! Locates platform shared libraries (`.so`, `.dylib`, `.dll`) by bare name,
//! decorated name, or explicit path, following each OS family's search-order
//! conventions, then loads the resolved file and binds exported symbols
//! through one uniform native-loader contract.
//!
//! The two halves compose but stand alone: [`LibraryPathResolver`] turns an
//! identifier into a concrete on-disk location (or the current-process
//! marker), and [`PlatformLoader`] turns that location into a live
//! [`LibraryHandle`] with symbol resolution and deterministic close.

pub mod loader;
pub mod logging;
pub mod platform;
pub mod probe;
pub mod resolver;

// Re-export the public surface
pub use loader::{
    LibraryHandle, LoadError, NativeError, NativeLoader, PlatformLoader, SymbolError, SymbolFlags,
};
pub use platform::{Platform, UnsupportedPlatformError};
pub use probe::{HostProbe, SystemProbe};
pub use resolver::{
    library_candidates, LibraryIdentifier, LibraryPathResolver, LocalPathResolver, PathResolver,
    ResolveError, ResolveResult, ResolvedLibrary,
};
