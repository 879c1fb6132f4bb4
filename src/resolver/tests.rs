//! Test suite for the resolver module.
//!
//! A fake probe simulates any OS family's filesystem and environment on any
//! host, so every platform's search semantics are exercised everywhere.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::candidates;
use super::*;
use crate::platform::{bitness_dir, Platform};
use crate::probe::HostProbe;

#[derive(Default)]
struct FakeProbe {
    files: BTreeSet<PathBuf>,
    env: HashMap<String, String>,
    current_dir: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
    module_dir: Option<PathBuf>,
    system_dir: Option<PathBuf>,
    windows_dir: Option<PathBuf>,
    cache: Option<Vec<u8>>,
}

impl FakeProbe {
    fn new() -> Self {
        Self::default()
    }

    fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }

    fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn with_exe_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exe_dir = Some(dir.into());
        self
    }

    fn with_module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_dir = Some(dir.into());
        self
    }

    fn with_system_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_dir = Some(dir.into());
        self
    }

    fn with_windows_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.windows_dir = Some(dir.into());
        self
    }

    fn with_cache(mut self, cache: &[u8]) -> Self {
        self.cache = Some(cache.to_vec());
        self
    }

    fn into_probe(self) -> Arc<dyn HostProbe> {
        Arc::new(self)
    }
}

impl HostProbe for FakeProbe {
    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn current_dir(&self) -> Option<PathBuf> {
        self.current_dir.clone()
    }

    fn current_exe_dir(&self) -> Option<PathBuf> {
        self.exe_dir.clone()
    }

    fn current_module_dir(&self) -> Option<PathBuf> {
        self.module_dir.clone().or_else(|| self.exe_dir.clone())
    }

    fn system_directory(&self) -> Option<PathBuf> {
        self.system_dir.clone()
    }

    fn windows_directory(&self) -> Option<PathBuf> {
        self.windows_dir.clone()
    }

    fn loader_cache(&self) -> Option<Vec<u8>> {
        self.cache.clone()
    }

    // Fake paths use foreign separators; keep them untouched.
    fn absolutize(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

fn resolver(probe: FakeProbe, platform: Platform, local_first: bool) -> LibraryPathResolver {
    LibraryPathResolver::with_probe(probe.into_probe(), platform, local_first)
}

fn file(path: impl Into<PathBuf>) -> ResolveResult {
    Ok(ResolvedLibrary::File(path.into()))
}

// Candidate generation

#[test]
fn test_windows_candidates_append_dll_once() {
    let candidates = candidates::generate("foo", Platform::Windows);
    assert_eq!(candidates, vec!["foo", "foo.dll"]);
    assert_eq!(candidates.iter().filter(|c| *c == "foo.dll").count(), 1);
}

#[test]
fn test_windows_candidates_keep_decorated_name() {
    assert_eq!(
        candidates::generate("foo.dll", Platform::Windows),
        vec!["foo.dll"]
    );
}

#[test]
fn test_linux_candidates_in_order() {
    assert_eq!(
        candidates::generate("foo", Platform::Linux),
        vec!["foo", "foo.so", "libfoo", "libfoo.so"]
    );
}

#[test]
fn test_bsd_candidates_match_linux() {
    assert_eq!(
        candidates::generate("foo", Platform::Bsd),
        candidates::generate("foo", Platform::Linux)
    );
}

#[test]
fn test_macos_candidates_use_dylib() {
    assert_eq!(
        candidates::generate("foo", Platform::MacOs),
        vec!["foo", "foo.dylib", "libfoo", "libfoo.dylib"]
    );
}

#[test]
fn test_prefixed_name_only_gains_suffix() {
    assert_eq!(
        candidates::generate("libfoo", Platform::Linux),
        vec!["libfoo", "libfoo.so"]
    );
}

#[test]
fn test_suffixed_name_only_gains_prefix() {
    assert_eq!(
        candidates::generate("foo.so", Platform::Linux),
        vec!["foo.so", "libfoo.so"]
    );
}

#[test]
fn test_fully_decorated_name_stays_alone() {
    assert_eq!(
        candidates::generate("libfoo.so", Platform::Linux),
        vec!["libfoo.so"]
    );
}

#[test]
fn test_path_identifier_reattaches_directory() {
    assert_eq!(
        candidates::generate("plugins/foo", Platform::Linux),
        vec![
            "plugins/foo",
            "plugins/foo.so",
            "plugins/libfoo",
            "plugins/libfoo.so"
        ]
    );
}

#[test]
fn test_windows_path_identifier_reattaches_directory() {
    assert_eq!(
        candidates::generate(r"C:\libs\bar", Platform::Windows),
        vec![r"C:\libs\bar", r"C:\libs\bar.dll"]
    );
}

#[test]
fn test_absolute_posix_path_identifier() {
    assert_eq!(
        candidates::generate("/opt/vendor/libfoo.so", Platform::Linux),
        vec!["/opt/vendor/libfoo.so"]
    );
}

// Orchestrator

#[test]
fn test_empty_name_is_a_caller_error() {
    let resolver = resolver(FakeProbe::new(), Platform::Linux, true);
    assert_eq!(resolver.resolve(""), Err(ResolveError::EmptyName));
}

#[test]
fn test_current_process_sentinel_always_succeeds() {
    let resolver = resolver(FakeProbe::new(), Platform::Linux, true);
    assert_eq!(
        resolver.resolve("__Internal"),
        Ok(ResolvedLibrary::CurrentProcess)
    );
}

#[test]
fn test_current_process_ignores_filesystem() {
    // Even a decorated file on disk does not shadow the marker.
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_file("/app/lib__Internal.so");
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(
        resolver.resolve("__Internal"),
        Ok(ResolvedLibrary::CurrentProcess)
    );
}

#[test]
fn test_missing_everywhere_is_not_found() {
    let resolver = resolver(FakeProbe::new(), Platform::Linux, true);
    assert_eq!(
        resolver.resolve("nope"),
        Err(ResolveError::NotFound {
            library: "nope".to_string()
        })
    );
}

#[test]
fn test_local_lib_subdirectory_hit() {
    // A bare "foo" finds <execdir>/lib/libfoo.so.
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_file("/app/lib/libfoo.so");
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(resolver.resolve("foo"), file("/app/lib/libfoo.so"));
}

#[test]
fn test_local_direct_beats_lib_subdirectory() {
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_file("/app/libfoo.so")
        .with_file("/app/lib/libfoo.so");
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(resolver.resolve("foo"), file("/app/libfoo.so"));
}

#[test]
fn test_local_bitness_subdirectory_hit() {
    let bitness = PathBuf::from("/app")
        .join("lib")
        .join(bitness_dir())
        .join("libfoo.so");
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_file(bitness.clone());
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(resolver.resolve("foo"), file(bitness));
}

#[test]
fn test_module_dir_fallback_when_distinct() {
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_module_dir("/plugins/host")
        .with_file("/plugins/host/libfoo.so");
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(resolver.resolve("foo"), file("/plugins/host/libfoo.so"));
}

#[test]
fn test_local_first_prefers_local_over_system() {
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_file("/app/lib/libfoo.so")
        .with_file("/usr/lib/libfoo.so");
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(resolver.resolve("foo"), file("/app/lib/libfoo.so"));
}

#[test]
fn test_platform_first_prefers_system_over_local() {
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_file("/app/lib/libfoo.so")
        .with_file("/usr/lib/libfoo.so");
    let resolver = resolver(probe, Platform::Linux, false);
    assert_eq!(resolver.resolve("foo"), file("/usr/lib/libfoo.so"));
}

#[test]
fn test_platform_first_still_falls_back_to_local() {
    // The flag flips priority; it never disables a scope.
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_file("/app/lib/libfoo.so");
    let resolver = resolver(probe, Platform::Linux, false);
    assert_eq!(resolver.resolve("foo"), file("/app/lib/libfoo.so"));
}

#[test]
fn test_explicit_path_skips_search_scopes() {
    // An explicit path identifier finds its decorated file directly.
    let probe = FakeProbe::new()
        .with_file(r"C:\libs\bar.dll")
        .with_system_dir(r"C:\Windows\System32")
        .with_file(Path::new(r"C:\Windows\System32").join("bar.dll"));
    let resolver = resolver(probe, Platform::Windows, true);
    assert_eq!(resolver.resolve(r"C:\libs\bar"), file(r"C:\libs\bar.dll"));
}

#[test]
fn test_native_search_hint_precedes_local_scope() {
    let probe = FakeProbe::new()
        .with_env("NATIVE_DLL_SEARCH_DIRECTORIES", "/hint")
        .with_exe_dir("/app")
        .with_file(Path::new("/hint").join("libfoo.so"))
        .with_file("/app/lib/libfoo.so");
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(
        resolver.resolve("foo"),
        file(Path::new("/hint").join("libfoo.so"))
    );
}

#[test]
fn test_ld_library_path_entries_probed_in_order() {
    let probe = FakeProbe::new()
        .with_env("LD_LIBRARY_PATH", "/one::/two")
        .with_file(Path::new("/two").join("libfoo.so"));
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(
        resolver.resolve("foo"),
        file(Path::new("/two").join("libfoo.so"))
    );
}

#[test]
fn test_loader_cache_matches_by_suffix_and_basename() {
    let cache = b"/opt/junk\0/opt/vendor/libz.so\0/lib/libother.so\0";
    let probe = FakeProbe::new().with_cache(cache);
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(resolver.resolve("z"), file("/opt/vendor/libz.so"));
}

#[test]
fn test_loader_cache_rejects_basename_mismatch() {
    // "notlibz.so" ends with "libz.so" but its filename differs; the
    // basename check must reject it.
    let cache = b"/opt/vendor/notlibz.so\0";
    let probe = FakeProbe::new().with_cache(cache);
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(
        resolver.resolve("z"),
        Err(ResolveError::NotFound {
            library: "z".to_string()
        })
    );
}

#[test]
fn test_loader_cache_skipped_on_macos() {
    // The same bytes that satisfy Linux must not leak into the macOS shape.
    let cache = b"/opt/vendor/libz.dylib\0";
    let probe = FakeProbe::new().with_cache(cache);
    let resolver = resolver(probe, Platform::MacOs, true);
    assert!(resolver.resolve("z").is_err());
}

#[test]
fn test_linux_system_directories_in_order() {
    let probe = FakeProbe::new()
        .with_file(Path::new("/lib").join("libfoo.so"))
        .with_file(Path::new("/usr/lib").join("libfoo.so"));
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(
        resolver.resolve("foo"),
        file(Path::new("/lib").join("libfoo.so"))
    );
}

#[test]
fn test_windows_exe_dir_beats_system_directory() {
    let probe = FakeProbe::new()
        .with_exe_dir(r"C:\app")
        .with_system_dir(r"C:\Windows\System32")
        .with_file(Path::new(r"C:\app").join("foo.dll"))
        .with_file(Path::new(r"C:\Windows\System32").join("foo.dll"));
    let resolver = resolver(probe, Platform::Windows, true);
    assert_eq!(
        resolver.resolve("foo"),
        file(Path::new(r"C:\app").join("foo.dll"))
    );
}

#[test]
fn test_windows_legacy_system_precedes_os_directory() {
    let probe = FakeProbe::new()
        .with_windows_dir(r"C:\Windows")
        .with_file(Path::new(r"C:\Windows").join("System").join("foo.dll"))
        .with_file(Path::new(r"C:\Windows").join("foo.dll"));
    let resolver = resolver(probe, Platform::Windows, true);
    assert_eq!(
        resolver.resolve("foo"),
        file(Path::new(r"C:\Windows").join("System").join("foo.dll"))
    );
}

#[test]
fn test_windows_current_dir_beats_path_var() {
    let probe = FakeProbe::new()
        .with_current_dir(r"C:\work")
        .with_env("PATH", r"C:\tools")
        .with_file(Path::new(r"C:\work").join("foo.dll"))
        .with_file(Path::new(r"C:\tools").join("foo.dll"));
    let resolver = resolver(probe, Platform::Windows, false);
    assert_eq!(
        resolver.resolve("foo"),
        file(Path::new(r"C:\work").join("foo.dll"))
    );
}

#[test]
fn test_windows_path_var_is_the_last_resort() {
    let probe = FakeProbe::new()
        .with_env("PATH", r"C:\tools;C:\extra")
        .with_file(Path::new(r"C:\extra").join("foo.dll"));
    let resolver = resolver(probe, Platform::Windows, true);
    assert_eq!(
        resolver.resolve("foo"),
        file(Path::new(r"C:\extra").join("foo.dll"))
    );
}

#[test]
fn test_macos_dyld_path_hit() {
    let probe = FakeProbe::new()
        .with_env("DYLD_LIBRARY_PATH", "/opt/dyld")
        .with_file(Path::new("/opt/dyld").join("libfoo.dylib"));
    let resolver = resolver(probe, Platform::MacOs, true);
    assert_eq!(
        resolver.resolve("foo"),
        file(Path::new("/opt/dyld").join("libfoo.dylib"))
    );
}

#[test]
fn test_candidate_order_beats_scope_exhaustiveness() {
    // "foo.so" is generated before "libfoo.so"; within one scope the
    // earlier candidate wins even when both exist.
    let probe = FakeProbe::new()
        .with_exe_dir("/app")
        .with_file("/app/foo.so")
        .with_file("/app/libfoo.so");
    let resolver = resolver(probe, Platform::Linux, true);
    assert_eq!(resolver.resolve("foo"), file("/app/foo.so"));
}

#[test]
fn test_identifier_parse_round_trip() {
    assert_eq!(
        LibraryIdentifier::parse("foo"),
        Ok(LibraryIdentifier::Named("foo".to_string()))
    );
    assert_eq!(
        LibraryIdentifier::parse(CURRENT_PROCESS_SENTINEL),
        Ok(LibraryIdentifier::CurrentProcess)
    );
    assert_eq!(LibraryIdentifier::parse(""), Err(ResolveError::EmptyName));
}

#[test]
fn test_resolve_error_messages_name_the_library() {
    let err = ResolveError::NotFound {
        library: "foo".to_string(),
    };
    assert!(err.to_string().contains("foo"));
}
