//! Candidate filename generation.
//!
//! Pure function of (identifier, platform family); never touches the
//! filesystem and always yields at least the bare name. Order is priority:
//! the first candidate that exists anywhere wins.

use crate::platform::Platform;

/// Generate the ordered filename variants a platform's loader would accept.
///
/// An identifier carrying directory components is decorated on its filename
/// alone, with the parent directory re-attached to every variant.
pub(super) fn generate(identifier: &str, platform: Platform) -> Vec<String> {
    let (parent, name) = split_identifier(identifier, platform);

    let mut candidates = vec![name.to_string()];

    match platform {
        Platform::Windows => {
            if !name.ends_with(".dll") {
                candidates.push(format!("{name}.dll"));
            }
        }
        Platform::Linux | Platform::Bsd | Platform::MacOs => {
            let prefix = platform.shared_lib_prefix();
            let suffix = platform.shared_lib_suffix();
            let no_suffix = !name.ends_with(suffix);
            let no_prefix = !name.starts_with(prefix);

            if no_suffix {
                candidates.push(format!("{name}{suffix}"));
            }
            if no_prefix {
                candidates.push(format!("{prefix}{name}"));
            }
            if no_prefix && no_suffix {
                candidates.push(format!("{prefix}{name}{suffix}"));
            }
        }
    }

    if let Some(dir) = parent {
        let sep = platform.main_separator();
        candidates = candidates
            .into_iter()
            .map(|candidate| rejoin(dir, sep, &candidate))
            .collect();
    }

    candidates
}

/// True when the identifier names a path rather than a bare library.
pub(super) fn has_directory(identifier: &str, platform: Platform) -> bool {
    identifier.contains('/') || (platform == Platform::Windows && identifier.contains('\\'))
}

/// Split an identifier into its parent directory and filename. Separators
/// are `/` everywhere plus `\` on the Windows family, independent of the
/// host the code runs on.
fn split_identifier(identifier: &str, platform: Platform) -> (Option<&str>, &str) {
    let split_at = identifier
        .rfind(|ch: char| ch == '/' || (platform == Platform::Windows && ch == '\\'));
    match split_at {
        // Separators are ASCII, so +1 lands on a char boundary.
        Some(idx) => (Some(&identifier[..idx]), &identifier[idx + 1..]),
        None => (None, identifier),
    }
}

fn rejoin(dir: &str, sep: char, file: &str) -> String {
    // An empty dir comes from a root-anchored identifier like "/foo".
    if dir.ends_with(sep) {
        format!("{dir}{file}")
    } else {
        format!("{dir}{sep}{file}")
    }
}
