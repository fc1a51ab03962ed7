use std::path::Path;
use std::process::Command;

/// Fallback used when no version source is available.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Resolve the candidate version to verify against.
///
/// Precedence: explicit flag, `[package] version` from the candidate crate
/// manifest, `git describe --tags --always` in the manifest directory, then
/// the literal `"unknown"`.
pub fn detect_candidate_version(explicit: Option<&str>, manifest_dir: Option<&Path>) -> String {
    if let Some(version) = explicit {
        let version = version.trim();
        if !version.is_empty() {
            return version.to_string();
        }
    }

    if let Some(dir) = manifest_dir {
        if let Some(version) = manifest_version(dir) {
            tracing::debug!("Detected candidate version {} from manifest", version);
            return version;
        }

        if let Some(version) = git_describe(dir) {
            tracing::debug!("Detected candidate version {} from git", version);
            return version;
        }
    }

    tracing::warn!("Could not detect candidate version, using '{}'", UNKNOWN_VERSION);
    UNKNOWN_VERSION.to_string()
}

/// Read `[package] version` from `<dir>/Cargo.toml`.
fn manifest_version(dir: &Path) -> Option<String> {
    let manifest = std::fs::read_to_string(dir.join("Cargo.toml")).ok()?;
    let value: toml::Value = toml::from_str(&manifest).ok()?;
    let version = value.get("package")?.get("version")?.as_str()?;
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

fn git_describe(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always"])
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    if described.is_empty() {
        None
    } else {
        Some(described.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_version_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"candidate\"\nversion = \"9.9.9\"\n",
        )
        .unwrap();

        let version = detect_candidate_version(Some("0.3.1"), Some(dir.path()));
        assert_eq!(version, "0.3.1");
    }

    #[test]
    fn test_blank_explicit_version_is_ignored() {
        let version = detect_candidate_version(Some("   "), None);
        assert_eq!(version, UNKNOWN_VERSION);
    }

    #[test]
    fn test_manifest_version() {
        let dir = TempDir::new().unwrap();
        let mut manifest = std::fs::File::create(dir.path().join("Cargo.toml")).unwrap();
        writeln!(manifest, "[package]").unwrap();
        writeln!(manifest, "name = \"candidate\"").unwrap();
        writeln!(manifest, "version = \"0.4.0\"").unwrap();

        let version = detect_candidate_version(None, Some(dir.path()));
        assert_eq!(version, "0.4.0");
    }

    #[test]
    fn test_fallback_to_unknown() {
        // Empty directory: no manifest, and git describe fails outside a repo
        // (TempDir lives under the system temp root, not a checkout).
        let dir = TempDir::new().unwrap();
        let version = detect_candidate_version(None, Some(dir.path()));
        assert_eq!(version, UNKNOWN_VERSION);
    }

    #[test]
    fn test_no_sources_at_all() {
        assert_eq!(detect_candidate_version(None, None), UNKNOWN_VERSION);
    }
}
