//! Copy manifests
//!
//! A manifest is a JSON array of src → dest entries used to stage built
//! native binaries (and other platform files) into the host project:
//!
//! ```json
//! [
//!   { "comment": "// runtime libraries" },
//!   { "src": "out/x64/plugin.dll", "dest": "Assets/Plugins/x64/", "sha256": "…" },
//!   { "src": "out/headers", "dest": "Assets/Include", "ignore_regex": "\\.tmp$" }
//! ]
//! ```
//!
//! `src` is resolved against the source root and `dest` against the
//! destination root. A pinned `sha256` (or legacy `sha1`) fails the copy when
//! the source file changed, as a reminder to update the pin.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::NativeBuildError;
use crate::utils::paths::{ensure_dir, resolve_under};
use crate::utils::terminal::print_verbose;

/// One manifest entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SrcDestPair {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub dest: Option<String>,
    /// Expected SHA-256 of `src` (hex)
    #[serde(default)]
    pub sha256: Option<String>,
    /// Expected SHA-1 of `src` (hex), as written by older manifests
    #[serde(default)]
    pub sha1: Option<String>,
    /// Files whose path relative to `src` matches are skipped
    #[serde(default)]
    pub ignore_regex: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl SrcDestPair {
    /// Entry carries no copy instruction
    pub fn is_comment_only(&self) -> bool {
        let empty = is_blank(&self.src) && is_blank(&self.dest) && is_blank(&self.ignore_regex);
        let commented_out = self
            .comment
            .as_deref()
            .is_some_and(|c| c.starts_with("//"));
        empty || commented_out
    }
}

/// Files copied and skipped by `CopyManifest::apply`
#[derive(Debug, Default, PartialEq)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Parsed copy manifest
#[derive(Debug, Clone, Default)]
pub struct CopyManifest {
    entries: Vec<SrcDestPair>,
    verbose: bool,
}

impl CopyManifest {
    /// Load a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read copy manifest: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid copy manifest: {}", path.display()))
    }

    /// Parse manifest JSON
    pub fn parse(content: &str) -> Result<Self> {
        let entries: Vec<SrcDestPair> = serde_json::from_str(content).map_err(|e| {
            NativeBuildError::config_error(format!("Failed to parse copy manifest: {}", e))
        })?;
        Ok(Self {
            entries,
            verbose: false,
        })
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Copy every entry, resolving `src` under `src_root` and `dest` under `dest_root`
    pub fn apply(&self, src_root: &Path, dest_root: &Path) -> Result<CopyReport> {
        let mut report = CopyReport::default();

        for (index, entry) in self.entries.iter().enumerate() {
            if entry.is_comment_only() {
                continue;
            }

            let (Some(src), Some(dest)) = (
                entry.src.as_deref().filter(|s| !s.is_empty()),
                entry.dest.as_deref().filter(|s| !s.is_empty()),
            ) else {
                return Err(NativeBuildError::config_error(format!(
                    "Copy manifest entry {} needs both 'src' and 'dest'",
                    index
                ))
                .into());
            };

            let ignore = entry
                .ignore_regex
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(Regex::new)
                .transpose()
                .map_err(|e| {
                    NativeBuildError::config_error(format!(
                        "Invalid ignore_regex in copy manifest entry {}: {}",
                        index, e
                    ))
                })?;

            let src_path = resolve_under(src_root, src);
            let dest_path = resolve_under(dest_root, dest);

            if src_path.is_dir() {
                if !is_blank(&entry.sha256) || !is_blank(&entry.sha1) {
                    return Err(NativeBuildError::config_error(format!(
                        "A digest can only be pinned for files, but '{}' is a directory",
                        src
                    ))
                    .into());
                }
                self.copy_dir(&src_path, &dest_path, ignore.as_ref(), &mut report)?;
            } else if src_path.is_file() {
                if let Some(expected) = entry.sha256.as_deref().filter(|s| !s.is_empty()) {
                    verify_digest(&src_path, "sha256", &file_sha256(&src_path)?, expected)?;
                }
                if let Some(expected) = entry.sha1.as_deref().filter(|s| !s.is_empty()) {
                    verify_digest(&src_path, "sha1", &file_sha1(&src_path)?, expected)?;
                }

                let file_name = src_path.file_name().map(PathBuf::from).unwrap_or_default();
                if ignore
                    .as_ref()
                    .is_some_and(|re| re.is_match(&file_name.to_string_lossy()))
                {
                    report.skipped.push(src_path);
                    continue;
                }

                let target = if dest.ends_with('/') || dest.ends_with('\\') || dest_path.is_dir() {
                    dest_path.join(file_name)
                } else {
                    dest_path
                };
                self.copy_file(&src_path, &target)?;
                report.copied.push(target);
            } else {
                return Err(NativeBuildError::config_error(format!(
                    "Copy source does not exist: {}",
                    src_path.display()
                ))
                .into());
            }
        }

        Ok(report)
    }

    fn copy_dir(
        &self,
        src: &Path,
        dest: &Path,
        ignore: Option<&Regex>,
        report: &mut CopyReport,
    ) -> Result<()> {
        for entry in WalkDir::new(src).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
            let relative_str = relative.to_string_lossy().replace('\\', "/");
            if ignore.is_some_and(|re| re.is_match(&relative_str)) {
                print_verbose(self.verbose, &format!("Skipping {}", relative_str));
                report.skipped.push(entry.path().to_path_buf());
                continue;
            }

            let target = dest.join(relative);
            self.copy_file(entry.path(), &target)?;
            report.copied.push(target);
        }
        Ok(())
    }

    fn copy_file(&self, src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(src, dest).with_context(|| {
            format!("Failed to copy {} to {}", src.display(), dest.display())
        })?;
        print_verbose(
            self.verbose,
            &format!("Copied {} -> {}", src.display(), dest.display()),
        );
        Ok(())
    }
}

/// Hex SHA-256 of a file
pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Hex SHA-1 of a file
pub fn file_sha1(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(format!("{:x}", Sha1::digest(&bytes)))
}

fn verify_digest(path: &Path, algorithm: &str, actual: &str, expected: &str) -> Result<()> {
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(NativeBuildError::config_error_with_hint(
            format!(
                "{} of {} is {}, but the copy manifest expects {}",
                algorithm,
                path.display(),
                actual,
                expected
            ),
            format!(
                "The source file changed. Check the new file, then update the {} in the copy manifest",
                algorithm
            ),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_comment_only_detection() {
        let entry = SrcDestPair {
            comment: Some("Just a note".to_string()),
            ..Default::default()
        };
        assert!(entry.is_comment_only());

        let entry = SrcDestPair {
            comment: Some("// disabled".to_string()),
            src: Some("a.dll".to_string()),
            dest: Some("b.dll".to_string()),
            ..Default::default()
        };
        assert!(entry.is_comment_only());

        let entry = SrcDestPair {
            comment: Some("runtime".to_string()),
            src: Some("a.dll".to_string()),
            dest: Some("b.dll".to_string()),
            ..Default::default()
        };
        assert!(!entry.is_comment_only());
    }

    #[test]
    fn test_copy_file_into_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src_root = temp_dir.path().join("src");
        let dest_root = temp_dir.path().join("dest");
        write(&src_root.join("out/plugin.dll"), "dll");

        let manifest = CopyManifest::parse(
            r#"[
                { "comment": "// staged separately", "src": "missing.dll", "dest": "x" },
                { "src": "out/plugin.dll", "dest": "Plugins/x64/" }
            ]"#,
        )
        .unwrap();

        let report = manifest.apply(&src_root, &dest_root).unwrap();
        let target = dest_root.join("Plugins/x64/plugin.dll");
        assert_eq!(report.copied, vec![target.clone()]);
        assert_eq!(fs::read_to_string(target).unwrap(), "dll");
    }

    #[test]
    fn test_copy_directory_with_ignore_regex() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src_root = temp_dir.path().join("src");
        let dest_root = temp_dir.path().join("dest");
        write(&src_root.join("include/eos.h"), "h");
        write(&src_root.join("include/sub/eos_sdk.h"), "h");
        write(&src_root.join("include/sub/scratch.tmp"), "tmp");

        let manifest = CopyManifest::parse(
            r#"[{ "src": "include", "dest": "Include", "ignore_regex": "\\.tmp$" }]"#,
        )
        .unwrap();

        let report = manifest.apply(&src_root, &dest_root).unwrap();
        assert_eq!(report.copied.len(), 2);
        assert_eq!(report.skipped, vec![src_root.join("include/sub/scratch.tmp")]);
        assert!(dest_root.join("Include/sub/eos_sdk.h").exists());
        assert!(!dest_root.join("Include/sub/scratch.tmp").exists());
    }

    #[test]
    fn test_digest_mismatch_is_config_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(&temp_dir.path().join("lib.so"), "new build");

        let manifest = CopyManifest::parse(&format!(
            r#"[{{ "src": "lib.so", "dest": "out/lib.so", "sha256": "{}" }}]"#,
            "0".repeat(64)
        ))
        .unwrap();

        let err = manifest.apply(temp_dir.path(), temp_dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NativeBuildError>(),
            Some(NativeBuildError::Config { hint: Some(_), .. })
        ));
        assert!(!temp_dir.path().join("out/lib.so").exists());
    }

    #[test]
    fn test_digest_match_copies() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("lib.so");
        write(&src, "stable");
        let digest = file_sha256(&src).unwrap();

        let manifest = CopyManifest::parse(&format!(
            r#"[{{ "src": "lib.so", "dest": "out/lib.so", "sha256": "{}" }}]"#,
            digest.to_uppercase()
        ))
        .unwrap();

        manifest.apply(temp_dir.path(), temp_dir.path()).unwrap();
        assert!(temp_dir.path().join("out/lib.so").exists());
    }

    #[test]
    fn test_stale_sha1_pin_is_config_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(&temp_dir.path().join("lib.so"), "new build");

        let manifest = CopyManifest::parse(&format!(
            r#"[{{ "src": "lib.so", "dest": "out/lib.so", "sha1": "{}" }}]"#,
            "0".repeat(40)
        ))
        .unwrap();

        let err = manifest.apply(temp_dir.path(), temp_dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NativeBuildError>(),
            Some(NativeBuildError::Config { hint: Some(_), .. })
        ));
        assert!(err.to_string().contains("sha1"));
        assert!(!temp_dir.path().join("out/lib.so").exists());
    }

    #[test]
    fn test_matching_sha1_pin_copies() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("lib.so");
        write(&src, "stable");

        let digest = file_sha1(&src).unwrap();
        assert_eq!(digest.len(), 40);

        let manifest = CopyManifest::parse(&format!(
            r#"[{{ "src": "lib.so", "dest": "out/lib.so", "sha1": "{}" }}]"#,
            digest
        ))
        .unwrap();

        manifest.apply(temp_dir.path(), temp_dir.path()).unwrap();
        assert!(temp_dir.path().join("out/lib.so").exists());
    }

    #[test]
    fn test_missing_source_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manifest =
            CopyManifest::parse(r#"[{ "src": "nope.dll", "dest": "x.dll" }]"#).unwrap();
        assert!(manifest.apply(temp_dir.path(), temp_dir.path()).is_err());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = CopyManifest::parse("{ not json").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NativeBuildError>(),
            Some(NativeBuildError::Config { .. })
        ));
    }
}
