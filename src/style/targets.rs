//! Expansion of linter arguments into the list of files to check

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::debug;

use crate::style::StyleError;

/// Patterns used inside directories when `--glob` is not given
pub const DEFAULT_GLOBS: [&str; 2] = ["**/*.md", "**/*.txt"];

/// Always excluded, relative to the workspace root
pub const DEFAULT_EXCLUDES: [&str; 9] = [
    ".venv/**",
    ".pytest_cache/**",
    "build/**",
    "dist/**",
    ".git/**",
    "node_modules/**",
    "**/__pycache__/**",
    "**/site-packages/**",
    "**/*.dist-info/**",
];

struct Excludes {
    root: PathBuf,
    patterns: Vec<Pattern>,
}

impl Excludes {
    fn new(root: &Path, extra: &[String]) -> Result<Excludes, StyleError> {
        let patterns = DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .map(Pattern::new)
            .collect::<Result<_, _>>()?;
        Ok(Excludes {
            root: root.to_path_buf(),
            patterns,
        })
    }

    fn matches(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(candidate))
    }

    /// A file is excluded when its root-relative path or any ancestor matches.
    fn is_excluded(&self, file: &Path) -> bool {
        let rel = file.strip_prefix(&self.root).unwrap_or(file);
        if self.matches(&rel.to_string_lossy()) {
            return true;
        }
        rel.ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .any(|ancestor| {
                let ancestor = ancestor.to_string_lossy();
                self.matches(&ancestor) || self.matches(&format!("{ancestor}/"))
            })
    }
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

fn expand(pattern: &str, found: &mut Vec<PathBuf>) -> Result<(), StyleError> {
    debug!("Expanding {pattern}");
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) if path.is_file() => found.push(path),
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable path: {e}"),
        }
    }
    Ok(())
}

/// Resolve `paths` (files, directories or glob patterns, relative to `root`)
/// into a sorted, de-duplicated list of absolute files.
///
/// # Errors
///
/// Returns `StyleError::Pattern` for an invalid glob or exclude pattern.
pub fn collect(
    root: &Path,
    paths: &[String],
    glob: Option<&str>,
    excludes: &[String],
) -> Result<Vec<PathBuf>, StyleError> {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let excludes = Excludes::new(&root, excludes)?;
    let globs: Vec<&str> = glob.map_or_else(|| DEFAULT_GLOBS.to_vec(), |g| vec![g]);
    let default_paths = [".".to_string()];
    let paths = if paths.is_empty() { &default_paths[..] } else { paths };

    let mut found = Vec::new();
    for arg in paths {
        let path: PathBuf = root.join(arg).components().collect();
        if path.is_file() {
            found.push(path);
        } else if path.is_dir() {
            let base = Pattern::escape(&path.to_string_lossy());
            for g in &globs {
                let g = g.trim_start_matches("**/");
                expand(&format!("{base}/**/{g}"), &mut found)?;
            }
        } else if has_glob_meta(arg) {
            if Path::new(arg).is_absolute() {
                expand(arg, &mut found)?;
            } else {
                let base = Pattern::escape(&root.to_string_lossy());
                expand(&format!("{base}/{arg}"), &mut found)?;
            }
        } else {
            debug!("Ignoring missing target {}", path.display());
        }
    }

    let unique: BTreeSet<PathBuf> = found
        .into_iter()
        .map(|f| f.canonicalize().unwrap_or(f))
        .filter(|f| !excludes.is_excluded(f))
        .collect();
    Ok(unique.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "text").unwrap();
    }

    fn rel_names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        let root = root.canonicalize().unwrap();
        files
            .iter()
            .map(|f| f.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "drafts/ch01.md",
            "drafts/part/ch02.md",
            "drafts/notes.txt",
            "drafts/image.png",
            "README.md",
            ".venv/lib/site.md",
            "build/out.md",
            "src/__pycache__/cached.md",
            "lib/site-packages/pkg/readme.txt",
        ] {
            touch(dir.path(), rel);
        }
        dir
    }

    #[test]
    fn test_default_walk_skips_excluded_directories() {
        let dir = fixture();
        let files = collect(dir.path(), &[], None, &[]).unwrap();
        assert_eq!(
            rel_names(dir.path(), &files),
            vec![
                "README.md",
                "drafts/ch01.md",
                "drafts/notes.txt",
                "drafts/part/ch02.md",
            ]
        );
    }

    #[test]
    fn test_custom_glob_and_exclude() {
        let dir = fixture();
        let files = collect(
            dir.path(),
            &["drafts".to_string()],
            Some("*.md"),
            &["drafts/part/**".to_string()],
        )
        .unwrap();
        assert_eq!(rel_names(dir.path(), &files), vec!["drafts/ch01.md"]);
    }

    #[test]
    fn test_pattern_and_file_targets_are_deduplicated() {
        let dir = fixture();
        let files = collect(
            dir.path(),
            &["drafts/**/*.md".to_string(), "drafts/ch01.md".to_string()],
            None,
            &[],
        )
        .unwrap();
        assert_eq!(
            rel_names(dir.path(), &files),
            vec!["drafts/ch01.md", "drafts/part/ch02.md"]
        );
    }

    #[test]
    fn test_excluded_file_argument_is_dropped() {
        let dir = fixture();
        let files = collect(dir.path(), &["build/out.md".to_string()], None, &[]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let dir = fixture();
        assert!(matches!(
            collect(dir.path(), &[], None, &["[".to_string()]),
            Err(StyleError::Pattern(_))
        ));
    }
}
