//! `clean*` and `tree*` targets

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum HousekeepingError {
    #[error("unable to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to read directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// What a clean step removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanScope {
    /// `build/`, `dist/` and `*.egg-info` at the root
    Build,
    /// Tool caches, `__pycache__` directories and `*.pyc` files
    Caches,
    /// The virtualenv
    Venv,
}

const BUILD_DIRS: [&str; 2] = ["build", "dist"];
const CACHE_DIRS: [&str; 3] = [".pytest_cache", ".mypy_cache", ".ruff_cache"];
const HIDDEN_IN_TREE: [&str; 2] = ["__pycache__", "node_modules"];

/// Remove a file or directory; a path that does not exist is not an error.
fn remove(path: &Path) -> Result<bool, HousekeepingError> {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(HousekeepingError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn egg_info_dirs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return vec![];
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "egg-info"))
        .collect()
}

fn cache_artifacts(root: &Path, venv: &Path) -> Result<Vec<PathBuf>, HousekeepingError> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.path() != venv && e.file_name() != ".git");
    while let Some(entry) = walker.next() {
        let entry = entry?;
        if entry.file_type().is_dir() && entry.file_name() == "__pycache__" {
            found.push(entry.into_path());
            walker.skip_current_dir();
        } else if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "pyc")
        {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Remove everything `scope` covers under `root` and return what was actually removed.
///
/// # Errors
///
/// Returns `HousekeepingError` if an existing path cannot be removed or the
/// tree cannot be walked.
pub fn clean(root: &Path, scope: CleanScope, venv: &Path) -> Result<Vec<PathBuf>, HousekeepingError> {
    let targets = match scope {
        CleanScope::Build => BUILD_DIRS
            .iter()
            .map(|d| root.join(d))
            .chain(egg_info_dirs(root))
            .collect(),
        CleanScope::Caches => {
            let mut targets: Vec<PathBuf> = CACHE_DIRS.iter().map(|d| root.join(d)).collect();
            targets.extend(cache_artifacts(root, venv)?);
            targets
        }
        CleanScope::Venv => vec![venv.to_path_buf()],
    };

    let mut removed = Vec::new();
    for target in targets {
        if remove(&target)? {
            removed.push(target);
        }
    }
    info!("Removed {} path(s)", removed.len());
    Ok(removed)
}

fn visible(entry: &DirEntry, venv: &Path) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.depth() == 0
        || !(name.starts_with('.')
            || HIDDEN_IN_TREE.contains(&name.as_ref())
            || entry.path() == venv)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// Render `root` as a `tree`-style listing down to `depth` levels.
///
/// # Errors
///
/// Returns `HousekeepingError::Walk` if a directory cannot be read.
pub fn render_tree(root: &Path, depth: usize, venv: &Path) -> Result<String, HousekeepingError> {
    let entries = WalkDir::new(root)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| visible(e, venv))
        .filter(|e| !matches!(e, Ok(entry) if entry.depth() == 0))
        .collect::<Result<Vec<_>, _>>()?;

    // An entry is the last of its siblings unless a later entry at the same
    // depth appears before the walk climbs back above it.
    let mut is_last = vec![false; entries.len()];
    let mut sibling_follows = vec![false; depth + 2];
    for (i, entry) in entries.iter().enumerate().rev() {
        let d = entry.depth();
        is_last[i] = !sibling_follows[d];
        sibling_follows[d] = true;
        sibling_follows[d + 1..].fill(false);
    }

    let mut out = String::from(".\n");
    let mut open: Vec<bool> = Vec::new();
    let (mut dirs, mut files) = (0, 0);
    for (entry, last) in entries.iter().zip(is_last) {
        open.truncate(entry.depth() - 1);
        for &continues in &open {
            out.push_str(if continues { "│   " } else { "    " });
        }
        let connector = if last { "└── " } else { "├── " };
        let _ = writeln!(out, "{connector}{}", entry.file_name().to_string_lossy());
        open.push(!last);
        if entry.file_type().is_dir() {
            dirs += 1;
        } else {
            files += 1;
        }
    }
    let _ = write!(
        out,
        "\n{}, {}\n",
        plural(dirs, "directory", "directories"),
        plural(files, "file", "files")
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_clean_build() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/out.pdf");
        touch(dir.path(), "bookforge.egg-info/PKG-INFO");
        touch(dir.path(), "drafts/ch01.md");
        let venv = dir.path().join(".venv");

        let removed = clean(dir.path(), CleanScope::Build, &venv).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!dir.path().join("build").exists());
        assert!(!dir.path().join("bookforge.egg-info").exists());
        assert!(dir.path().join("drafts/ch01.md").exists());
    }

    #[test]
    fn test_clean_caches_skips_venv_and_git() {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            ".pytest_cache/v/cache",
            ".ruff_cache/x",
            "pkg/__pycache__/mod.cpython-312.pyc",
            "pkg/stale.pyc",
            ".venv/lib/__pycache__/keep.pyc",
            ".git/hooks/keep.pyc",
        ] {
            touch(dir.path(), rel);
        }
        let venv = dir.path().join(".venv");

        clean(dir.path(), CleanScope::Caches, &venv).unwrap();
        assert!(!dir.path().join(".pytest_cache").exists());
        assert!(!dir.path().join(".ruff_cache").exists());
        assert!(!dir.path().join("pkg/__pycache__").exists());
        assert!(!dir.path().join("pkg/stale.pyc").exists());
        assert!(dir.path().join(".venv/lib/__pycache__/keep.pyc").exists());
        assert!(dir.path().join(".git/hooks/keep.pyc").exists());
    }

    #[test]
    fn test_clean_absent_paths_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let venv = dir.path().join(".venv");
        for scope in [CleanScope::Build, CleanScope::Caches, CleanScope::Venv] {
            assert!(clean(dir.path(), scope, &venv).unwrap().is_empty());
        }
    }

    #[test]
    fn test_render_tree() {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "config/project.yaml",
            "config/style.yaml",
            "drafts/part1/ch01.md",
            "main.py",
            ".venv/bin/pip",
            "node_modules/x/index.js",
            "pkg/__pycache__/a.pyc",
        ] {
            touch(dir.path(), rel);
        }
        let tree = render_tree(dir.path(), 2, &dir.path().join(".venv")).unwrap();
        insta::assert_snapshot!(tree, @r"
        .
        ├── config
        │   ├── project.yaml
        │   └── style.yaml
        ├── drafts
        │   └── part1
        ├── main.py
        └── pkg

        4 directories, 3 files
        ");
    }
}
