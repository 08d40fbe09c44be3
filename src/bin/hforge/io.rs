use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use hab_forge::MemoryStore;

const SDF_EXTENSIONS: [&str; 2] = ["sdf", "sd"];

/// Returns `true` if stderr is a terminal (interactive).
pub fn stderr_is_tty() -> bool {
    io::stderr().is_terminal()
}

pub fn is_sdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SDF_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Expands the given paths into SDF files: files are taken as given,
/// directories are searched recursively. The result is sorted and
/// deduplicated so runs are reproducible.
pub fn discover_sdf_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut files)?;
        } else if path.exists() {
            files.push(path.clone());
        } else {
            anyhow::bail!("Input path does not exist: {}", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if is_sdf(&path) {
            files.push(path);
        }
    }
    Ok(())
}

pub fn open_store(path: &Path) -> Result<MemoryStore> {
    MemoryStore::open(path).with_context(|| format!("Failed to open store: {}", path.display()))
}

pub fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    store
        .save(path)
        .with_context(|| format!("Failed to save store: {}", path.display()))
}
