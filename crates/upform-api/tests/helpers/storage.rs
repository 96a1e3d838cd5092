use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Scratch and final roots inside one temp directory.
pub struct TestStorage {
    pub temp_dir: TempDir,
    pub scratch_root: PathBuf,
    pub final_root: PathBuf,
}

impl TestStorage {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let scratch_root = temp_dir.path().join("TempFiles");
        let final_root = temp_dir.path().join("wwwroot");
        Self {
            temp_dir,
            scratch_root,
            final_root,
        }
    }

    /// Number of upload directories left in scratch storage
    pub fn scratch_entries(&self) -> usize {
        count_entries(&self.scratch_root)
    }

    /// Number of regular files anywhere under final storage
    pub fn final_files(&self) -> usize {
        count_files(&self.final_root)
    }
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn count_entries(dir: &Path) -> usize {
    match fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
