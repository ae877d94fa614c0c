#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use billing_cleaner::storage::StoragePaths;
use tempfile::{TempDir, tempdir};

pub const HEADER: &str = "Name,Age,Gender,Blood Type,Medical Condition,Date of Admission,Doctor,Hospital,Insurance Provider,Billing Amount,Room Number,Admission Type,Discharge Date,Medication,Test Results";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("read fixture")
}

/// Scratch data directory laid out like the server's.
pub struct TestWorkspace {
    temp_dir: TempDir,
    pub paths: StoragePaths,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("temp dir");
        let paths = StoragePaths::new(temp_dir.path());
        paths.ensure_dirs().expect("create data dirs");
        Self { temp_dir, paths }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    pub fn uploads(&self) -> Vec<PathBuf> {
        list(&self.paths.upload_dir)
    }

    pub fn cleaned(&self) -> Vec<PathBuf> {
        list(&self.paths.cleaned_dir)
    }
}

fn list(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    out.sort();
    out
}
