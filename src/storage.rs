use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub upload_dir: PathBuf,
    pub cleaned_dir: PathBuf,
}

/// Per-request file names, unique across concurrent uploads.
#[derive(Debug, Clone)]
pub struct RequestFiles {
    pub raw_path: PathBuf,
    pub cleaned_name: String,
    pub cleaned_path: PathBuf,
}

impl StoragePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir: PathBuf = data_dir.into();
        let upload_dir = data_dir.join("temp_uploads");
        let cleaned_dir = data_dir.join("static_cleaned_data");

        Self {
            upload_dir,
            cleaned_dir,
        }
    }

    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.upload_dir)
            .with_context(|| format!("create {}", self.upload_dir.display()))?;
        fs::create_dir_all(&self.cleaned_dir)
            .with_context(|| format!("create {}", self.cleaned_dir.display()))?;
        Ok(())
    }

    pub fn request_files(&self, original_filename: &str) -> RequestFiles {
        let stamp = request_stamp();
        let raw_name = format!("{stamp}_{}", secure_filename(original_filename));
        let cleaned_name = format!("cleaned_{stamp}.csv");

        RequestFiles {
            raw_path: self.upload_dir.join(raw_name),
            cleaned_path: self.cleaned_dir.join(&cleaned_name),
            cleaned_name,
        }
    }

    /// Maps a retrieval name to a file inside the cleaned directory.
    /// Anything that is not a plain file name resolves to `None`.
    pub fn resolve_cleaned(&self, filename: &str) -> Option<PathBuf> {
        let plain = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
        if !plain {
            return None;
        }
        let path = self.cleaned_dir.join(filename);
        file_present_nonempty(&path).then_some(path)
    }
}

/// `YYYYMMDDHHMMSS_<12 hex chars>`.
fn request_stamp() -> String {
    let timestamp = Local::now().format("%Y%m%d%H%M%S");
    let token = Uuid::new_v4().simple().to_string();
    format!("{timestamp}_{}", &token[..12])
}

/// Reduces an uploaded file name to a safe ASCII name with no directory part.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload.csv".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn file_present_nonempty(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(m) => m.is_file() && m.len() > 0,
        Err(_) => false,
    }
}

pub fn delete_if_exists(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed deleting {}", path.display()))?;
    }
    Ok(())
}

/// Owns a raw upload on disk and removes it when dropped, on every exit path.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = delete_if_exists(&self.path) {
            tracing::warn!("{e:#}");
        }
    }
}
