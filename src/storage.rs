//! On-disk attachment storage under the configured media root.
//!
//! Stored references are relative paths such as `budgets/3f9a…_budget.pdf`;
//! they are what the proposal row keeps and what `open` accepts back.

use std::path::{Component, Path, PathBuf};

use crate::errors::AppError;
use crate::models::proposal::FileKind;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    max_bytes: usize,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        FileStore { root: root.into(), max_bytes }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` into the kind's directory and return the stored reference.
    pub async fn save(&self, kind: FileKind, filename: &str, bytes: &[u8]) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "Uploaded file exceeds the {} byte limit",
                self.max_bytes
            )));
        }
        let safe_name = sanitize_filename(filename)
            .ok_or_else(|| AppError::Validation("A valid filename is required".to_string()))?;

        let dir = self.root.join(kind.directory());
        tokio::fs::create_dir_all(&dir).await?;

        let reference = format!("{}/{}_{}", kind.directory(), crate::models::token::generate(), safe_name);
        tokio::fs::write(self.root.join(&reference), bytes).await?;
        log::info!("Stored {} bytes at {reference}", bytes.len());
        Ok(reference)
    }

    /// Read a stored file back. Unknown or escaping references are `NotFound`.
    pub async fn open(&self, reference: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(reference).ok_or(AppError::NotFound)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn remove(&self, reference: &str) {
        if let Some(path) = self.resolve(reference) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove {}: {e}", path.display());
                }
            }
        }
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference);
        let only_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if reference.is_empty() || !only_normal {
            return None;
        }
        Some(self.root.join(relative))
    }
}

/// Keep the final path component and restrict it to `[A-Za-z0-9._-]`, max 100 chars.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .take(100)
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Filename shown to downloaders: the stored reference without its directory and random prefix.
pub fn display_name(reference: &str) -> &str {
    let file = reference.rsplit('/').next().unwrap_or(reference);
    file.split_once('_').map(|(_, name)| name).unwrap_or(file)
}
