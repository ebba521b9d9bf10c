//! Tokio-backed file access.

use std::io;
use std::path::{Path, PathBuf};

use courier_application::ports::{FileIo, FileIoError};
use tokio::fs;
use uuid::Uuid;

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so readers see either the old file or the new one.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or either step fails.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let temp_name = format!(".{file_name}.{}.tmp", Uuid::new_v4().simple());
    let temp = parent.map_or_else(|| PathBuf::from(&temp_name), |p| p.join(&temp_name));

    fs::write(&temp, contents).await?;
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e);
    }
    Ok(())
}

fn map_io(path: &Path, error: io::Error) -> FileIoError {
    match error.kind() {
        io::ErrorKind::NotFound => FileIoError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => FileIoError::PermissionDenied(path.to_path_buf()),
        _ => FileIoError::Io(error),
    }
}

/// Real file access using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileIo;

impl TokioFileIo {
    /// Creates a new `TokioFileIo`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FileIo for TokioFileIo {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, FileIoError> {
        fs::read(path).await.map_err(|e| map_io(path, e))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FileIoError> {
        write_atomic(path, contents).await.map_err(|e| map_io(path, e))
    }
}
