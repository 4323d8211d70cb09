use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Destination is not a valid file path: {0}")]
    InvalidDestination(PathBuf),
    #[error("Error whilst writing to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Replace `destination` with `lines` joined by newlines, returning the number of bytes written.
///
/// The contents are staged in a temporary file next to the destination, so a failed
/// write leaves any previous file in place. An existing file's permissions carry over
/// to the new one. A symlink at `destination` is replaced by a regular file rather
/// than written through.
pub async fn write_lines(destination: &Path, lines: &[String]) -> Result<usize, PersistError> {
    let parent = match destination.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return Err(PersistError::InvalidDestination(destination.to_path_buf())),
    };
    let io = |source: std::io::Error| PersistError::Io {
        path: destination.to_path_buf(),
        source,
    };
    let contents = lines.join("\n");
    let temp = NamedTempFile::new_in(parent).map_err(io)?;
    let mut file = File::from_std(temp.reopen().map_err(io)?);
    file.write_all(contents.as_bytes()).await.map_err(io)?;
    file.flush().await.map_err(io)?;
    drop(file);
    if let Ok(previous) = fs::metadata(destination).await {
        temp.as_file()
            .set_permissions(previous.permissions())
            .map_err(io)?;
    }
    temp.persist(destination).map_err(|e| io(e.error))?;
    log::debug!("Wrote {} bytes to {}", contents.len(), destination.display());
    Ok(contents.len())
}
