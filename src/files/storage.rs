use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Metadata returned for every stored upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub size: u64,
    pub sha256: String,
}

/// Flat directory of uploaded files
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    chunk_bytes: usize,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, chunk_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            chunk_bytes: chunk_bytes.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    /// Start writing an upload. The data lands under a temporary name and is
    /// renamed into place by [`FileWriter::finish`].
    pub async fn create(&self, filename: &str) -> Result<FileWriter, FileError> {
        let filename = validate_name(filename)?.to_string();
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(&filename);
        let partial = self.dir.join(format!(".{}.part", filename));
        let file = File::create(&partial).await?;

        Ok(FileWriter {
            file,
            hasher: Sha256::new(),
            size: 0,
            filename,
            path,
            partial,
        })
    }

    /// Open a stored file for reading, returning it with its length
    pub async fn open(&self, filename: &str) -> Result<(File, u64), FileError> {
        let path = self.path_of(filename)?;
        match File::open(&path).await {
            Ok(file) => {
                let len = file.metadata().await?.len();
                Ok((file, len))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::NotFound(filename.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, FileError> {
        let path = self.path_of(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::NotFound(filename.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn path_of(&self, filename: &str) -> Result<PathBuf, FileError> {
        Ok(self.dir.join(validate_name(filename)?))
    }
}

/// In-progress upload
pub struct FileWriter {
    file: File,
    hasher: Sha256,
    size: u64,
    filename: String,
    path: PathBuf,
    partial: PathBuf,
}

impl FileWriter {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), FileError> {
        self.file.write_all(chunk).await?;
        self.hasher.update(chunk);
        self.size += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredFile, FileError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        drop(self.file);
        tokio::fs::rename(&self.partial, &self.path).await?;

        let stored = StoredFile {
            filename: self.filename,
            size: self.size,
            sha256: format!("{:x}", self.hasher.finalize()),
        };
        info!(filename = %stored.filename, size = stored.size, "stored upload");
        Ok(stored)
    }

    /// Discard a partially written upload
    pub async fn abort(self) {
        drop(self.file);
        let _ = tokio::fs::remove_file(&self.partial).await;
    }
}

/// Reduce a client-supplied upload name to its final path component
pub fn upload_name(raw: &str) -> Result<&str, FileError> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    validate_name(last)
}

/// Accept only plain names that stay inside the upload directory
pub fn validate_name(name: &str) -> Result<&str, FileError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.starts_with('.')
        || name.len() > 255
        || name.chars().any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());

    if invalid {
        Err(FileError::InvalidName(name.to_string()))
    } else {
        Ok(name)
    }
}
