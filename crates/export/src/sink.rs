//! Destinations for finished documents.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("refusing to emit an empty document")]
    EmptyDocument,

    #[error("invalid file name {0:?}")]
    InvalidFileName(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Where the emitted document ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub file_name: String,
    /// Final path for file sinks.
    pub path: Option<PathBuf>,
    pub len: usize,
}

/// Hands a finished document to the user.
///
/// Implementations must never leave a partial or empty file behind.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn emit(&self, file_name: &str, bytes: Vec<u8>) -> Result<EmittedFile, SinkError>;
}

/// Writes into a directory through a temporary file that is renamed into
/// place once fully written.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SinkError> {
        let target = dir.join(file_name);
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| SinkError::Io(e.error))?;
        Ok(target)
    }
}

#[async_trait]
impl DocumentSink for FileSink {
    async fn emit(&self, file_name: &str, bytes: Vec<u8>) -> Result<EmittedFile, SinkError> {
        if bytes.is_empty() {
            return Err(SinkError::EmptyDocument);
        }
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(SinkError::InvalidFileName(file_name.to_string()));
        }

        let dir = self.dir.clone();
        let name = file_name.to_string();
        let len = bytes.len();
        let path = tokio::task::spawn_blocking(move || Self::write_atomic(&dir, &name, &bytes))
            .await
            .map_err(|e| SinkError::Io(io::Error::other(e)))??;

        info!(path = %path.display(), bytes = len, "document written");
        Ok(EmittedFile {
            file_name: file_name.to_string(),
            path: Some(path),
            len,
        })
    }
}

/// Keeps emitted documents in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn emit(&self, file_name: &str, bytes: Vec<u8>) -> Result<EmittedFile, SinkError> {
        if bytes.is_empty() {
            return Err(SinkError::EmptyDocument);
        }
        let len = bytes.len();
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((file_name.to_string(), bytes));
        Ok(EmittedFile {
            file_name: file_name.to_string(),
            path: None,
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_sink_writes_the_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let emitted = sink
            .emit("Invoice_7.pdf", b"%PDF-1.5 body".to_vec())
            .await
            .unwrap();

        let path = emitted.path.unwrap();
        assert_eq!(path, dir.path().join("Invoice_7.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5 body");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn file_sink_rejects_empty_documents_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let err = sink.emit("Invoice_7.pdf", Vec::new()).await.unwrap_err();
        assert!(matches!(err, SinkError::EmptyDocument));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn file_sink_rejects_nested_names() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSink::new(dir.path())
            .emit("../escape.pdf", b"x".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::InvalidFileName(_)));
    }

    #[tokio::test]
    async fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("missing"));
        let err = sink.emit("Invoice_7.pdf", b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }

    #[tokio::test]
    async fn memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.emit("a.pdf", b"1".to_vec()).await.unwrap();
        sink.emit("b.pdf", b"22".to_vec()).await.unwrap();
        let names: Vec<_> = sink.files().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a.pdf", "b.pdf"]);
    }
}
