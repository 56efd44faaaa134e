//! Resolution of submitted file references to readable attachments.

use std::path::PathBuf;

use crate::error::TransportError;

/// Where the bytes of a resolved file live.
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A stored file ready to be uploaded.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub file_name: String,
    pub size: u64,
    pub mime_type: String,
    pub source: FileSource,
}

impl ResolvedFile {
    /// Build an in-memory file, guessing its MIME type from the name.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            mime_type: guess_mime(&file_name),
            size: bytes.len() as u64,
            file_name,
            source: FileSource::Bytes(bytes),
        }
    }

    pub async fn read(&self) -> Result<Vec<u8>, TransportError> {
        match &self.source {
            FileSource::Bytes(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| TransportError::FileRead {
                        file_name: self.file_name.clone(),
                        source,
                    })
            }
        }
    }
}

/// Looks up stored files by the identifier the form recorded.
///
/// Called synchronously from the submission task, once per file reference;
/// implementations should answer from local metadata and leave reading the
/// bytes to [`ResolvedFile::read`].
pub trait FileResolver: Send + Sync {
    /// `None` when the file does not exist (or can no longer be read).
    fn resolve(&self, file_id: &str) -> Option<ResolvedFile>;
}

/// Resolves file ids as plain file names inside one directory.
///
/// Only a `stat` runs inside `resolve`; the contents are read asynchronously at
/// upload time.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileResolver for DirectoryResolver {
    fn resolve(&self, file_id: &str) -> Option<ResolvedFile> {
        if file_id.is_empty()
            || file_id.contains(['/', '\\'])
            || file_id == "."
            || file_id == ".."
        {
            crate::log_warn!("Rejecting file id outside the upload directory: {}", file_id);
            return None;
        }

        let path = self.root.join(file_id);
        let metadata = std::fs::metadata(&path).ok()?;
        if !metadata.is_file() {
            return None;
        }

        Some(ResolvedFile {
            file_name: file_id.to_string(),
            size: metadata.len(),
            mime_type: guess_mime(file_id),
            source: FileSource::Path(path),
        })
    }
}

/// Resolver with no files, for submissions without attachments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFiles;

impl FileResolver for NoFiles {
    fn resolve(&self, _file_id: &str) -> Option<ResolvedFile> {
        None
    }
}

fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
