//! Files the user has picked, keyed by name and modification time.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// MIME types accepted by `add_files`.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg"];

/// A file selected on the client.
#[derive(Debug, Clone)]
pub struct ClientFile {
    pub name: String,
    pub last_modified: DateTime<Utc>,
    /// MIME type declared for the file.
    pub mime_type: String,
    pub bytes: Bytes,
}

impl ClientFile {
    pub fn new(
        name: impl Into<String>,
        last_modified: DateTime<Utc>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            last_modified,
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, taking the MIME type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let metadata = tokio::fs::metadata(path).await?;
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            mime_type: mime_for_extension(path).to_string(),
            name,
            last_modified,
            bytes: Bytes::from(bytes),
        })
    }

    pub fn key(&self) -> FileKey {
        FileKey::new(&self.name, self.last_modified)
    }

    pub fn is_jpeg(&self) -> bool {
        ACCEPTED_MIME_TYPES.contains(&self.mime_type.as_str())
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") | Some("jpe") | Some("jfif") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Identity of a file instance: `"<name>-<last_modified_millis>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileKey(String);

impl FileKey {
    pub fn new(name: &str, last_modified: DateTime<Utc>) -> Self {
        Self(format!("{}-{}", name, last_modified.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conversion state of a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Converting,
    Success,
    Error,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Converting => "converting",
            FileStatus::Success => "success",
            FileStatus::Error => "error",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a successful single-file conversion.
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    /// Suggested download name, `<basename>.<format>`.
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct TrackedFile {
    pub file: ClientFile,
    pub status: FileStatus,
    pub converted: Option<ConvertedFile>,
    pub error: Option<String>,
}

impl TrackedFile {
    fn new(file: ClientFile) -> Self {
        Self {
            file,
            status: FileStatus::Pending,
            converted: None,
            error: None,
        }
    }

    pub fn key(&self) -> FileKey {
        self.file.key()
    }
}

/// Insertion-ordered collection of tracked files.
#[derive(Debug, Default)]
pub struct FileTracker {
    order: Vec<FileKey>,
    files: HashMap<FileKey, TrackedFile>,
}

impl FileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `file`. Returns `None` if its key is already tracked.
    pub fn insert(&mut self, file: ClientFile) -> Option<FileKey> {
        let key = file.key();
        if self.files.contains_key(&key) {
            return None;
        }
        self.order.push(key.clone());
        self.files.insert(key.clone(), TrackedFile::new(file));
        Some(key)
    }

    pub fn get(&self, key: &FileKey) -> Option<&TrackedFile> {
        self.files.get(key)
    }

    pub fn get_mut(&mut self, key: &FileKey) -> Option<&mut TrackedFile> {
        self.files.get_mut(key)
    }

    pub fn contains(&self, key: &FileKey) -> bool {
        self.files.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tracked files in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedFile> {
        self.order.iter().filter_map(|k| self.files.get(k))
    }

    pub fn count_with_status(&self, status: FileStatus) -> usize {
        self.files.values().filter(|f| f.status == status).count()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.files.clear();
    }
}
