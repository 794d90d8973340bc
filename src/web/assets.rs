use async_trait::async_trait;
use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;

/// Name of the single HTML shell served for every client-side route.
pub const ENTRY_DOCUMENT: &str = "index.html";

/// The bundled UI build. Its root holds the entry document.
#[derive(RustEmbed)]
#[folder = "ui/build/"]
pub struct UiBuild;

#[derive(Debug)]
pub enum AssetError {
    NotFound(String),
    InvalidPath(String),
    NotAFile(String),
    IoError(io::Error),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound(path) => write!(f, "Asset not found: {}", path),
            AssetError::InvalidPath(path) => write!(f, "Invalid asset path: {}", path),
            AssetError::NotAFile(path) => write!(f, "Asset is a directory: {}", path),
            AssetError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl Error for AssetError {}

impl From<io::Error> for AssetError {
    fn from(err: io::Error) -> Self {
        AssetError::IoError(err)
    }
}

impl AssetError {
    /// Errors a client should see as a plain 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::NotFound(_) | AssetError::InvalidPath(_))
    }

    fn from_io(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AssetError::NotFound(path.to_string()),
            _ => AssetError::IoError(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Read-only view over a tree of UI files.
///
/// Paths are slash-separated and relative to the source root; `""` is the root itself.
/// Callers pass paths through [`clean_path`] first.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn stat(&self, path: &str) -> Result<EntryKind, AssetError>;

    async fn read_file(&self, path: &str) -> Result<Cow<'static, [u8]>, AssetError>;

    /// Entries of a directory, sorted by name.
    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, AssetError>;

    fn describe(&self) -> String;
}

/// Normalizes a request path into a root-relative asset path.
///
/// Empty and `.` segments are dropped. A `..` segment, a backslash or a NUL byte
/// rejects the whole path, so no path can climb out of the source root.
pub fn clean_path(path: &str) -> Result<String, AssetError> {
    if path.contains('\\') || path.contains('\0') {
        return Err(AssetError::InvalidPath(path.to_string()));
    }

    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(AssetError::InvalidPath(path.to_string())),
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}

/// Assets compiled into the binary with `rust-embed`.
pub struct EmbeddedAssets<E: RustEmbed> {
    _embed: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> EmbeddedAssets<E> {
    pub fn new() -> Self {
        Self {
            _embed: PhantomData,
        }
    }

    fn is_dir(path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        let prefix = format!("{}/", path);
        E::iter().any(|name| name.starts_with(&prefix))
    }
}

impl<E: RustEmbed> Default for EmbeddedAssets<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: RustEmbed + 'static> AssetSource for EmbeddedAssets<E> {
    async fn stat(&self, path: &str) -> Result<EntryKind, AssetError> {
        if E::get(path).is_some() {
            Ok(EntryKind::File)
        } else if Self::is_dir(path) {
            Ok(EntryKind::Dir)
        } else {
            Err(AssetError::NotFound(path.to_string()))
        }
    }

    async fn read_file(&self, path: &str) -> Result<Cow<'static, [u8]>, AssetError> {
        match E::get(path) {
            Some(content) => Ok(content.data),
            None if Self::is_dir(path) => Err(AssetError::NotAFile(path.to_string())),
            None => Err(AssetError::NotFound(path.to_string())),
        }
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, AssetError> {
        if !Self::is_dir(path) {
            return Err(AssetError::NotFound(path.to_string()));
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };

        // Embedded names are full file paths; directories are implied by them.
        let mut entries = BTreeMap::new();
        for name in E::iter() {
            let Some(rest) = name.strip_prefix(prefix.as_str()) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    entries.insert(dir.to_string(), EntryKind::Dir);
                }
                None => {
                    entries.entry(rest.to_string()).or_insert(EntryKind::File);
                }
            }
        }

        Ok(entries
            .into_iter()
            .map(|(name, kind)| DirEntry { name, kind })
            .collect())
    }

    fn describe(&self) -> String {
        "embedded ui build".to_string()
    }
}

/// Assets read from a directory on the serving host.
///
/// Nothing is checked at construction; a missing root shows up as per-request errors.
pub struct ExternalAssets {
    root: PathBuf,
}

impl ExternalAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl AssetSource for ExternalAssets {
    async fn stat(&self, path: &str) -> Result<EntryKind, AssetError> {
        let metadata = tokio::fs::metadata(self.full_path(path))
            .await
            .map_err(|e| AssetError::from_io(path, e))?;

        if metadata.is_dir() {
            Ok(EntryKind::Dir)
        } else {
            Ok(EntryKind::File)
        }
    }

    async fn read_file(&self, path: &str) -> Result<Cow<'static, [u8]>, AssetError> {
        let full_path = self.full_path(path);
        if tokio::fs::metadata(&full_path)
            .await
            .map_err(|e| AssetError::from_io(path, e))?
            .is_dir()
        {
            return Err(AssetError::NotAFile(path.to_string()));
        }

        let bytes = tokio::fs::read(&full_path)
            .await
            .map_err(|e| AssetError::from_io(path, e))?;
        Ok(Cow::Owned(bytes))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, AssetError> {
        let mut dir = tokio::fs::read_dir(self.full_path(path))
            .await
            .map_err(|e| AssetError::from_io(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let kind = if entry.file_type().await?.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(entries)
    }

    fn describe(&self) -> String {
        format!("local ui build at {}", self.root.display())
    }
}

/// Picks the asset source for this process, or `None` when the UI is disabled.
///
/// A non-empty content path always wins over the bundled build.
pub fn resolve_asset_source(config: &AppConfig) -> Option<Arc<dyn AssetSource>> {
    if !config.is_ui_enabled() {
        return None;
    }

    let content_path = config.ui_content_path();
    if content_path.is_empty() {
        return Some(Arc::new(EmbeddedAssets::<UiBuild>::new()));
    }

    info!("serving local build for the ui");
    Some(Arc::new(ExternalAssets::new(content_path)))
}
