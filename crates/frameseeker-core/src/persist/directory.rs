use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{Attempt, EncodedFrame, PersistKind, PersistStrategy};
use crate::error::PersistError;

/// Whether the running platform is one where folder writes are known to be
/// refused even when a picker exists.
pub fn is_mobile_platform() -> bool {
    cfg!(any(target_os = "android", target_os = "ios"))
}

/// Write access state of a save directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not decided yet; requesting may grant it.
    Prompt,
}

/// A directory the user chose to save captures into.
///
/// Access can disappear at any time (directory removed, made read-only), so
/// [`SaveDirectoryHandle::query_permission`] must be called before each reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDirectoryHandle {
    path: PathBuf,
}

impl SaveDirectoryHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn query_permission(&self) -> Permission {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => Permission::Granted,
            Ok(_) => Permission::Denied,
            Err(e) if e.kind() == ErrorKind::NotFound => Permission::Prompt,
            Err(e) => {
                debug!(path = ?self.path, error = %e, "save directory not accessible");
                Permission::Denied
            }
        }
    }

    /// Ask for write access, creating the directory if it does not exist yet.
    pub fn request_permission(&self) -> Permission {
        match self.query_permission() {
            Permission::Prompt => {
                if let Err(e) = std::fs::create_dir_all(&self.path) {
                    warn!(path = ?self.path, error = %e, "failed to create save directory");
                    return Permission::Denied;
                }
                self.query_permission()
            }
            other => other,
        }
    }

    /// Create or overwrite `filename` inside the directory.
    pub fn write_file(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let path = self.path.join(filename);
        std::fs::write(&path, bytes).map_err(|source| PersistError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Prompts the user for a directory. `Ok(None)` means the user cancelled.
pub trait DirectoryPicker {
    fn pick(&mut self) -> Result<Option<PathBuf>, PersistError>;
}

/// Writes captures into a user-chosen directory, remembering the choice.
pub struct DirectoryStrategy {
    picker: Option<Box<dyn DirectoryPicker>>,
    cached: Option<SaveDirectoryHandle>,
    mobile: bool,
}

impl DirectoryStrategy {
    pub fn new(picker: Option<Box<dyn DirectoryPicker>>) -> Self {
        Self {
            picker,
            cached: None,
            mobile: is_mobile_platform(),
        }
    }

    /// Seed the strategy with a previously granted directory.
    pub fn with_cached(mut self, handle: SaveDirectoryHandle) -> Self {
        self.cached = Some(handle);
        self
    }

    pub fn on_mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    pub fn cached(&self) -> Option<&SaveDirectoryHandle> {
        self.cached.as_ref()
    }

    /// Return a directory with write access, re-prompting when the cached
    /// one lost it.
    fn ensure_directory(&mut self) -> Result<Option<SaveDirectoryHandle>, PersistError> {
        if let Some(handle) = &self.cached {
            let permission = match handle.query_permission() {
                Permission::Prompt => handle.request_permission(),
                permission => permission,
            };
            match permission {
                Permission::Granted => {
                    debug!(path = ?handle.path(), "reusing save directory");
                    return Ok(Some(handle.clone()));
                }
                permission => {
                    info!(path = ?handle.path(), ?permission, "save directory permission lost, asking again");
                }
            }
        }

        let Some(picker) = self.picker.as_mut() else {
            debug!("no directory picker available");
            return Ok(None);
        };
        let Some(path) = picker.pick()? else {
            info!("directory picker cancelled");
            return Ok(None);
        };

        let handle = SaveDirectoryHandle::new(path);
        match handle.request_permission() {
            Permission::Granted => {
                info!(path = ?handle.path(), "save directory granted");
                self.cached = Some(handle.clone());
                Ok(Some(handle))
            }
            permission => {
                warn!(path = ?handle.path(), ?permission, "write permission not granted");
                Ok(None)
            }
        }
    }
}

impl PersistStrategy for DirectoryStrategy {
    fn kind(&self) -> PersistKind {
        PersistKind::Directory
    }

    fn is_available(&self, _file: &EncodedFrame) -> bool {
        !self.mobile && (self.picker.is_some() || self.cached.is_some())
    }

    fn attempt(&mut self, file: &EncodedFrame) -> Result<Attempt, PersistError> {
        let Some(dir) = self.ensure_directory()? else {
            return Ok(Attempt::Declined);
        };
        let path = dir.write_file(&file.filename, &file.bytes)?;
        info!(?path, bytes = file.bytes.len(), "capture written to save directory");
        Ok(Attempt::Saved(path))
    }
}
