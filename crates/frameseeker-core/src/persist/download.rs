use std::path::{Path, PathBuf};

use tracing::info;

use super::{Attempt, EncodedFrame, PersistKind, PersistStrategy};
use crate::error::PersistError;

/// Last-resort strategy: write the capture into the download directory.
pub struct DownloadStrategy {
    dir: PathBuf,
}

impl DownloadStrategy {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The platform download directory, or the working directory without one.
    pub fn default_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PersistStrategy for DownloadStrategy {
    fn kind(&self) -> PersistKind {
        PersistKind::Download
    }

    fn is_available(&self, _file: &EncodedFrame) -> bool {
        true
    }

    fn attempt(&mut self, file: &EncodedFrame) -> Result<Attempt, PersistError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PersistError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(&file.filename);
        std::fs::write(&path, &file.bytes).map_err(|source| PersistError::Write {
            path: path.clone(),
            source,
        })?;

        info!(?path, bytes = file.bytes.len(), "capture downloaded");
        Ok(Attempt::Saved(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::PNG_MIME;

    #[test]
    fn writes_into_nested_download_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        let mut strategy = DownloadStrategy::new(&dir);
        let file = EncodedFrame {
            filename: "x-Frame01-FrameSeeker.png".to_string(),
            mime: PNG_MIME,
            bytes: vec![1, 2, 3],
        };

        assert!(strategy.is_available(&file));
        let attempt = strategy.attempt(&file).unwrap();

        let expected = dir.join("x-Frame01-FrameSeeker.png");
        assert_eq!(attempt, Attempt::Saved(expected.clone()));
        assert_eq!(std::fs::read(expected).unwrap(), vec![1, 2, 3]);
    }
}
