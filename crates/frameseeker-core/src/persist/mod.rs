//! Ways of getting an encoded capture off to the user.
//!
//! Strategies are tried in order by the capture pipeline; each reports
//! whether it is usable in the current environment and whether its attempt
//! saved the file.

pub mod directory;
pub mod download;
pub mod share;

use std::fmt;
use std::path::PathBuf;

use crate::error::PersistError;

pub use directory::{DirectoryPicker, DirectoryStrategy, Permission, SaveDirectoryHandle};
pub use download::DownloadStrategy;
pub use share::{ShareCommand, ShareStrategy};

pub const PNG_MIME: &str = "image/png";

/// An encoded capture ready to be persisted.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Which strategy ended up persisting a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistKind {
    Share,
    Directory,
    Download,
}

impl fmt::Display for PersistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistKind::Share => write!(f, "share"),
            PersistKind::Directory => write!(f, "directory"),
            PersistKind::Download => write!(f, "download"),
        }
    }
}

/// Result of a strategy attempt that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The file was handed off; the path is where it now lives.
    Saved(PathBuf),
    /// The user cancelled or refused. Not an error.
    Declined,
}

/// Common interface of every persist strategy.
pub trait PersistStrategy {
    fn kind(&self) -> PersistKind;

    /// Whether this strategy can take `file` in the current environment.
    fn is_available(&self, file: &EncodedFrame) -> bool;

    fn attempt(&mut self, file: &EncodedFrame) -> Result<Attempt, PersistError>;
}
