use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use super::{Attempt, EncodedFrame, PersistKind, PersistStrategy};
use crate::error::PersistError;

/// An external program acting as the OS share sheet. It is invoked with the
/// capture's path appended to `args`; a non-zero exit means the user
/// dismissed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShareCommand {
    /// Split a command line like `"kdeconnect-cli --share"` on whitespace.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// Offers captures to a share handler.
pub struct ShareStrategy {
    command: Option<ShareCommand>,
    staging_dir: PathBuf,
}

impl ShareStrategy {
    pub fn new(command: Option<ShareCommand>) -> Self {
        Self {
            command,
            staging_dir: std::env::temp_dir().join("frameseeker-share"),
        }
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }
}

impl PersistStrategy for ShareStrategy {
    fn kind(&self) -> PersistKind {
        PersistKind::Share
    }

    fn is_available(&self, file: &EncodedFrame) -> bool {
        self.command.is_some() && file.mime.starts_with("image/")
    }

    fn attempt(&mut self, file: &EncodedFrame) -> Result<Attempt, PersistError> {
        let Some(command) = &self.command else {
            return Ok(Attempt::Declined);
        };

        std::fs::create_dir_all(&self.staging_dir).map_err(|source| PersistError::Write {
            path: self.staging_dir.clone(),
            source,
        })?;
        let staged = self.staging_dir.join(&file.filename);
        std::fs::write(&staged, &file.bytes).map_err(|source| PersistError::Write {
            path: staged.clone(),
            source,
        })?;

        debug!(program = %command.program, ?staged, "invoking share handler");
        let status = Command::new(&command.program)
            .args(&command.args)
            .arg(&staged)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| PersistError::ShareLaunch {
                program: command.program.clone(),
                source,
            })?;

        if status.success() {
            info!(program = %command.program, ?staged, "capture shared");
            Ok(Attempt::Saved(staged))
        } else {
            info!(program = %command.program, ?status, "share dismissed");
            if let Err(e) = std::fs::remove_file(&staged) {
                warn!(?staged, error = %e, "failed to clean up staged share file");
            }
            Ok(Attempt::Declined)
        }
    }
}
