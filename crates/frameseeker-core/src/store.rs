//! File-backed key-value store for state that outlives a run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::{debug, info, warn};

use frameseeker_proto::proto::{SessionState, VideoState};

use crate::error::StoreError;
use crate::session::Bookmark;

/// Holds the last framerate and last-file bookmark in a single protobuf file.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/frameseeker/state.pb`, or `./.frameseeker/state.pb`
    /// when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("frameseeker"))
            .unwrap_or_else(|| PathBuf::from(".frameseeker"))
            .join("state.pb")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state. A missing file is empty state; so is a file
    /// that no longer decodes.
    pub fn load(&self) -> Result<SessionState, StoreError> {
        let buf = match std::fs::read(&self.path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "no saved state yet");
                return Ok(SessionState::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match SessionState::decode_length_delimited(buf.as_slice()) {
            Ok(state) => {
                debug!(path = ?self.path, ?state, "loaded saved state");
                Ok(state)
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "saved state is corrupt, starting fresh");
                Ok(SessionState::default())
            }
        }
    }

    pub fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        state.encode_length_delimited(&mut buf)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, &buf).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        info!(path = ?self.path, bytes = buf.len(), "state saved");
        Ok(())
    }
}

/// Stored framerate, if it parses to a usable value.
pub fn saved_framerate(state: &SessionState) -> Option<f64> {
    let rate: f64 = state.selected_framerate.trim().parse().ok()?;
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

pub fn set_saved_framerate(state: &mut SessionState, framerate: f64) {
    state.selected_framerate = framerate.to_string();
}

/// Stored bookmark. Entries without a name count as absent.
pub fn saved_bookmark(state: &SessionState) -> Option<Bookmark> {
    let video = state.video_state.as_ref().filter(|v| !v.name.is_empty())?;
    Some(Bookmark {
        name: video.name.clone(),
        last_modified: video.last_modified.parse().ok(),
        current_time: if video.current_time.is_finite() {
            video.current_time.max(0.0)
        } else {
            0.0
        },
    })
}

pub fn set_saved_bookmark(state: &mut SessionState, bookmark: &Bookmark) {
    state.video_state = Some(VideoState {
        name: bookmark.name.clone(),
        last_modified: bookmark
            .last_modified
            .map(|m| m.to_string())
            .unwrap_or_default(),
        current_time: bookmark.current_time,
    });
}
