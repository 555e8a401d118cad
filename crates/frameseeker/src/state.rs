use std::path::PathBuf;

use anyhow::{Context, Result};

use frameseeker_core::session::Bookmark;
use frameseeker_core::store::{
    saved_bookmark, saved_framerate, set_saved_bookmark, set_saved_framerate, StateStore,
};
use frameseeker_proto::proto::SessionState;

/// The state file together with its last loaded contents. Every change is
/// written straight back.
pub struct SavedState {
    store: StateStore,
    state: SessionState,
}

impl SavedState {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let store = StateStore::new(path.unwrap_or_else(StateStore::default_path));
        let state = store.load().context("failed to load saved state")?;
        Ok(Self { store, state })
    }

    pub fn framerate(&self) -> Option<f64> {
        saved_framerate(&self.state)
    }

    pub fn bookmark(&self) -> Option<Bookmark> {
        saved_bookmark(&self.state)
    }

    pub fn set_framerate(&mut self, framerate: f64) -> Result<()> {
        set_saved_framerate(&mut self.state, framerate);
        self.store.save(&self.state).context("failed to save framerate")
    }

    pub fn set_bookmark(&mut self, bookmark: &Bookmark) -> Result<()> {
        set_saved_bookmark(&mut self.state, bookmark);
        self.store.save(&self.state).context("failed to save bookmark")
    }
}
