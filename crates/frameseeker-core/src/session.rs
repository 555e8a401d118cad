use anyhow::Result;
use tracing::{debug, info};

use crate::convert::{
    clamp_frame_request, effective_framerate, frame_duration, frame_index_at, max_frame_index,
    time_for_frame,
};
use crate::naming::CaptureFilename;
use crate::pipeline::{CaptureOutcome, CapturePipeline};
use crate::video::{FrameSource, MediaInfo};

/// Where playback currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackPosition {
    pub current_time: f64,
    /// `None` until the media's metadata is known.
    pub duration: Option<f64>,
}

/// Identifies the last loaded file and where it was left.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub name: String,
    pub last_modified: Option<u64>,
    pub current_time: f64,
}

impl Bookmark {
    /// True if `info` describes the same file this bookmark was taken from.
    pub fn matches(&self, info: &MediaInfo) -> bool {
        !self.name.is_empty()
            && self.name == info.name
            && self.last_modified == info.last_modified
    }
}

/// All mutable viewer state: framerate, loaded media, playhead and the
/// capture pipeline with its remembered save directory.
pub struct Session {
    framerate: f64,
    media: Option<Box<dyn FrameSource>>,
    current_time: f64,
    pipeline: CapturePipeline,
}

impl Session {
    pub fn new(framerate: f64, pipeline: CapturePipeline) -> Self {
        Self {
            framerate: effective_framerate(framerate),
            media: None,
            current_time: 0.0,
            pipeline,
        }
    }

    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    /// Change the framerate. Returns false, leaving it untouched, for
    /// non-finite or non-positive values.
    pub fn set_framerate(&mut self, value: f64) -> bool {
        if !value.is_finite() || value <= 0.0 {
            debug!(value, "ignoring invalid framerate");
            return false;
        }
        self.framerate = value;
        info!(framerate = value, "framerate changed");
        true
    }

    /// Load a media, resuming from `resume` when it bookmarks the same file.
    ///
    /// Returns whether the saved position was restored.
    pub fn open(&mut self, media: Box<dyn FrameSource>, resume: Option<&Bookmark>) -> bool {
        let resumed_at = resume.filter(|b| b.matches(media.info())).map(|b| b.current_time);
        info!(name = %media.info().name, ?resumed_at, "media loaded");

        self.media = Some(media);
        self.current_time = 0.0;
        if let Some(time) = resumed_at {
            self.seek_to_time(time);
        }
        resumed_at.is_some()
    }

    pub fn media_info(&self) -> Option<&MediaInfo> {
        self.media.as_ref().map(|m| m.info())
    }

    pub fn position(&self) -> PlaybackPosition {
        PlaybackPosition {
            current_time: self.current_time,
            duration: self.media_info().and_then(|i| i.duration),
        }
    }

    pub fn current_frame(&self) -> u64 {
        frame_index_at(self.current_time, self.framerate)
    }

    pub fn max_frame(&self) -> Option<u64> {
        max_frame_index(self.position().duration, self.framerate)
    }

    /// Move the playhead, clamped to `[0, duration]`. NaN and calls without
    /// media are ignored. Returns the resulting time.
    pub fn seek_to_time(&mut self, time: f64) -> f64 {
        if self.media.is_none() || time.is_nan() {
            return self.current_time;
        }
        let mut time = time.max(0.0);
        if let Some(duration) = self.position().duration {
            time = time.min(duration);
        }
        if time.is_finite() {
            self.current_time = time;
        }
        debug!(time = self.current_time, frame = self.current_frame(), "seeked");
        self.current_time
    }

    /// Jump to a user-entered frame number, clamped to `[0, max_frame]`.
    /// Returns the frame the playhead ended up on, which can sit below the
    /// clamped request when the duration ends mid-frame.
    pub fn jump_to_frame(&mut self, requested: f64) -> u64 {
        let target = clamp_frame_request(requested, self.max_frame());
        self.seek_to_time(time_for_frame(target, self.framerate));
        let frame = self.current_frame();
        if requested.is_nan() || requested as i128 != frame as i128 {
            info!(requested, frame, "frame request clamped");
        }
        frame
    }

    /// Step `frames` frames forward (or backward when negative).
    pub fn step_frames(&mut self, frames: i64) -> f64 {
        self.skip_seconds(frames as f64 * frame_duration(self.framerate))
    }

    /// Skip forward or backward by `seconds`. Needs a known duration.
    pub fn skip_seconds(&mut self, seconds: f64) -> f64 {
        if self.position().duration.is_none() {
            return self.current_time;
        }
        self.seek_to_time(self.current_time + seconds)
    }

    /// Filename the current frame would be captured under.
    pub fn capture_filename(&self) -> CaptureFilename {
        let info = self.media_info();
        self.pipeline.filename_for(
            info.map(|i| i.name.as_str()),
            info.and_then(|i| i.duration),
            self.current_frame(),
            self.framerate,
        )
    }

    /// Capture the current frame. A no-op without a loaded picture.
    pub fn capture(&mut self) -> Result<CaptureOutcome> {
        let media: Option<&mut dyn FrameSource> = match self.media.as_mut() {
            Some(m) => Some(&mut **m),
            None => None,
        };
        self.pipeline.capture(media, self.current_time, self.framerate)
    }

    /// Bookmark of the loaded media at the current position.
    pub fn bookmark(&self) -> Option<Bookmark> {
        self.media_info().map(|info| Bookmark {
            name: info.name.clone(),
            last_modified: info.last_modified,
            current_time: self.current_time,
        })
    }
}
