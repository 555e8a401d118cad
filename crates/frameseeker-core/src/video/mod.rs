pub mod decoder;

use anyhow::Result;
use image::RgbImage;

/// What is known about a loaded media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Display name of the source, usually its file name.
    pub name: String,
    /// Last modification time in milliseconds since the Unix epoch.
    pub last_modified: Option<u64>,
    /// Native pixel width, 0 until decoded.
    pub width: u32,
    /// Native pixel height, 0 until decoded.
    pub height: u32,
    /// Duration in seconds, `None` until metadata is known.
    pub duration: Option<f64>,
    /// Framerate reported by the container, informational only.
    pub native_fps: Option<f64>,
}

impl MediaInfo {
    /// True once the media has decoded pixel dimensions.
    pub fn has_picture(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A loaded media the session can query and rasterize frames from.
pub trait FrameSource {
    fn info(&self) -> &MediaInfo;

    /// Rasterize the frame shown at `time` seconds at native size.
    fn grab(&mut self, time: f64) -> Result<RgbImage>;
}
