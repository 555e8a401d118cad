use std::fmt;

/// Fixed tail of every capture filename. External tooling parses this literally.
pub const CAPTURE_SUFFIX: &str = "-FrameSeeker.png";

/// Base name used when the source has no usable display name.
pub const FALLBACK_BASE: &str = "capture";

/// Options for building capture filenames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamingPolicy {
    /// When non-zero, append `z` + this many zeros + the padded index to the
    /// frame portion.
    pub z_spacing: usize,
}

/// Filename of a single captured frame: `<base>-Frame<padded-index>-FrameSeeker.png`.
///
/// Built fresh for every capture; the padding width must come from the true
/// maximum frame index so names of one source sort in frame order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFilename {
    base: String,
    frame_index: u64,
    width: usize,
    z_spacing: usize,
}

impl CaptureFilename {
    pub fn new(
        source_name: Option<&str>,
        frame_index: u64,
        width: usize,
        policy: NamingPolicy,
    ) -> Self {
        let base = source_name
            .map(strip_extension)
            .filter(|b| !b.is_empty())
            .unwrap_or(FALLBACK_BASE)
            .to_string();
        Self {
            base,
            frame_index,
            width,
            z_spacing: policy.z_spacing,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Zero-padded frame index, e.g. `047`.
    pub fn padded_index(&self) -> String {
        format!("{:0width$}", self.frame_index, width = self.width)
    }
}

impl fmt::Display for CaptureFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let padded = self.padded_index();
        write!(f, "{}-Frame{}", self.base, padded)?;
        if self.z_spacing > 0 {
            write!(f, "z{}{}", "0".repeat(self.z_spacing), padded)?;
        }
        f.write_str(CAPTURE_SUFFIX)
    }
}

/// Drop the last `.ext` of a filename. Names whose only dot is the leading
/// one (`.hidden`) are kept whole.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && !ext.contains('/') => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::padding_width;

    #[test]
    fn padded_from_duration_and_framerate() {
        let width = padding_width(Some(10.0), 30.0);
        let name = CaptureFilename::new(Some("holiday.mp4"), 47, width, NamingPolicy::default());
        assert_eq!(name.to_string(), "holiday-Frame047-FrameSeeker.png");
    }

    #[test]
    fn unknown_source_uses_fallback_base() {
        let name = CaptureFilename::new(None, 5, 4, NamingPolicy::default());
        assert_eq!(name.to_string(), "capture-Frame0005-FrameSeeker.png");
    }

    #[test]
    fn index_wider_than_padding_is_not_truncated() {
        let name = CaptureFilename::new(Some("a.mkv"), 12345, 3, NamingPolicy::default());
        assert_eq!(name.to_string(), "a-Frame12345-FrameSeeker.png");
    }

    #[test]
    fn z_spacing_repeats_padded_index() {
        let policy = NamingPolicy { z_spacing: 2 };
        let name = CaptureFilename::new(Some("clip.webm"), 7, 3, policy);
        assert_eq!(name.to_string(), "clip-Frame007z00007-FrameSeeker.png");
    }

    #[test]
    fn only_last_extension_is_stripped() {
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("trailing."), "trailing.");
    }

    #[test]
    fn names_sort_in_frame_order() {
        let width = padding_width(Some(10.0), 30.0);
        let mut names: Vec<String> = [300, 5, 47, 120, 0]
            .iter()
            .map(|&i| CaptureFilename::new(Some("v.mp4"), i, width, NamingPolicy::default()).to_string())
            .collect();
        names.sort();
        let frames: Vec<u64> = names
            .iter()
            .map(|n| n["v-Frame".len().."v-Frame".len() + width].parse().unwrap())
            .collect();
        assert_eq!(frames, vec![0, 5, 47, 120, 300]);
    }
}
