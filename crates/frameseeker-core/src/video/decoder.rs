use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::UNIX_EPOCH;

use anyhow::{bail, Context, Result};
use image::RgbImage;
use tracing::{debug, error, info, warn};

use super::{FrameSource, MediaInfo};

/// Video metadata obtained by probing with ffprobe.
#[derive(Debug, Clone, PartialEq)]
struct ProbeResult {
    width: u32,
    height: u32,
    fps: Option<f64>,
    duration: Option<f64>,
}

fn probe(path: &Path) -> Result<ProbeResult> {
    info!(?path, "probing video metadata with ffprobe");

    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height,r_frame_rate:format=duration",
            "-of", "default=noprint_wrappers=1",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .context("failed to run ffprobe — is ffmpeg installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(%stderr, ?path, "ffprobe failed");
        bail!("ffprobe failed: {stderr}");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let result = parse_probe_output(&stdout)?;

    info!(
        width = result.width,
        height = result.height,
        fps = ?result.fps,
        duration = ?result.duration,
        "probe completed"
    );
    Ok(result)
}

/// Parse ffprobe's `key=value` lines. Values such as `N/A` count as unknown.
fn parse_probe_output(stdout: &str) -> Result<ProbeResult> {
    let mut width = None;
    let mut height = None;
    let mut fps = None;
    let mut duration = None;

    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => width = Some(value.parse::<u32>().context("failed to parse width")?),
            "height" => height = Some(value.parse::<u32>().context("failed to parse height")?),
            "r_frame_rate" => fps = parse_rate(value),
            "duration" => duration = value.parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0),
            _ => debug!(key, value, "ignoring ffprobe entry"),
        }
    }

    let (Some(width), Some(height)) = (width, height) else {
        error!(%stdout, "ffprobe reported no video stream dimensions");
        bail!("no video stream found");
    };

    Ok(ProbeResult {
        width,
        height,
        fps,
        duration,
    })
}

/// Parse a rate like `30000/1001` or `25`.
fn parse_rate(value: &str) -> Option<f64> {
    let fps = if let Some((num, den)) = value.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 { num / den } else { 0.0 }
    } else {
        value.parse().ok()?
    };
    if fps > 0.0 {
        Some(fps)
    } else {
        warn!(value, "video has non-positive fps");
        None
    }
}

/// Last modification time of `path` in milliseconds since the Unix epoch.
fn modified_millis(path: &Path) -> Option<u64> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_millis() as u64)
}

/// Rasterizes single frames of a video file with the ffmpeg CLI.
pub struct FfmpegSource {
    path: PathBuf,
    info: MediaInfo,
}

impl FfmpegSource {
    /// Open a video file, probing its metadata.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("video file does not exist: {}", path.display());
        }

        let probe = probe(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let info = MediaInfo {
            name,
            last_modified: modified_millis(path),
            width: probe.width,
            height: probe.height,
            duration: probe.duration,
            native_fps: probe.fps,
        };
        info!(?path, ?info, "video opened");

        Ok(Self {
            path: path.to_path_buf(),
            info,
        })
    }

    fn decode_at(&self, time: f64) -> Result<Option<Vec<u8>>> {
        let frame_bytes = (self.info.width as usize) * (self.info.height as usize) * 3;

        debug!(path = ?self.path, time, "spawning ffmpeg for single frame");
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-ss"])
            .arg(format!("{time:.6}"))
            .arg("-i")
            .arg(&self.path)
            .args([
                "-frames:v", "1",
                "-f", "rawvideo",
                "-pix_fmt", "rgb24",
                "pipe:1",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .context("failed to run ffmpeg — is ffmpeg installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(%stderr, time, "ffmpeg failed");
            bail!("ffmpeg failed: {stderr}");
        }

        let mut buf = output.stdout;
        if buf.is_empty() {
            return Ok(None);
        }
        if buf.len() < frame_bytes {
            error!(
                read_bytes = buf.len(),
                expected_bytes = frame_bytes,
                time,
                "ffmpeg output ended mid-frame"
            );
            bail!("ffmpeg output ended mid-frame (read {}/{frame_bytes} bytes)", buf.len());
        }
        buf.truncate(frame_bytes);
        Ok(Some(buf))
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn grab(&mut self, time: f64) -> Result<RgbImage> {
        let mut buf = self.decode_at(time)?;

        // Seeking to the very end yields no frame; back off to the last one.
        if buf.is_none() && time > 0.0 {
            let step = 1.0 / self.info.native_fps.unwrap_or(crate::convert::DEFAULT_FRAMERATE);
            let retry = (time - step).max(0.0);
            warn!(time, retry, "no frame decoded at end of stream, retrying earlier");
            buf = self.decode_at(retry)?;
        }

        let Some(buf) = buf else {
            bail!("no frame decoded at {time}s");
        };

        RgbImage::from_raw(self.info.width, self.info.height, buf)
            .context("failed to create RgbImage from raw frame data")
    }
}
