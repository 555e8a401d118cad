use std::io::Cursor;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use image::{ImageFormat, RgbImage};
use tracing::{debug, info, warn};

use crate::convert::{frame_index_at, padding_width};
use crate::naming::{CaptureFilename, NamingPolicy};
use crate::persist::{
    Attempt, DirectoryPicker, DirectoryStrategy, DownloadStrategy, EncodedFrame, PersistKind,
    PersistStrategy, SaveDirectoryHandle, ShareCommand, ShareStrategy, PNG_MIME,
};
use crate::video::FrameSource;

/// Parameters for the capture pipeline.
pub struct CaptureConfig {
    pub naming: NamingPolicy,
    /// Share handler to offer captures to first, or None to skip sharing.
    pub share_command: Option<ShareCommand>,
    /// Previously granted save directory to try before prompting.
    pub save_dir: Option<PathBuf>,
    /// Where the download fallback writes.
    pub download_dir: PathBuf,
    /// Treat the platform as mobile, disabling directory writes.
    pub mobile: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            naming: NamingPolicy::default(),
            share_command: None,
            save_dir: None,
            download_dir: DownloadStrategy::default_dir(),
            mobile: crate::persist::directory::is_mobile_platform(),
        }
    }
}

/// Why a capture request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoMedia,
    NoPicture,
}

/// Result of one capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Skipped(SkipReason),
    Saved {
        filename: String,
        via: PersistKind,
        location: PathBuf,
    },
}

/// Rasterize → name → encode → persist, with persist strategies tried in order.
pub struct CapturePipeline {
    naming: NamingPolicy,
    strategies: Vec<Box<dyn PersistStrategy>>,
}

impl CapturePipeline {
    /// Build the standard chain: share, then directory write, then download.
    pub fn new(config: CaptureConfig, picker: Option<Box<dyn DirectoryPicker>>) -> Self {
        let mut directory = DirectoryStrategy::new(picker).on_mobile(config.mobile);
        if let Some(dir) = config.save_dir {
            directory = directory.with_cached(SaveDirectoryHandle::new(dir));
        }

        Self::with_strategies(
            config.naming,
            vec![
                Box::new(ShareStrategy::new(config.share_command)),
                Box::new(directory),
                Box::new(DownloadStrategy::new(config.download_dir)),
            ],
        )
    }

    pub fn with_strategies(naming: NamingPolicy, strategies: Vec<Box<dyn PersistStrategy>>) -> Self {
        Self { naming, strategies }
    }

    pub fn naming(&self) -> NamingPolicy {
        self.naming
    }

    /// Filename a capture of `frame_index` would get for this media.
    pub fn filename_for(
        &self,
        source_name: Option<&str>,
        duration: Option<f64>,
        frame_index: u64,
        framerate: f64,
    ) -> CaptureFilename {
        let width = padding_width(duration, framerate);
        CaptureFilename::new(source_name, frame_index, width, self.naming)
    }

    /// Capture the frame shown at `time` and persist it.
    ///
    /// Media that is missing or has no decoded picture makes this a no-op.
    pub fn capture(
        &mut self,
        media: Option<&mut dyn FrameSource>,
        time: f64,
        framerate: f64,
    ) -> Result<CaptureOutcome> {
        let Some(media) = media else {
            debug!("capture requested without media");
            return Ok(CaptureOutcome::Skipped(SkipReason::NoMedia));
        };
        let info = media.info().clone();
        if !info.has_picture() {
            debug!(name = %info.name, "capture requested before media has a picture");
            return Ok(CaptureOutcome::Skipped(SkipReason::NoPicture));
        }

        let frame_number = frame_index_at(time, framerate);
        let image = media
            .grab(time)
            .with_context(|| format!("failed to rasterize frame {frame_number}"))?;

        let filename = self
            .filename_for(Some(&info.name), info.duration, frame_number, framerate)
            .to_string();
        let bytes = encode_png(&image)?;
        info!(
            %filename,
            frame_number,
            time,
            bytes = bytes.len(),
            "frame encoded"
        );

        let file = EncodedFrame {
            filename,
            mime: PNG_MIME,
            bytes,
        };
        let (via, location) = self.persist(&file)?;

        Ok(CaptureOutcome::Saved {
            filename: file.filename,
            via,
            location,
        })
    }

    /// Hand `file` to the first strategy that accepts it.
    pub fn persist(&mut self, file: &EncodedFrame) -> Result<(PersistKind, PathBuf)> {
        for strategy in &mut self.strategies {
            let kind = strategy.kind();
            if !strategy.is_available(file) {
                debug!(%kind, "persist strategy unavailable");
                continue;
            }
            match strategy.attempt(file) {
                Ok(Attempt::Saved(location)) => {
                    info!(%kind, ?location, filename = %file.filename, "capture persisted");
                    return Ok((kind, location));
                }
                Ok(Attempt::Declined) => {
                    info!(%kind, "persist strategy declined, falling through");
                }
                Err(e) => {
                    warn!(%kind, error = %e, "persist strategy failed, falling through");
                }
            }
        }
        bail!("no persist strategy accepted {}", file.filename)
    }
}

/// Encode an RGB bitmap as a lossless PNG at its native size.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("failed to encode PNG")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use image::Rgb;
    use tracing_test::traced_test;

    use super::*;
    use crate::error::PersistError;
    use crate::video::MediaInfo;

    struct StillSource {
        info: MediaInfo,
        grabs: Vec<f64>,
    }

    impl StillSource {
        fn new(width: u32, height: u32, duration: Option<f64>) -> Self {
            Self {
                info: MediaInfo {
                    name: "holiday.mp4".to_string(),
                    last_modified: Some(1),
                    width,
                    height,
                    duration,
                    native_fps: Some(30.0),
                },
                grabs: Vec::new(),
            }
        }
    }

    impl FrameSource for StillSource {
        fn info(&self) -> &MediaInfo {
            &self.info
        }

        fn grab(&mut self, time: f64) -> Result<RgbImage> {
            self.grabs.push(time);
            Ok(RgbImage::from_pixel(self.info.width, self.info.height, Rgb([10, 20, 30])))
        }
    }

    /// Strategy double that records every call into a shared log.
    struct Scripted {
        kind: PersistKind,
        available: bool,
        result: fn() -> Result<Attempt, PersistError>,
        log: Rc<RefCell<Vec<(PersistKind, String)>>>,
    }

    impl PersistStrategy for Scripted {
        fn kind(&self) -> PersistKind {
            self.kind
        }

        fn is_available(&self, _file: &EncodedFrame) -> bool {
            self.available
        }

        fn attempt(&mut self, file: &EncodedFrame) -> Result<Attempt, PersistError> {
            self.log.borrow_mut().push((self.kind, file.filename.clone()));
            (self.result)()
        }
    }

    type Log = Rc<RefCell<Vec<(PersistKind, String)>>>;

    fn scripted(
        log: &Log,
        kind: PersistKind,
        available: bool,
        result: fn() -> Result<Attempt, PersistError>,
    ) -> Box<dyn PersistStrategy> {
        Box::new(Scripted {
            kind,
            available,
            result,
            log: log.clone(),
        })
    }

    fn saved() -> Result<Attempt, PersistError> {
        Ok(Attempt::Saved(PathBuf::from("somewhere.png")))
    }

    fn declined() -> Result<Attempt, PersistError> {
        Ok(Attempt::Declined)
    }

    fn failed() -> Result<Attempt, PersistError> {
        Err(PersistError::Write {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }

    #[test]
    fn no_media_is_a_no_op() {
        let log = Log::default();
        let mut pipeline = CapturePipeline::with_strategies(
            NamingPolicy::default(),
            vec![scripted(&log, PersistKind::Download, true, saved)],
        );
        let outcome = pipeline.capture(None, 1.0, 30.0).unwrap();
        assert_eq!(outcome, CaptureOutcome::Skipped(SkipReason::NoMedia));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn zero_dimension_media_is_a_no_op() {
        let log = Log::default();
        let mut pipeline = CapturePipeline::with_strategies(
            NamingPolicy::default(),
            vec![scripted(&log, PersistKind::Download, true, saved)],
        );
        let mut media = StillSource::new(0, 0, None);
        let outcome = pipeline.capture(Some(&mut media), 1.0, 30.0).unwrap();
        assert_eq!(outcome, CaptureOutcome::Skipped(SkipReason::NoPicture));
        assert!(media.grabs.is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    #[traced_test]
    fn falls_back_to_download_exactly_once() {
        let log = Log::default();
        let mut pipeline = CapturePipeline::with_strategies(
            NamingPolicy::default(),
            vec![
                scripted(&log, PersistKind::Share, false, saved),
                scripted(&log, PersistKind::Directory, false, saved),
                scripted(&log, PersistKind::Download, true, saved),
            ],
        );
        let mut media = StillSource::new(4, 2, Some(10.0));

        let outcome = pipeline.capture(Some(&mut media), 47.0 / 30.0, 30.0).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![(
                PersistKind::Download,
                "holiday-Frame047-FrameSeeker.png".to_string()
            )]
        );
        assert!(matches!(
            outcome,
            CaptureOutcome::Saved { via: PersistKind::Download, .. }
        ));
    }

    #[test]
    fn declined_share_and_failed_directory_fall_through_in_order() {
        let log = Log::default();
        let mut pipeline = CapturePipeline::with_strategies(
            NamingPolicy::default(),
            vec![
                scripted(&log, PersistKind::Share, true, declined),
                scripted(&log, PersistKind::Directory, true, failed),
                scripted(&log, PersistKind::Download, true, saved),
            ],
        );
        let mut media = StillSource::new(4, 2, Some(10.0));

        pipeline.capture(Some(&mut media), 0.0, 30.0).unwrap();

        let kinds: Vec<PersistKind> = log.borrow().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![PersistKind::Share, PersistKind::Directory, PersistKind::Download]
        );
    }

    #[test]
    fn first_success_stops_the_chain() {
        let log = Log::default();
        let mut pipeline = CapturePipeline::with_strategies(
            NamingPolicy::default(),
            vec![
                scripted(&log, PersistKind::Share, true, saved),
                scripted(&log, PersistKind::Download, true, saved),
            ],
        );
        let mut media = StillSource::new(4, 2, Some(10.0));

        let outcome = pipeline.capture(Some(&mut media), 0.0, 30.0).unwrap();

        assert_eq!(log.borrow().len(), 1);
        assert!(matches!(outcome, CaptureOutcome::Saved { via: PersistKind::Share, .. }));
    }

    #[test]
    fn exhausted_chain_is_an_error() {
        let log = Log::default();
        let mut pipeline = CapturePipeline::with_strategies(
            NamingPolicy::default(),
            vec![scripted(&log, PersistKind::Download, true, failed)],
        );
        let mut media = StillSource::new(4, 2, Some(10.0));
        assert!(pipeline.capture(Some(&mut media), 0.0, 30.0).is_err());
    }

    #[test]
    fn standard_chain_downloads_png_when_nothing_else_is_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let config = CaptureConfig {
            download_dir: tmp.path().to_path_buf(),
            mobile: false,
            ..CaptureConfig::default()
        };
        let mut pipeline = CapturePipeline::new(config, None);
        let mut media = StillSource::new(8, 6, Some(2.0));

        let outcome = pipeline.capture(Some(&mut media), 1.04, 25.0).unwrap();

        let expected = tmp.path().join("holiday-Frame26-FrameSeeker.png");
        assert_eq!(
            outcome,
            CaptureOutcome::Saved {
                filename: "holiday-Frame26-FrameSeeker.png".to_string(),
                via: PersistKind::Download,
                location: expected.clone(),
            }
        );
        let decoded = image::open(&expected).unwrap().into_rgb8();
        assert_eq!(decoded.dimensions(), (8, 6));
        assert_eq!(*decoded.get_pixel(3, 3), Rgb([10, 20, 30]));
    }

    #[test]
    fn missing_save_dir_is_created_instead_of_downloading() {
        let tmp = tempfile::tempdir().unwrap();
        let save_dir = tmp.path().join("captures");
        let config = CaptureConfig {
            save_dir: Some(save_dir.clone()),
            download_dir: tmp.path().join("downloads"),
            mobile: false,
            ..CaptureConfig::default()
        };
        let mut pipeline = CapturePipeline::new(config, None);
        let file = EncodedFrame {
            filename: "x.png".to_string(),
            mime: PNG_MIME,
            bytes: vec![1, 2, 3],
        };

        let (via, location) = pipeline.persist(&file).unwrap();

        assert_eq!(via, PersistKind::Directory);
        assert_eq!(location, save_dir.join("x.png"));
        assert!(save_dir.is_dir());
        assert!(!tmp.path().join("downloads").exists());
    }

    #[test]
    fn encode_png_is_lossless() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([255, 0, 128]));
        let bytes = encode_png(&img).unwrap();
        let back = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .into_rgb8();
        assert_eq!(back, img);
    }
}
