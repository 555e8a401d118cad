mod cli;
mod picker;
mod state;
mod viewer;

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use frameseeker_core::convert::{
    format_timestamp, padding_width, parse_numeric, DEFAULT_FRAMERATE,
};
use frameseeker_core::naming::NamingPolicy;
use frameseeker_core::persist::{DirectoryPicker, DownloadStrategy, ShareCommand};
use frameseeker_core::pipeline::{CaptureConfig, CaptureOutcome, CapturePipeline, SkipReason};
use frameseeker_core::session::{Bookmark, Session};
use frameseeker_core::video::decoder::FfmpegSource;

use cli::{OutputArgs, PositionArgs};
use picker::StdinPicker;
use state::SavedState;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();
    let mut saved = SavedState::load(cli.state_file)?;
    let framerate = cli
        .framerate
        .or_else(|| saved.framerate())
        .unwrap_or(DEFAULT_FRAMERATE);

    match cli.command {
        cli::Command::Info { input } => {
            let session = open_session(&input, framerate, None, None)?;
            print_info(&session);
            Ok(())
        }
        cli::Command::Seek { input, position } => {
            let resume = saved.bookmark();
            let mut session = open_session(&input, framerate, None, resume.as_ref())?;
            apply_position(&mut session, &position);
            remember(&mut saved, &session)?;
            println!(
                "frame {} at {:.6}s",
                session.current_frame(),
                session.position().current_time
            );
            Ok(())
        }
        cli::Command::Capture {
            input,
            position,
            output,
            shared,
        } => {
            let resume = if shared { None } else { saved.bookmark() };
            let pipeline = build_pipeline(&output);
            let mut session = open_session(&input, framerate, Some(pipeline), resume.as_ref())?;
            apply_position(&mut session, &position);

            let outcome = session.capture().context("capture failed")?;
            report_capture(&outcome);
            remember(&mut saved, &session)
        }
        cli::Command::View {
            input,
            output,
            shared,
        } => {
            let resume = if shared { None } else { saved.bookmark() };
            let pipeline = build_pipeline(&output);
            let mut session = open_session(&input, framerate, Some(pipeline), resume.as_ref())?;
            remember(&mut saved, &session)?;
            viewer::run(&mut session, &mut saved)
        }
        cli::Command::Framerate { value } => {
            let Some(value) = value else {
                println!("{}", saved.framerate().unwrap_or(DEFAULT_FRAMERATE));
                return Ok(());
            };
            let rate = parse_numeric(&value);
            if !rate.is_finite() || rate <= 0.0 {
                bail!("framerate must be a positive number, got {value:?}");
            }
            saved.set_framerate(rate)?;
            info!(framerate = rate, "framerate saved");
            Ok(())
        }
        cli::Command::Resume => {
            match saved.bookmark() {
                Some(b) => println!(
                    "{} at {} ({:.3}s)",
                    b.name,
                    format_timestamp(b.current_time, false),
                    b.current_time
                ),
                None => println!("nothing to resume"),
            }
            Ok(())
        }
    }
}

fn open_session(
    input: &Path,
    framerate: f64,
    pipeline: Option<CapturePipeline>,
    resume: Option<&Bookmark>,
) -> Result<Session> {
    let media = FfmpegSource::open(input).context("failed to open video")?;
    let pipeline = pipeline
        .unwrap_or_else(|| CapturePipeline::with_strategies(NamingPolicy::default(), Vec::new()));

    let mut session = Session::new(framerate, pipeline);
    if session.open(Box::new(media), resume) {
        info!(time = session.position().current_time, "resumed from bookmark");
    }
    Ok(session)
}

fn build_pipeline(output: &OutputArgs) -> CapturePipeline {
    let share_command = output.share_with.as_deref().and_then(ShareCommand::parse);
    let picker: Option<Box<dyn DirectoryPicker>> =
        if output.no_picker || !std::io::stdin().is_terminal() {
            None
        } else {
            Some(Box::new(StdinPicker))
        };

    let config = CaptureConfig {
        naming: NamingPolicy {
            z_spacing: output.z_spacing,
        },
        share_command,
        save_dir: output.save_dir.clone(),
        download_dir: output
            .download_dir
            .clone()
            .unwrap_or_else(DownloadStrategy::default_dir),
        ..CaptureConfig::default()
    };
    CapturePipeline::new(config, picker)
}

fn apply_position(session: &mut Session, position: &PositionArgs) {
    if let Some(time) = position.time {
        session.seek_to_time(time);
    }
    if let Some(frame) = &position.frame {
        session.jump_to_frame(parse_numeric(frame));
    }
    if let Some(step) = position.step {
        session.step_frames(step);
    }
    if let Some(skip) = position.skip {
        session.skip_seconds(skip);
    }
}

fn remember(saved: &mut SavedState, session: &Session) -> Result<()> {
    if let Some(bookmark) = session.bookmark() {
        saved.set_bookmark(&bookmark)?;
    }
    Ok(())
}

fn print_info(session: &Session) {
    let Some(info) = session.media_info() else {
        return;
    };
    let position = session.position();
    let use_hours = position.duration.is_some_and(|d| d >= 3600.0);

    println!("name:        {}", info.name);
    println!("dimensions:  {}x{}", info.width, info.height);
    match position.duration {
        Some(d) => println!("duration:    {} ({d:.3}s)", format_timestamp(d, use_hours)),
        None => println!("duration:    unknown"),
    }
    match info.native_fps {
        Some(fps) => println!("native fps:  {fps:.3}"),
        None => println!("native fps:  unknown"),
    }
    println!("framerate:   {}", session.framerate());
    match session.max_frame() {
        Some(max) => println!("max frame:   {max}"),
        None => println!("max frame:   unknown"),
    }
    println!(
        "padding:     {}",
        padding_width(position.duration, session.framerate())
    );
    println!("sample name: {}", session.capture_filename());
}

pub(crate) fn report_capture(outcome: &CaptureOutcome) {
    match outcome {
        CaptureOutcome::Saved {
            filename,
            via,
            location,
        } => {
            info!(%filename, %via, ?location, "frame captured");
            println!("{}", location.display());
        }
        CaptureOutcome::Skipped(SkipReason::NoMedia) => warn!("no video loaded, nothing captured"),
        CaptureOutcome::Skipped(SkipReason::NoPicture) => {
            warn!("video has no decoded picture yet, nothing captured")
        }
    }
}
