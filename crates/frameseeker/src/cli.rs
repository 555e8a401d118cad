use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "frameseeker", about = "Frame-accurate video stepper and frame grabber")]
pub struct Cli {
    /// State file holding the last framerate and last-file bookmark.
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Framerate for this run only; the saved one is left alone.
    #[arg(long, global = true)]
    pub framerate: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show metadata and frame accounting for a video.
    Info {
        /// Path to the input video file.
        input: PathBuf,
    },
    /// Move the saved playhead and print where it landed.
    Seek {
        input: PathBuf,

        #[command(flatten)]
        position: PositionArgs,
    },
    /// Save the frame at the playhead as a PNG.
    Capture {
        input: PathBuf,

        #[command(flatten)]
        position: PositionArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// The video was handed over by the OS share mechanism; skip resuming.
        #[arg(long)]
        shared: bool,
    },
    /// Step through a video interactively, capturing frames on demand.
    View {
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// The video was handed over by the OS share mechanism; skip resuming.
        #[arg(long)]
        shared: bool,
    },
    /// Print the saved framerate, or save a new one.
    Framerate {
        /// New framerate, e.g. 23.976.
        value: Option<String>,
    },
    /// Print the bookmark of the last loaded video.
    Resume,
}

/// Playhead adjustments, applied in the order time, frame, step, skip.
#[derive(Args)]
pub struct PositionArgs {
    /// Seek to this time in seconds.
    #[arg(long)]
    pub time: Option<f64>,

    /// Jump to this frame. Out-of-range values are clamped.
    #[arg(long, allow_hyphen_values = true)]
    pub frame: Option<String>,

    /// Step this many frames (negative steps back).
    #[arg(long, allow_hyphen_values = true)]
    pub step: Option<i64>,

    /// Skip this many seconds (negative skips back).
    #[arg(long, allow_hyphen_values = true)]
    pub skip: Option<f64>,
}

#[derive(Args)]
pub struct OutputArgs {
    /// Command that shares a file, invoked with the PNG path appended.
    #[arg(long)]
    pub share_with: Option<String>,

    /// Directory to save captures into without prompting.
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Never prompt for a save directory.
    #[arg(long)]
    pub no_picker: bool,

    /// Where captures go when nothing else takes them. Defaults to the
    /// platform download directory.
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Append a `z`-spaced copy of the frame number to capture names.
    #[arg(long, default_value_t = 0)]
    pub z_spacing: usize,
}
