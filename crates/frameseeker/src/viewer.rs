use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use frameseeker_core::convert::{format_timestamp, parse_numeric};
use frameseeker_core::session::Session;

use crate::report_capture;
use crate::state::SavedState;

const HELP: &str = "commands: n [k] next frame, p [k] previous frame, \
+S / -S skip seconds, f N jump to frame, t S seek to time, r FPS set framerate, \
c capture, s status, q quit";

/// One line of input in the interactive viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewCommand {
    Step(i64),
    Skip(f64),
    Frame(f64),
    Time(f64),
    Rate(f64),
    Capture,
    Status,
    Quit,
}

pub fn parse_command(line: &str) -> Option<ViewCommand> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix('+') {
        return rest.trim().parse().ok().map(ViewCommand::Skip);
    }
    if let Some(rest) = line.strip_prefix('-') {
        return rest.trim().parse::<f64>().ok().map(|s| ViewCommand::Skip(-s));
    }

    let mut parts = line.split_whitespace();
    let cmd = parts.next()?;
    let arg = parts.next();
    let count = || arg.map_or(Some(1), |a| a.parse::<i64>().ok());

    match cmd {
        "n" | "next" => count().map(ViewCommand::Step),
        "p" | "prev" => count().and_then(i64::checked_neg).map(ViewCommand::Step),
        // Frame input is clamped later, so garbage becomes NaN rather than rejected.
        "f" | "frame" => arg.map(|a| ViewCommand::Frame(parse_numeric(a))),
        "t" | "time" => arg.and_then(|a| a.parse().ok()).map(ViewCommand::Time),
        "r" | "rate" => arg.map(|a| ViewCommand::Rate(parse_numeric(a))),
        "c" | "capture" => Some(ViewCommand::Capture),
        "s" | "status" => Some(ViewCommand::Status),
        "q" | "quit" | "exit" => Some(ViewCommand::Quit),
        _ => None,
    }
}

/// Run the interactive loop until `q` or end of input.
pub fn run(session: &mut Session, saved: &mut SavedState) -> Result<()> {
    eprintln!("{HELP}");
    print_status(session);

    loop {
        eprint!("> ");
        io::stderr().flush().context("failed to flush prompt")?;

        let mut line = String::new();
        let read = io::stdin()
            .read_line(&mut line)
            .context("failed to read command")?;
        if read == 0 {
            break;
        }

        let Some(command) = parse_command(&line) else {
            if !line.trim().is_empty() {
                eprintln!("{HELP}");
            }
            continue;
        };

        match command {
            ViewCommand::Step(k) => {
                session.step_frames(k);
            }
            ViewCommand::Skip(s) => {
                session.skip_seconds(s);
            }
            ViewCommand::Frame(f) => {
                session.jump_to_frame(f);
            }
            ViewCommand::Time(t) => {
                session.seek_to_time(t);
            }
            ViewCommand::Rate(fps) => {
                if session.set_framerate(fps) {
                    saved.set_framerate(fps)?;
                } else {
                    warn!(fps, "framerate must be a positive number");
                }
            }
            ViewCommand::Capture => match session.capture() {
                Ok(outcome) => report_capture(&outcome),
                Err(e) => warn!(error = %e, "capture failed"),
            },
            ViewCommand::Status => {}
            ViewCommand::Quit => break,
        }

        if let Some(bookmark) = session.bookmark() {
            saved.set_bookmark(&bookmark)?;
        }
        print_status(session);
    }

    info!("viewer closed");
    Ok(())
}

fn print_status(session: &Session) {
    let position = session.position();
    let use_hours = position.duration.is_some_and(|d| d >= 3600.0);
    let total = position
        .duration
        .map_or_else(|| "--:--".to_string(), |d| format_timestamp(d, use_hours));
    let max = session
        .max_frame()
        .map_or_else(|| "?".to_string(), |m| m.to_string());

    println!(
        "{} / {}  frame {} / {}  @ {} fps",
        format_timestamp(position.current_time, use_hours),
        total,
        session.current_frame(),
        max,
        session.framerate(),
    );
}
