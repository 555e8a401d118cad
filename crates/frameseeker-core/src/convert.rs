//! Conversions between playback time and frame indices.
//!
//! Every function here is total: unknown, non-finite or non-positive inputs
//! degrade to fallbacks instead of failing.

/// Framerate used whenever the selected one is unset or unusable.
pub const DEFAULT_FRAMERATE: f64 = 30.0;

/// Filename padding width when the maximum frame index is unknown.
pub const FALLBACK_PADDING: usize = 4;

/// Upper bound for frame requests when the media duration is unknown.
pub const FALLBACK_MAX_FRAME: u64 = 9999;

/// Absorbs float error in `time * framerate` so that a time produced by
/// [`time_for_frame`] maps back onto the same frame.
const FRAME_EPSILON: f64 = 1e-6;

/// Return `framerate` if it is usable, otherwise [`DEFAULT_FRAMERATE`].
pub fn effective_framerate(framerate: f64) -> f64 {
    if framerate.is_finite() && framerate > 0.0 {
        framerate
    } else {
        DEFAULT_FRAMERATE
    }
}

/// Frame index shown at `time` seconds: `floor(time * framerate)`.
pub fn frame_index_at(time: f64, framerate: f64) -> u64 {
    if !time.is_finite() || time <= 0.0 {
        return 0;
    }
    (time * effective_framerate(framerate) + FRAME_EPSILON).floor() as u64
}

/// Start time of `frame_index` in seconds. Callers clamp to the media duration.
pub fn time_for_frame(frame_index: u64, framerate: f64) -> f64 {
    (frame_index as f64 / effective_framerate(framerate)).max(0.0)
}

/// Length of one frame in seconds.
pub fn frame_duration(framerate: f64) -> f64 {
    1.0 / effective_framerate(framerate)
}

/// Highest frame index of a media of `duration` seconds.
///
/// Returns `None` while the duration or framerate is unknown so callers can
/// fall back to [`FALLBACK_PADDING`] / [`FALLBACK_MAX_FRAME`].
pub fn max_frame_index(duration: Option<f64>, framerate: f64) -> Option<u64> {
    let duration = duration.filter(|d| d.is_finite() && *d > 0.0)?;
    if !framerate.is_finite() || framerate <= 0.0 {
        return None;
    }
    Some(((duration * framerate).round() as u64).max(1))
}

/// Number of digits used for frame indices in capture filenames.
pub fn padding_width(duration: Option<f64>, framerate: f64) -> usize {
    max_frame_index(duration, framerate)
        .map(|max| max.to_string().len())
        .unwrap_or(FALLBACK_PADDING)
}

/// Clamp a user-entered frame number into `[0, max_frame]`.
///
/// NaN and negative requests resolve to frame 0, fractional ones are floored.
pub fn clamp_frame_request(raw: f64, max_frame: Option<u64>) -> u64 {
    let max = max_frame.unwrap_or(FALLBACK_MAX_FRAME);
    if raw.is_nan() || raw <= 0.0 {
        return 0;
    }
    if raw >= max as f64 {
        return max;
    }
    raw.floor() as u64
}

/// Parse free-form numeric input. Anything unparseable becomes NaN.
pub fn parse_numeric(input: &str) -> f64 {
    input.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Format seconds as `mm:ss`, or `hh:mm:ss` once hours are involved.
pub fn format_timestamp(seconds: f64, force_hours: bool) -> String {
    if !seconds.is_finite() {
        return if force_hours { "00:00:00" } else { "00:00" }.to_string();
    }
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if force_hours || hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_zero_at_time_zero() {
        for fr in [1.0, 23.976, 25.0, 29.97, 30.0, 60.0, 120.0] {
            assert_eq!(frame_index_at(0.0, fr), 0);
        }
    }

    #[test]
    fn frame_index_floors() {
        assert_eq!(frame_index_at(1.04, 25.0), 26);
        assert_eq!(frame_index_at(1.0 / 30.0 * 2.5, 30.0), 2);
        assert_eq!(frame_index_at(9.999, 30.0), 299);
    }

    #[test]
    fn unusable_framerate_falls_back_to_default() {
        assert_eq!(frame_index_at(1.0, 0.0), 30);
        assert_eq!(frame_index_at(1.0, -12.0), 30);
        assert_eq!(frame_index_at(1.0, f64::NAN), 30);
        assert!((time_for_frame(15, 0.0) - 0.5).abs() < 1e-12);
        assert!((frame_duration(f64::INFINITY) - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_time_maps_to_first_frame() {
        assert_eq!(frame_index_at(-3.0, 30.0), 0);
        assert_eq!(frame_index_at(f64::NAN, 30.0), 0);
        assert_eq!(frame_index_at(f64::INFINITY, 30.0), 0);
    }

    #[test]
    fn round_trip_stays_within_one_frame() {
        for fr in [12.0, 23.976, 25.0, 30.0, 59.94, 60.0] {
            let mut t = 0.0;
            while t < 20.0 {
                let back = time_for_frame(frame_index_at(t, fr), fr);
                assert!(back <= t + 1.0 / fr, "fr={fr} t={t} back={back}");
                t += 0.0137;
            }
        }
    }

    #[test]
    fn frame_start_maps_back_to_same_frame() {
        for fr in [23.976, 25.0, 29.97, 30.0, 60.0] {
            for frame in 0..2000 {
                assert_eq!(frame_index_at(time_for_frame(frame, fr), fr), frame, "fr={fr}");
            }
        }
    }

    #[test]
    fn max_frame_index_is_monotonic_in_duration() {
        let mut prev = 0;
        let mut d = 0.01;
        while d < 120.0 {
            let max = max_frame_index(Some(d), 29.97).unwrap();
            assert!(max >= prev);
            prev = max;
            d += 0.173;
        }
    }

    #[test]
    fn max_frame_index_has_floor_of_one() {
        assert_eq!(max_frame_index(Some(0.001), 30.0), Some(1));
        assert_eq!(max_frame_index(Some(10.0), 30.0), Some(300));
    }

    #[test]
    fn max_frame_index_unknown_inputs() {
        assert_eq!(max_frame_index(None, 30.0), None);
        assert_eq!(max_frame_index(Some(f64::NAN), 30.0), None);
        assert_eq!(max_frame_index(Some(0.0), 30.0), None);
        assert_eq!(max_frame_index(Some(10.0), 0.0), None);
    }

    #[test]
    fn padding_follows_digit_count() {
        assert_eq!(padding_width(Some(10.0), 30.0), 3);
        assert_eq!(padding_width(Some(400.0), 30.0), 5);
        assert_eq!(padding_width(Some(0.1), 30.0), 1);
        assert_eq!(padding_width(None, 30.0), FALLBACK_PADDING);
    }

    #[test]
    fn frame_requests_are_clamped() {
        assert_eq!(clamp_frame_request(-5.0, Some(300)), 0);
        assert_eq!(clamp_frame_request(10000.0, Some(300)), 300);
        assert_eq!(clamp_frame_request(f64::NAN, Some(300)), 0);
        assert_eq!(clamp_frame_request(47.9, Some(300)), 47);
        assert_eq!(clamp_frame_request(f64::INFINITY, None), FALLBACK_MAX_FRAME);
    }

    #[test]
    fn parse_numeric_rejects_garbage() {
        assert_eq!(parse_numeric(" 47 "), 47.0);
        assert_eq!(parse_numeric("-5"), -5.0);
        assert!(parse_numeric("abc").is_nan());
        assert!(parse_numeric("").is_nan());
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0, false), "00:00");
        assert_eq!(format_timestamp(75.9, false), "01:15");
        assert_eq!(format_timestamp(75.9, true), "00:01:15");
        assert_eq!(format_timestamp(3725.0, false), "01:02:05");
        assert_eq!(format_timestamp(f64::NAN, false), "00:00");
        assert_eq!(format_timestamp(f64::NAN, true), "00:00:00");
    }
}
