//! FFmpeg utility functions

use ffmpeg_next as ffmpeg;

/// Convert a stream timestamp to milliseconds using its timebase.
///
/// Mirrors the container arithmetic `ts * num * 1000 / den`, floored. A
/// missing timestamp maps to 0 so downstream ordering comparisons stay
/// total.
pub fn ts_to_millis(ts: Option<i64>, timebase: ffmpeg::Rational) -> i64 {
    let ts = match ts {
        Some(ts) => ts,
        None => return 0,
    };
    let num = timebase.numerator() as f64;
    let den = timebase.denominator() as f64;
    if den == 0.0 {
        return 0;
    }
    (ts as f64 * num * 1000.0 / den).floor() as i64
}

/// Total stream duration in milliseconds from its reported duration and
/// timebase. Unknown durations (negative sentinel) map to 0.
pub fn stream_duration_millis(duration: i64, timebase: ffmpeg::Rational) -> i64 {
    if duration < 0 {
        return 0;
    }
    ts_to_millis(Some(duration), timebase)
}

/// Frames per second from a stream's average frame rate rational.
pub fn rate_to_fps(rate: ffmpeg::Rational) -> f32 {
    let den = rate.denominator();
    if den == 0 {
        return 0.0;
    }
    rate.numerator() as f32 / den as f32
}
