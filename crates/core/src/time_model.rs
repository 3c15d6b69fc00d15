//! Time-domain math shared by the timeline renderer.
//!
//! Everything here is pure: the current wall-clock time is passed in so that
//! layouts are reproducible in tests.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::timeline::TimeBounds;

/// Minimum padding added on both sides of the raw event span.
pub const MIN_PADDING_MINUTES: i64 = 5;
/// Padding as a fraction of the raw span, when that exceeds the minimum.
pub const PADDING_RATIO: f64 = 0.1;
/// Canvas never shrinks below this width, so short cases stay readable.
pub const MIN_CANVAS_WIDTH: f64 = 800.0;
/// Baseline horizontal resolution at zoom 1.
pub const PIXELS_PER_MINUTE: f64 = 10.0;

/// Upper bound on axis ticks for a single range.
pub const MAX_TICKS: usize = 2_000;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Padded time window covered by the timeline canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
    pub duration_ms: f64,
    pub duration_minutes: f64,
}

impl TimeRange {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.earliest && t <= self.latest
    }
}

/// One axis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub time: DateTime<Utc>,
    pub x: f64,
    pub label: String,
}

/// Compute the padded range for a dataset's bounds.
///
/// A missing or unparseable bound is replaced by `now`. Reversed bounds are
/// reordered rather than producing a negative span.
pub fn time_range(bounds: &TimeBounds, now: DateTime<Utc>) -> TimeRange {
    let first = bounds
        .earliest
        .as_deref()
        .and_then(parse_event_time)
        .unwrap_or(now);
    let last = bounds
        .latest
        .as_deref()
        .and_then(parse_event_time)
        .unwrap_or(now);
    let (raw_earliest, raw_latest) = if last < first {
        (last, first)
    } else {
        (first, last)
    };

    let span_ms = (raw_latest - raw_earliest).num_milliseconds();
    let ratio_padding = (span_ms as f64 * PADDING_RATIO) as i64;
    let padding = Duration::milliseconds(ratio_padding.max(MIN_PADDING_MINUTES * 60_000));

    let earliest = raw_earliest
        .checked_sub_signed(padding)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let latest = raw_latest
        .checked_add_signed(padding)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let duration_ms = (latest - earliest).num_milliseconds() as f64;

    TimeRange {
        earliest,
        latest,
        duration_ms,
        duration_minutes: duration_ms / MS_PER_MINUTE,
    }
}

/// Map an absolute time onto the canvas. Results outside `[0, canvas_width]`
/// mean the time is clipped.
pub fn to_pixel(t: DateTime<Utc>, range: &TimeRange, canvas_width: f64) -> f64 {
    let offset_ms = (t - range.earliest).num_milliseconds() as f64;
    offset_ms / range.duration_ms * canvas_width
}

/// Inverse of [`to_pixel`], used for hit-testing and hover labels.
pub fn from_pixel(x: f64, range: &TimeRange, canvas_width: f64) -> DateTime<Utc> {
    let offset_ms = (x / canvas_width * range.duration_ms).round() as i64;
    range.earliest + Duration::milliseconds(offset_ms)
}

/// True when a pixel position lands on the drawable canvas.
pub fn is_on_canvas(x: f64, canvas_width: f64) -> bool {
    x.is_finite() && (0.0..=canvas_width).contains(&x)
}

pub fn canvas_width(range: &TimeRange, zoom: f64) -> f64 {
    (range.duration_minutes * PIXELS_PER_MINUTE * zoom).max(MIN_CANVAS_WIDTH)
}

/// Tick spacing in minutes for a window of `duration_minutes`.
pub fn tick_interval(duration_minutes: f64) -> u32 {
    if duration_minutes <= 30.0 {
        5
    } else if duration_minutes <= 120.0 {
        15
    } else if duration_minutes <= 480.0 {
        60
    } else {
        240
    }
}

/// Axis ticks on interval boundaries (epoch-aligned) inside the range.
///
/// Spans too long for the largest interval get a multiple of it, so at most
/// [`MAX_TICKS`] ticks are produced.
pub fn ticks(range: &TimeRange, canvas_width: f64) -> Vec<Tick> {
    let start_ms = range.earliest.timestamp_millis();
    let end_ms = range.latest.timestamp_millis();
    let base_ms = i64::from(tick_interval(range.duration_minutes)) * 60_000;
    let steps = (end_ms - start_ms) / base_ms + 1;
    let step_ms = base_ms * (steps / MAX_TICKS as i64 + 1);

    let mut tick_ms = start_ms.div_euclid(step_ms) * step_ms;
    if tick_ms < start_ms {
        tick_ms += step_ms;
    }

    let mut out = Vec::new();
    while tick_ms <= end_ms {
        if let Some(time) = DateTime::<Utc>::from_timestamp_millis(tick_ms) {
            out.push(Tick {
                time,
                x: to_pixel(time, range, canvas_width),
                label: time.format("%H:%M").to_string(),
            });
        }
        tick_ms += step_ms;
    }
    out
}

/// Lenient timestamp parsing: RFC 3339, or a naive ISO-like string read as UTC.
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
