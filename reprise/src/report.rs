//! # Report Module - Human-Readable Statistics
//!
//! Statistics leave the tracker as plain-text lines pushed into a [`ReportSink`]: the entry
//! table followed by the cumulative totals, once for every closed interval and once for every
//! peek.
//!
//! ```text
//! Seg#  State             Start(s)     Stop(s)  Duration(s)
//!    1  COMPLETED             0.00        8.45         8.45
//! Viewed exactly once: 13.68 s (12.85%)
//! Viewed exactly twice: 4.95 s (4.65%)
//! ...
//! ```

use derive_more::Deref;

use crate::Seconds;
use crate::entry::ViewEntry;
use crate::tally::Coverage;

/// Destination of report lines
pub trait ReportSink {
    fn emit(&mut self, line: &str);
}

/// Collects lines in memory
impl ReportSink for Vec<String> {
    fn emit(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn emit(&mut self, line: &str) {
        (**self).emit(line);
    }
}

/// Forwards every line to `log::info!`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn emit(&mut self, line: &str) {
        log::info!("{line}");
    }
}

/// Coverage of a viewing session measured against the media duration
#[derive(Debug, Clone, PartialEq, Deref)]
pub struct ViewingSummary {
    #[deref]
    coverage: Coverage,
    media_duration: Seconds,
    anomalies: usize,
}

impl ViewingSummary {
    pub const fn new(coverage: Coverage, media_duration: Seconds, anomalies: usize) -> Self {
        Self {
            coverage,
            media_duration,
            anomalies,
        }
    }

    pub const fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    pub const fn media_duration(&self) -> Seconds {
        self.media_duration
    }

    /// Number of intervals whose stop time was clamped because the clock ran backwards
    pub const fn anomalies(&self) -> usize {
        self.anomalies
    }

    /// `seconds` as a percentage of the media duration
    pub fn percent(&self, seconds: Seconds) -> Option<f64> {
        percent_of(seconds, self.media_duration)
    }
}

/// `seconds` as a percentage of `duration`, `None` if the duration is zero, negative or not
/// finite
pub fn percent_of(seconds: Seconds, duration: Seconds) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then(|| seconds / duration * 100.0)
}

pub fn format_seconds(seconds: Seconds, precision: usize) -> String {
    format!("{seconds:.precision$}")
}

pub fn format_percent(percent: Option<f64>, precision: usize) -> String {
    percent.map_or_else(|| "n/a".to_string(), |value| format!("{value:.precision$}%"))
}

pub fn entry_header() -> String {
    format!(
        "{:>4}  {:<14} {:>11} {:>11} {:>12}",
        "Seg#", "State", "Start(s)", "Stop(s)", "Duration(s)"
    )
}

pub fn entry_row(entry: &ViewEntry, precision: usize) -> String {
    let tbd = || "[TBD]".to_string();
    let stop = entry
        .stop_time()
        .map_or_else(tbd, |stop| format_seconds(stop, precision));
    let mut duration = entry
        .duration()
        .map_or_else(tbd, |duration| format_seconds(duration, precision));
    if entry.has_clock_anomaly() {
        duration.push('*');
    }

    format!(
        "{:>4}  {:<14} {:>11} {:>11} {:>12}",
        entry.id(),
        entry.state().to_string(),
        format_seconds(entry.start_time(), precision),
        stop,
        duration
    )
}

pub fn summary_lines(summary: &ViewingSummary, precision: usize) -> Vec<String> {
    let line = |label: &str, seconds: Seconds| {
        format!(
            "{label}: {} s ({})",
            format_seconds(seconds, precision),
            format_percent(summary.percent(seconds), precision)
        )
    };

    let mut lines = vec![
        line("Viewed exactly once", summary.viewed_once()),
        line("Viewed exactly twice", summary.viewed_twice()),
        line("Viewed three times or more", summary.viewed_three_plus()),
        line("Viewed one time or more", summary.one_or_more()),
        line("Viewed two times or more", summary.two_or_more()),
    ];

    let duration = summary.media_duration();
    lines.push(if duration.is_finite() && duration > 0.0 {
        format!("Media duration: {} s", format_seconds(duration, precision))
    } else {
        "Media duration: n/a".to_string()
    });

    if summary.anomalies() > 0 {
        lines.push(format!(
            "Clock anomalies: {} interval(s) clamped to zero duration",
            summary.anomalies()
        ));
    }

    lines
}

pub fn write_table<S: ReportSink + ?Sized>(sink: &mut S, entries: &[ViewEntry], precision: usize) {
    sink.emit(&entry_header());
    for entry in entries {
        sink.emit(&entry_row(entry, precision));
    }
}

pub fn write_summary<S: ReportSink + ?Sized>(
    sink: &mut S,
    summary: &ViewingSummary,
    precision: usize,
) {
    for line in summary_lines(summary, precision) {
        sink.emit(&line);
    }
}
