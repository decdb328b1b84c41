//! Video duration lookup.
//!
//! Durations come back from the source as text in 100-nanosecond units
//! (10,000,000 per second) and are converted to seconds here. Lookup is
//! best effort: any failure reads as a zero-length file.

use crate::command::ToolCommand;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const HUNDRED_NS_PER_SECOND: f64 = 10_000_000.0;

/// Timeout for a single mediainfo query.
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// A read-only lookup of a file's media duration.
pub trait DurationSource {
    /// Return the duration of `path` in 100 ns units, as text.
    fn raw_duration(&self, path: &Path) -> Result<String>;
}

impl<S: DurationSource + ?Sized> DurationSource for &S {
    fn raw_duration(&self, path: &Path) -> Result<String> {
        (**self).raw_duration(path)
    }
}

/// Convert a duration in 100 ns units to seconds.
///
/// ```
/// assert_eq!(tagforged_av::hundred_ns_to_seconds(36_000_000_000.0), 3600.0);
/// ```
pub fn hundred_ns_to_seconds(raw: f64) -> f64 {
    (raw * 0.0001) / 1000.0
}

/// Length of the video at `path` in seconds, or `0.0` if the source fails
/// or returns something that is not a finite number.
pub fn video_length_in_seconds<S: DurationSource + ?Sized>(source: &S, path: &Path) -> f64 {
    let raw = match source.raw_duration(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!("Duration lookup failed for {:?}: {}", path, e);
            return 0.0;
        }
    };

    match raw.trim().parse::<f64>() {
        Ok(units) if units.is_finite() => hundred_ns_to_seconds(units),
        Ok(units) => {
            tracing::debug!("Non-finite duration {} for {:?}", units, path);
            0.0
        }
        Err(e) => {
            tracing::debug!("Unparseable duration {:?} for {:?}: {}", raw, path, e);
            0.0
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaInfoOutput {
    media: Option<MediaInfoMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoMedia {
    #[serde(default)]
    track: Vec<MediaInfoTrack>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoTrack {
    #[serde(rename = "@type")]
    track_type: String,
    /// Seconds, as a decimal string.
    #[serde(rename = "Duration")]
    duration: Option<String>,
}

/// Reads durations with the `mediainfo` CLI.
#[derive(Debug, Clone)]
pub struct MediaInfoDuration {
    program: PathBuf,
}

impl MediaInfoDuration {
    /// Use `mediainfo` from `PATH`.
    pub fn new() -> Self {
        Self::with_path(crate::tools::MEDIAINFO)
    }

    /// Use the mediainfo executable at `program`.
    pub fn with_path(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MediaInfoDuration {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationSource for MediaInfoDuration {
    fn raw_duration(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(Error::file_not_found(path));
        }

        let output = ToolCommand::new(self.program.clone())
            .arg("--Output=JSON")
            .arg(path)
            .timeout(QUERY_TIMEOUT)
            .execute()?;

        if !output.success() {
            return Err(Error::tool_failed("mediainfo", output.stderr.trim()));
        }

        let seconds = parse_general_duration(&output.stdout)?;
        Ok(format!("{:.0}", seconds * HUNDRED_NS_PER_SECOND))
    }
}

/// Pull the General track duration, in seconds, out of mediainfo JSON.
fn parse_general_duration(json: &str) -> Result<f64> {
    let parsed: MediaInfoOutput = serde_json::from_str(json)?;

    let duration = parsed
        .media
        .into_iter()
        .flat_map(|m| m.track)
        .find(|t| t.track_type == "General")
        .and_then(|t| t.duration)
        .ok_or_else(|| Error::parse_error("mediainfo", "no General track duration"))?;

    duration
        .trim()
        .parse::<f64>()
        .map_err(|e| Error::parse_error("mediainfo", format!("bad duration {duration:?}: {e}")))
}
