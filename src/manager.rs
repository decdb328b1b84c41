//! The public tagging entry points.

use crate::config::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tagforged_av::tools::{self, ATOMICPARSLEY, MEDIAINFO};
use tagforged_av::{
    DurationSource, MediaInfoDuration, MovieMetadata, ProcessLauncher, SystemLauncher,
    TagOutcome, Tagger, TvEpisodeMetadata,
};

/// Sets iTunes metadata on video files and reads their duration.
///
/// Tool locations are resolved once, when the manager is built, and never
/// change afterwards.
///
/// # Example
///
/// ```no_run
/// use tagforged::{config::Config, MetadataManager, TvEpisodeMetadata};
///
/// let manager = MetadataManager::from_config(&Config::default());
/// let meta = TvEpisodeMetadata::new()
///     .with_show_name("Modern Family")
///     .with_season(1)
///     .with_episode_number(24);
/// manager.set_tv_metadata("/media/show.m4v", &meta)?;
///
/// let seconds = manager.video_length_in_seconds("/media/show.m4v");
/// # Ok::<(), tagforged::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MetadataManager<L = SystemLauncher, D = MediaInfoDuration> {
    tagger: Tagger<L>,
    duration: D,
    timeout: Duration,
}

impl MetadataManager {
    /// Build a manager from configuration, resolving tool paths now.
    pub fn from_config(config: &Config) -> Self {
        let atomicparsley =
            tools::resolve_tool(ATOMICPARSLEY, config.tools.atomicparsley_path.as_deref());
        let mediainfo = tools::resolve_tool(MEDIAINFO, config.tools.mediainfo_path.as_deref());

        tracing::debug!(
            "Using AtomicParsley at {:?}, mediainfo at {:?}",
            atomicparsley,
            mediainfo
        );

        Self::with_parts(
            Tagger::new(atomicparsley),
            MediaInfoDuration::with_path(mediainfo),
            config.tagging.timeout(),
        )
    }

    /// Build a manager that runs AtomicParsley from `tool`, with defaults for
    /// everything else.
    pub fn with_tool(tool: impl Into<PathBuf>) -> Self {
        let config = Config::default();
        Self::with_parts(
            Tagger::new(tool),
            MediaInfoDuration::with_path(tools::resolve_tool(MEDIAINFO, None)),
            config.tagging.timeout(),
        )
    }
}

impl<L: ProcessLauncher, D: DurationSource> MetadataManager<L, D> {
    /// Assemble a manager from its parts.
    pub fn with_parts(tagger: Tagger<L>, duration: D, timeout: Duration) -> Self {
        Self {
            tagger,
            duration,
            timeout,
        }
    }

    /// Path of the AtomicParsley executable in use.
    pub fn tool_path(&self) -> &Path {
        self.tagger.tool_path()
    }

    /// Timeout applied when none is given.
    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    /// Write TV episode metadata into `path` using the default timeout.
    ///
    /// Returns [`TagOutcome::FileMissing`] without launching anything when
    /// `path` does not exist. Errors only if AtomicParsley cannot be started.
    pub fn set_tv_metadata(
        &self,
        path: impl AsRef<Path>,
        meta: &TvEpisodeMetadata,
    ) -> tagforged_av::Result<TagOutcome> {
        self.set_tv_metadata_with_timeout(path, meta, self.timeout)
    }

    /// Write TV episode metadata into `path`, waiting at most `timeout`.
    pub fn set_tv_metadata_with_timeout(
        &self,
        path: impl AsRef<Path>,
        meta: &TvEpisodeMetadata,
        timeout: Duration,
    ) -> tagforged_av::Result<TagOutcome> {
        self.tagger.set_tv_metadata(path.as_ref(), meta, timeout)
    }

    /// Write movie metadata into `path` using the default timeout.
    pub fn set_movie_metadata(
        &self,
        path: impl AsRef<Path>,
        meta: &MovieMetadata,
    ) -> tagforged_av::Result<TagOutcome> {
        self.set_movie_metadata_with_timeout(path, meta, self.timeout)
    }

    /// Write movie metadata into `path`, waiting at most `timeout`.
    pub fn set_movie_metadata_with_timeout(
        &self,
        path: impl AsRef<Path>,
        meta: &MovieMetadata,
        timeout: Duration,
    ) -> tagforged_av::Result<TagOutcome> {
        self.tagger.set_movie_metadata(path.as_ref(), meta, timeout)
    }

    /// Duration of the video at `path` in seconds, `0.0` if it cannot be
    /// determined.
    pub fn video_length_in_seconds(&self, path: impl AsRef<Path>) -> f64 {
        tagforged_av::video_length_in_seconds(&self.duration, path.as_ref())
    }
}
