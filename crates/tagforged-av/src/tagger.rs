//! Writing metadata into media files with AtomicParsley.
//!
//! [`Tagger`] holds the resolved tool location and a [`ProcessLauncher`].
//! Each call checks the target exists, builds the arguments and runs the
//! tool once with a bounded wait. Tagging is best effort: the tool's exit
//! status is reported back but never turned into an error.

use crate::args::{build_movie_arguments, build_tv_arguments, TagArguments};
use crate::command::{ToolCommand, ToolOutput};
use crate::metadata::{MovieMetadata, TvEpisodeMetadata};
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One fully prepared tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Path to the tagging executable.
    pub program: PathBuf,
    /// Arguments to pass, in order.
    pub arguments: TagArguments,
}

/// Runs a prepared invocation and waits for it.
///
/// The system implementation is [`SystemLauncher`]; tests substitute their
/// own to observe invocations without spawning anything.
pub trait ProcessLauncher {
    fn launch(&self, invocation: &Invocation, timeout: Duration) -> Result<ToolOutput>;
}

impl<L: ProcessLauncher + ?Sized> ProcessLauncher for &L {
    fn launch(&self, invocation: &Invocation, timeout: Duration) -> Result<ToolOutput> {
        (**self).launch(invocation, timeout)
    }
}

/// Spawns the tool as a child process via [`ToolCommand`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, invocation: &Invocation, timeout: Duration) -> Result<ToolOutput> {
        ToolCommand::new(invocation.program.clone())
            .args(invocation.arguments.to_argv())
            .timeout(timeout)
            .execute()
    }
}

/// What happened to a tagging request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// The target file does not exist; nothing was launched.
    FileMissing,
    /// The tool ran to completion. Check [`ToolOutput::success`] to see
    /// whether it reported success.
    Completed(ToolOutput),
    /// The tool did not finish in time and was terminated.
    TimedOut(ToolOutput),
}

impl TagOutcome {
    /// The tool was launched at all.
    pub fn launched(&self) -> bool {
        !matches!(self, TagOutcome::FileMissing)
    }

    /// Captured output, if the tool was launched.
    pub fn output(&self) -> Option<&ToolOutput> {
        match self {
            TagOutcome::FileMissing => None,
            TagOutcome::Completed(output) | TagOutcome::TimedOut(output) => Some(output),
        }
    }
}

/// Tags media files with AtomicParsley.
#[derive(Debug, Clone)]
pub struct Tagger<L = SystemLauncher> {
    tool: PathBuf,
    launcher: L,
}

impl Tagger<SystemLauncher> {
    /// Create a tagger that spawns the tool at `tool`.
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self::with_launcher(tool, SystemLauncher)
    }
}

impl<L: ProcessLauncher> Tagger<L> {
    /// Create a tagger with a custom launcher.
    pub fn with_launcher(tool: impl Into<PathBuf>, launcher: L) -> Self {
        Self {
            tool: tool.into(),
            launcher,
        }
    }

    /// Path of the tagging executable.
    pub fn tool_path(&self) -> &Path {
        &self.tool
    }

    /// Write TV episode metadata into `path`.
    ///
    /// A missing file is not an error: the call returns
    /// [`TagOutcome::FileMissing`] without launching anything.
    ///
    /// # Errors
    ///
    /// Returns an error only if the tool could not be launched.
    pub fn set_tv_metadata(
        &self,
        path: &Path,
        meta: &TvEpisodeMetadata,
        timeout: Duration,
    ) -> Result<TagOutcome> {
        if !target_exists(path) {
            return Ok(TagOutcome::FileMissing);
        }
        self.run(path, build_tv_arguments(path, meta), timeout)
    }

    /// Write movie metadata into `path`.
    ///
    /// Same contract as [`Tagger::set_tv_metadata`].
    pub fn set_movie_metadata(
        &self,
        path: &Path,
        meta: &MovieMetadata,
        timeout: Duration,
    ) -> Result<TagOutcome> {
        if !target_exists(path) {
            return Ok(TagOutcome::FileMissing);
        }
        self.run(path, build_movie_arguments(path, meta), timeout)
    }

    fn run(&self, path: &Path, arguments: TagArguments, timeout: Duration) -> Result<TagOutcome> {
        tracing::info!("Tagging {:?} with {:?}", path, self.tool);
        tracing::debug!("AtomicParsley arguments: {}", arguments);

        let invocation = Invocation {
            program: self.tool.clone(),
            arguments,
        };
        let output = self.launcher.launch(&invocation, timeout)?;

        if output.timed_out {
            tracing::warn!(
                "Tagging {:?} timed out after {:?} (killed: {})",
                path,
                timeout,
                output.killed
            );
            return Ok(TagOutcome::TimedOut(output));
        }

        if !output.success() {
            tracing::warn!(
                "AtomicParsley exited with {:?} for {:?}: {}",
                output.exit_code,
                path,
                output.stderr.trim()
            );
        }

        Ok(TagOutcome::Completed(output))
    }
}

fn target_exists(path: &Path) -> bool {
    if path.is_file() {
        return true;
    }
    tracing::debug!("Skipping tagging, file does not exist: {:?}", path);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{FLAG_DESCRIPTION, FLAG_STIK, FLAG_TV_EPISODE};
    use crate::Error;
    use std::cell::RefCell;
    use tempfile::NamedTempFile;

    /// Records invocations and replies with a canned result.
    struct RecordingLauncher {
        calls: RefCell<Vec<(Invocation, Duration)>>,
        reply: fn() -> Result<ToolOutput>,
    }

    impl RecordingLauncher {
        fn replying(reply: fn() -> Result<ToolOutput>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                reply,
            }
        }

        fn ok() -> Self {
            Self::replying(|| {
                Ok(ToolOutput {
                    exit_code: Some(0),
                    ..Default::default()
                })
            })
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ProcessLauncher for RecordingLauncher {
        fn launch(&self, invocation: &Invocation, timeout: Duration) -> Result<ToolOutput> {
            self.calls.borrow_mut().push((invocation.clone(), timeout));
            (self.reply)()
        }
    }

    #[test]
    fn missing_file_never_launches() {
        let launcher = RecordingLauncher::ok();
        let tagger = Tagger::with_launcher("/opt/AtomicParsley", &launcher);
        let meta = TvEpisodeMetadata::new().with_show_name("Modern Family");

        let outcome = tagger
            .set_tv_metadata(Path::new("/definitely/not/here.m4v"), &meta, Duration::from_secs(1))
            .unwrap();

        assert_eq!(outcome, TagOutcome::FileMissing);
        assert!(!outcome.launched());
        assert_eq!(launcher.call_count(), 0);

        let outcome = tagger
            .set_movie_metadata(
                Path::new("/definitely/not/here.m4v"),
                &MovieMetadata::new(),
                Duration::from_secs(1),
            )
            .unwrap();
        assert_eq!(outcome, TagOutcome::FileMissing);
        assert_eq!(launcher.call_count(), 0);
    }

    #[test]
    fn directory_is_not_a_target() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = RecordingLauncher::ok();
        let tagger = Tagger::with_launcher("/opt/AtomicParsley", &launcher);

        let outcome = tagger
            .set_movie_metadata(dir.path(), &MovieMetadata::new(), Duration::from_secs(1))
            .unwrap();
        assert_eq!(outcome, TagOutcome::FileMissing);
        assert_eq!(launcher.call_count(), 0);
    }

    #[test]
    fn existing_file_launches_once_with_built_arguments() {
        let file = NamedTempFile::new().unwrap();
        let launcher = RecordingLauncher::ok();
        let tagger = Tagger::with_launcher("/opt/AtomicParsley", &launcher);
        let meta = TvEpisodeMetadata::new()
            .with_season(2)
            .with_episode_number(7)
            .with_description("A quiet one.");

        let outcome = tagger
            .set_tv_metadata(file.path(), &meta, Duration::from_millis(1500))
            .unwrap();

        assert!(matches!(outcome, TagOutcome::Completed(ref o) if o.success()));
        let calls = launcher.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (invocation, timeout) = &calls[0];
        assert_eq!(invocation.program, PathBuf::from("/opt/AtomicParsley"));
        assert_eq!(*timeout, Duration::from_millis(1500));
        assert_eq!(invocation.arguments, build_tv_arguments(file.path(), &meta));
        assert_eq!(invocation.arguments.value_of(FLAG_TV_EPISODE), Some("27"));
        assert_eq!(
            invocation.arguments.value_of(FLAG_DESCRIPTION),
            Some("A quiet one.")
        );
    }

    #[test]
    fn movie_uses_short_film_stik() {
        let file = NamedTempFile::new().unwrap();
        let launcher = RecordingLauncher::ok();
        let tagger = Tagger::with_launcher("/opt/AtomicParsley", &launcher);

        tagger
            .set_movie_metadata(
                file.path(),
                &MovieMetadata::new().with_name("Arrival"),
                Duration::from_secs(1),
            )
            .unwrap();

        let calls = launcher.calls.borrow();
        assert_eq!(calls[0].0.arguments.value_of(FLAG_STIK), Some("Short Film"));
    }

    #[test]
    fn timeout_is_an_outcome_not_an_error() {
        let file = NamedTempFile::new().unwrap();
        let launcher = RecordingLauncher::replying(|| {
            Ok(ToolOutput {
                timed_out: true,
                killed: true,
                ..Default::default()
            })
        });
        let tagger = Tagger::with_launcher("/opt/AtomicParsley", &launcher);

        let outcome = tagger
            .set_tv_metadata(file.path(), &TvEpisodeMetadata::new(), Duration::from_millis(10))
            .unwrap();

        assert!(matches!(outcome, TagOutcome::TimedOut(ref o) if o.killed));
    }

    // Tool failures are only visible through the exit code; the call itself
    // still succeeds.
    #[test]
    fn failing_tool_still_completes() {
        let file = NamedTempFile::new().unwrap();
        let launcher = RecordingLauncher::replying(|| {
            Ok(ToolOutput {
                exit_code: Some(1),
                stderr: "AtomicParsley error: bad atom".into(),
                ..Default::default()
            })
        });
        let tagger = Tagger::with_launcher("/opt/AtomicParsley", &launcher);

        let outcome = tagger
            .set_tv_metadata(file.path(), &TvEpisodeMetadata::new(), Duration::from_secs(1))
            .unwrap();

        let output = outcome.output().unwrap();
        assert_eq!(output.exit_code, Some(1));
        assert!(!output.success());
    }

    #[test]
    fn launch_failure_is_returned() {
        let file = NamedTempFile::new().unwrap();
        let launcher =
            RecordingLauncher::replying(|| Err(Error::tool_not_found("AtomicParsley")));
        let tagger = Tagger::with_launcher("/opt/AtomicParsley", &launcher);

        let result =
            tagger.set_tv_metadata(file.path(), &TvEpisodeMetadata::new(), Duration::from_secs(1));
        assert!(matches!(result, Err(Error::ToolNotFound { .. })));
    }

    #[test]
    fn system_launcher_reports_missing_tool() {
        let file = NamedTempFile::new().unwrap();
        let tagger = Tagger::new("/nonexistent/dir/AtomicParsley");

        let result =
            tagger.set_tv_metadata(file.path(), &TvEpisodeMetadata::new(), Duration::from_secs(1));
        assert!(matches!(result, Err(Error::ToolNotFound { .. })));
    }
}
