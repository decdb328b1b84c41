//! # tagforged-av
//!
//! iTunes-style metadata tagging for MP4/M4V files via AtomicParsley, and
//! video duration lookup.
//!
//! This crate provides:
//! - Metadata records for TV episodes and movies
//! - Building the AtomicParsley command line for a record
//! - Running the tool with a bounded wait, killing it if it hangs
//! - Looking up a video's duration in seconds
//!
//! ## Example
//!
//! ```no_run
//! use tagforged_av::{Tagger, TvEpisodeMetadata, TvRating, DEFAULT_TIMEOUT};
//! use std::path::Path;
//!
//! let tagger = Tagger::new("/opt/tagforged/AtomicParsley");
//! let meta = TvEpisodeMetadata::new()
//!     .with_show_name("Modern Family")
//!     .with_season(1)
//!     .with_episode_number(24)
//!     .with_episode_title("Family Portrait")
//!     .with_rating(TvRating::TvPg);
//!
//! let outcome = tagger.set_tv_metadata(Path::new("/media/show.m4v"), &meta, DEFAULT_TIMEOUT)?;
//! println!("launched: {}", outcome.launched());
//! # Ok::<(), tagforged_av::Error>(())
//! ```

pub mod args;
pub mod command;
pub mod duration;
mod error;
pub mod metadata;
pub mod tagger;
pub mod tools;

// Re-exports
pub use args::{build_movie_arguments, build_tv_arguments, episode_summary, TagArg, TagArguments};
pub use command::{ToolCommand, ToolOutput, DEFAULT_TIMEOUT};
pub use duration::{hundred_ns_to_seconds, video_length_in_seconds, DurationSource, MediaInfoDuration};
pub use error::{Error, Result};
pub use metadata::{MovieGenre, MovieMetadata, MovieRating, TvEpisodeMetadata, TvRating};
pub use tagger::{Invocation, ProcessLauncher, SystemLauncher, TagOutcome, Tagger};
pub use tools::{check_tool, require_tool, resolve_tool, ToolInfo};
