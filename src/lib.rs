//! Tagforged - iTunes metadata tagging for TV episodes and movies
//!
//! Wraps AtomicParsley behind a small blocking API: build the argument list
//! for a metadata record, run the tool with a bounded wait, and look up a
//! video's duration.

pub mod config;
mod manager;

pub use manager::MetadataManager;
pub use tagforged_av::{
    build_movie_arguments, build_tv_arguments, episode_summary, hundred_ns_to_seconds,
    DurationSource, Error, Invocation, MediaInfoDuration, MovieGenre, MovieMetadata, MovieRating,
    ProcessLauncher, Result, SystemLauncher, TagArguments, TagOutcome, Tagger, ToolOutput,
    TvEpisodeMetadata, TvRating, DEFAULT_TIMEOUT,
};
