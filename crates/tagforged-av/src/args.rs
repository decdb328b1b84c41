//! AtomicParsley argument building.
//!
//! Turns a metadata record and a target file into the ordered flag list
//! AtomicParsley expects. Absent fields are left out entirely; the
//! `--overWrite` switch is always present so the file is tagged in place.
//!
//! Values are quoted in [`TagArguments::to_command_line`] without escaping,
//! so they must not contain a double quote. [`TagArguments::to_argv`] hands
//! the same tokens to the process directly and has no such restriction.

use crate::metadata::{non_blank, MovieMetadata, TvEpisodeMetadata};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Longest episode summary written before it is cut and given an ellipsis.
pub const MAX_SUMMARY_CHARS: usize = 250;

const ELLIPSIS: &str = "...";

pub const FLAG_GENRE: &str = "--genre";
pub const FLAG_STIK: &str = "--stik";
pub const FLAG_OVERWRITE: &str = "--overWrite";
pub const FLAG_TV_SHOW_NAME: &str = "--TVShowName";
pub const FLAG_ARTIST: &str = "--artist";
pub const FLAG_TV_EPISODE: &str = "--TVEpisode";
pub const FLAG_TV_EPISODE_NUM: &str = "--TVEpisodeNum";
pub const FLAG_TV_SEASON_NUM: &str = "--TVSeasonNum";
pub const FLAG_TITLE: &str = "--title";
pub const FLAG_YEAR: &str = "--year";
pub const FLAG_DESCRIPTION: &str = "--description";
pub const FLAG_ARTWORK: &str = "--artwork";
pub const FLAG_CONTENT_RATING: &str = "--contentRating";

const TV_GENRE: &str = "TV Shows";
const STIK_TV_SHOW: &str = "TV Show";
const STIK_SHORT_FILM: &str = "Short Film";

/// A single token group on the AtomicParsley command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagArg {
    /// The file being tagged. Always the first argument.
    File(PathBuf),
    /// A flag followed by its value, e.g. `--title "Pilot"`.
    Pair { flag: &'static str, value: String },
    /// A flag without a value, e.g. `--overWrite`.
    Switch(&'static str),
}

/// Ordered AtomicParsley arguments for one tagging call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagArguments {
    args: Vec<TagArg>,
}

impl TagArguments {
    fn for_file(path: &Path) -> Self {
        Self {
            args: vec![TagArg::File(path.to_path_buf())],
        }
    }

    fn pair(&mut self, flag: &'static str, value: impl Into<String>) -> &mut Self {
        self.args.push(TagArg::Pair {
            flag,
            value: value.into(),
        });
        self
    }

    fn switch(&mut self, flag: &'static str) -> &mut Self {
        self.args.push(TagArg::Switch(flag));
        self
    }

    fn pair_if_present(&mut self, flag: &'static str, value: &Option<String>) -> &mut Self {
        if let Some(v) = non_blank(value) {
            self.pair(flag, v);
        }
        self
    }

    /// The argument groups in emission order.
    pub fn as_slice(&self) -> &[TagArg] {
        &self.args
    }

    /// Value of the first occurrence of `flag`, if emitted.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args.iter().find_map(|a| match a {
            TagArg::Pair { flag: f, value } if *f == flag => Some(value.as_str()),
            _ => None,
        })
    }

    /// Whether `flag` was emitted, with or without a value.
    pub fn contains_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| match a {
            TagArg::Pair { flag: f, .. } => *f == flag,
            TagArg::Switch(f) => *f == flag,
            TagArg::File(_) => false,
        })
    }

    /// Flags in emission order, without their values.
    pub fn flags(&self) -> Vec<&'static str> {
        self.args
            .iter()
            .filter_map(|a| match a {
                TagArg::Pair { flag, .. } => Some(*flag),
                TagArg::Switch(flag) => Some(*flag),
                TagArg::File(_) => None,
            })
            .collect()
    }

    /// Render as one command-line string with every value double-quoted.
    pub fn to_command_line(&self) -> String {
        let parts: Vec<String> = self
            .args
            .iter()
            .map(|a| match a {
                TagArg::File(path) => format!("\"{}\"", path.display()),
                TagArg::Pair { flag, value } => format!("{flag} \"{value}\""),
                TagArg::Switch(flag) => (*flag).to_string(),
            })
            .collect();
        parts.join(" ")
    }

    /// Tokens for spawning the tool directly, without a shell.
    pub fn to_argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() * 2);
        for arg in &self.args {
            match arg {
                TagArg::File(path) => argv.push(path.as_os_str().to_os_string()),
                TagArg::Pair { flag, value } => {
                    argv.push(OsString::from(flag));
                    argv.push(OsString::from(value));
                }
                TagArg::Switch(flag) => argv.push(OsString::from(flag)),
            }
        }
        argv
    }
}

impl fmt::Display for TagArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_line())
    }
}

/// Prepare an episode description for the `--description` atom.
///
/// Blank input yields an empty string. Input of up to
/// [`MAX_SUMMARY_CHARS`] characters is returned unchanged; anything longer
/// is cut to that many characters, stripped of trailing whitespace and
/// suffixed with `...`.
///
/// ```
/// use tagforged_av::episode_summary;
///
/// assert_eq!(episode_summary("Short and sweet."), "Short and sweet.");
///
/// let long = "a".repeat(300);
/// let summary = episode_summary(&long);
/// assert_eq!(summary.chars().count(), 253);
/// assert!(summary.ends_with("..."));
/// ```
pub fn episode_summary(summary: &str) -> String {
    if summary.trim().is_empty() {
        return String::new();
    }

    match summary.char_indices().nth(MAX_SUMMARY_CHARS) {
        None => summary.to_string(),
        Some((cut, _)) => {
            let mut short = summary[..cut].trim_end().to_string();
            short.push_str(ELLIPSIS);
            short
        }
    }
}

/// Build AtomicParsley arguments for a TV episode.
///
/// `--TVEpisode` is keyed off the episode number alone. Its value is the
/// season followed by the episode with no separator, and the season part is
/// empty when the season is unknown, so season 0 episode 5 writes `"5"`.
pub fn build_tv_arguments(path: &Path, meta: &TvEpisodeMetadata) -> TagArguments {
    let mut args = TagArguments::for_file(path);
    args.pair(FLAG_GENRE, TV_GENRE)
        .pair(FLAG_STIK, STIK_TV_SHOW)
        .switch(FLAG_OVERWRITE);

    if let Some(show) = non_blank(&meta.show_name) {
        args.pair(FLAG_TV_SHOW_NAME, show).pair(FLAG_ARTIST, show);
    }

    if meta.episode_number > 0 {
        let season = if meta.show_season > 0 {
            meta.show_season.to_string()
        } else {
            String::new()
        };
        args.pair(FLAG_TV_EPISODE, format!("{season}{}", meta.episode_number))
            .pair(FLAG_TV_EPISODE_NUM, meta.episode_number.to_string());
    }

    if meta.show_season > 0 {
        args.pair(FLAG_TV_SEASON_NUM, meta.show_season.to_string());
    }

    args.pair_if_present(FLAG_TITLE, &meta.episode_title);

    if let Some(description) = non_blank(&meta.episode_description) {
        args.pair(FLAG_DESCRIPTION, episode_summary(description));
    }

    args.pair_if_present(FLAG_ARTWORK, &meta.show_artwork_path)
        .pair_if_present(FLAG_CONTENT_RATING, &meta.show_rating);

    args
}

/// Build AtomicParsley arguments for a movie.
///
/// Unlike the TV path, the description is written as given, never shortened.
pub fn build_movie_arguments(path: &Path, meta: &MovieMetadata) -> TagArguments {
    let mut args = TagArguments::for_file(path);
    args.pair(FLAG_STIK, STIK_SHORT_FILM)
        .switch(FLAG_OVERWRITE)
        .pair_if_present(FLAG_TITLE, &meta.name);

    if meta.year > 0 {
        args.pair(FLAG_YEAR, meta.year.to_string());
    }

    args.pair_if_present(FLAG_GENRE, &meta.genre)
        .pair_if_present(FLAG_DESCRIPTION, &meta.description)
        .pair_if_present(FLAG_ARTWORK, &meta.artwork_path)
        .pair_if_present(FLAG_CONTENT_RATING, &meta.rating);

    args
}
