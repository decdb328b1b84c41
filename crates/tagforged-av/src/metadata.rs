//! Metadata records consumed by the argument builder.
//!
//! Every field is optional. A string that is absent, empty or only
//! whitespace, or a number that is zero, means "do not write this tag".

use serde::{Deserialize, Serialize};

/// Descriptive metadata for a single TV episode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TvEpisodeMetadata {
    pub show_name: Option<String>,
    /// Season number, 0 when unknown.
    pub show_season: u32,
    /// Content rating, conventionally a [`TvRating`].
    pub show_rating: Option<String>,
    pub show_artwork_path: Option<String>,
    pub episode_title: Option<String>,
    /// Episode number within the season, 0 when unknown.
    pub episode_number: u32,
    pub episode_description: Option<String>,
}

impl TvEpisodeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_show_name(mut self, name: impl Into<String>) -> Self {
        self.show_name = Some(name.into());
        self
    }

    pub fn with_season(mut self, season: u32) -> Self {
        self.show_season = season;
        self
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.show_rating = Some(rating.into());
        self
    }

    pub fn with_artwork(mut self, path: impl Into<String>) -> Self {
        self.show_artwork_path = Some(path.into());
        self
    }

    pub fn with_episode_title(mut self, title: impl Into<String>) -> Self {
        self.episode_title = Some(title.into());
        self
    }

    pub fn with_episode_number(mut self, number: u32) -> Self {
        self.episode_number = number;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.episode_description = Some(description.into());
        self
    }
}

/// Descriptive metadata for a movie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Genre, conventionally a [`MovieGenre`].
    pub genre: Option<String>,
    /// Release year, 0 when unknown.
    pub year: u32,
    /// Content rating, conventionally a [`MovieRating`].
    pub rating: Option<String>,
    pub artwork_path: Option<String>,
}

impl MovieMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = year;
        self
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn with_artwork(mut self, path: impl Into<String>) -> Self {
        self.artwork_path = Some(path.into());
        self
    }
}

/// Return the value only if it holds something other than whitespace.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Generates a string-backed enum with `as_str`, `ALL`, `Display`, `FromStr`
/// and `From<Enum> for String`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:tt),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The value AtomicParsley expects.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| format!("Unknown {}: {}", stringify!($name), s))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_str().to_string()
            }
        }
    };
}

string_enum! {
    /// US TV parental guideline ratings.
    TvRating {
        TvY => "TV-Y",
        TvY7 => "TV-Y7",
        TvG => "TV-G",
        TvPg => "TV-PG",
        Tv14 => "TV-14",
        TvMa => "TV-MA",
    }
}

string_enum! {
    /// MPAA movie ratings.
    MovieRating {
        G => "G",
        Pg => "PG",
        Pg13 => "PG-13",
        R => "R",
        Nc17 => "NC-17",
        Unrated => "Unrated",
    }
}

string_enum! {
    /// iTunes store movie genres.
    MovieGenre {
        ActionAdventure => "Action & Adventure",
        Anime => "Anime",
        Classics => "Classics",
        Comedy => "Comedy",
        Documentary => "Documentary",
        Drama => "Drama",
        Horror => "Horror",
        Independent => "Independent",
        KidsFamily => "Kids & Family",
        Music => "Music",
        Romance => "Romance",
        SciFiFantasy => "Sci-Fi & Fantasy",
        ShortFilms => "Short Films",
        Sports => "Sports",
        Thriller => "Thriller",
        Western => "Western",
    }
}
