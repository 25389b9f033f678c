mod playlist;
mod resolution;
mod track;

pub use playlist::{DailyPlaylist, PlaylistError, parse_cooldown};
pub use resolution::Resolution;
pub use track::{Track, TrackError, TrackKey};
