use thiserror::Error;

use crate::ladder::LadderError;
use crate::model::{PlaylistError, TrackError};
use crate::quota::ProgressError;
use crate::time::DayKeyError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
    #[error(transparent)]
    Ladder(#[from] LadderError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    DayKey(#[from] DayKeyError),
}
