#![forbid(unsafe_code)]

pub mod error;
pub mod ladder;
pub mod matcher;
pub mod model;
pub mod quota;
pub mod suggest;
pub mod time;

pub use error::Error;
pub use time::{Clock, DayKey};
