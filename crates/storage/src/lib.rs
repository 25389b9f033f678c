#![forbid(unsafe_code)]

pub mod layout;
pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryKeyValueStore, KeyValueStore, ProgressRepository, ProgressStore, Storage,
    StorageError,
};
