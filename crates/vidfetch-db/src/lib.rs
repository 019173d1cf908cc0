#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod repositories;
pub mod setup;

pub use repositories::SqliteHistoryRepository;

pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
