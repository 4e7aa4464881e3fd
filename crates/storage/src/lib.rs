//! Storage abstraction and implementations for the exam sweep.
//!
//! This crate provides a trait-based storage interface with a SQLite
//! implementation holding both the audited content and the sweep records.

#![warn(missing_docs)]

pub mod sqlite_storage;
pub mod trait_;

pub use sqlite_storage::SqliteStorage;
pub use trait_::{Result, ReviewUpdate, Storage, StorageError};
