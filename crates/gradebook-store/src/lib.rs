//! gradebook-store: SQLite persistence for gradebook.
//!
//! Implements the `PersistenceGateway` trait on a single SQLite file with a
//! base table plus one detail table per evaluation kind, and loads the
//! `gradebook.toml` configuration that says where that file lives.

pub mod config;
mod error;
mod migrations;
pub mod sqlite;

pub use config::{load_config_from, GradebookConfig, DATABASE_ENV};
pub use sqlite::SqliteGateway;
