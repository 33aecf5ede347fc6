//! Engine Integration Tests
//!
//! `Database` over a recording driver, and over SQLite when the `sqlite`
//! feature is enabled.

#[path = "../common/mod.rs"]
mod common;

mod database;
