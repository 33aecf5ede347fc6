//! Reshaper Integration Tests
//!
//! End-to-end behaviour of the reshaping pipeline: fixed scenarios,
//! generated round trips, and agreement between the generic and planned
//! paths.

#[path = "../common/mod.rs"]
mod common;

mod roundtrip;
