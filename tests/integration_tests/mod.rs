//! End-to-end integration tests for the sync engine

pub mod sqlite_persistence;
pub mod sync_scenarios;
