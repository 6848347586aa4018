//! MoodMix recommendation server library.
//!
//! Exposes the recommendation pipeline, its upstream clients and the HTTP
//! surface so they can be exercised by integration tests.

pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod history;
pub mod llm;
pub mod recommendation;
pub mod server;
pub mod sqlite_persistence;
