//! mastery-core: Curriculum catalog, answer stores, and the progress engine.
//!
//! This crate defines the data model, the three keyed stores, and the
//! ingestion pipeline that keeps question statistics, subtopic aggregates,
//! and per-student progress consistent with each other.

pub mod aggregate_store;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod mock;
pub mod model;
pub mod pipeline;
pub mod progress_store;
pub mod question_store;
pub mod report;
pub mod runner;
pub mod snapshot;
pub mod statistics;
pub mod traits;
