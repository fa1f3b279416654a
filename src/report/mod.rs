//! # Reporting Module
//!
//! Consumers of the ingestion output: category summaries, combined filters,
//! timelines and CSV exports. None of them fail on an empty dataset or on
//! columns no file provided.
pub mod export;
pub mod filter;
pub mod summary;
pub mod timeline;
