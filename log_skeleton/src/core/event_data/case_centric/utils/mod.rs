//! Utilities for preparing case-centric event logs before discovery or checking

/// Filtering traces by required and forbidden activities
pub mod activity_filter;
/// Splitting activity labels by their direct predecessor
pub mod event_log_splitter;
