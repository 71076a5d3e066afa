//! Discovery of case-centric process models
pub mod log_skeleton;
