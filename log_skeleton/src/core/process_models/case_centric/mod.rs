//! Case-centric process models
pub mod log_skeleton;
