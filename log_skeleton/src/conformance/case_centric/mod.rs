//! Conformance checking of case-centric event data
pub mod log_skeleton;
