//! Process model representations
pub mod case_centric;
