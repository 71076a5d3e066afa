//! Event Data
//!
//! Fundamental structs and adjacent utilities for recorded process executions
pub mod case_centric;

#[doc(inline)]
pub use case_centric::EventLog;
