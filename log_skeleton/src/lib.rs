#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![allow(clippy::needless_doctest_main)]

#![doc = include_str!("../README.md")]

pub mod core;
pub mod discovery;
pub mod conformance;

#[doc(inline)]
pub use crate::core::{
    event_data::case_centric::{
        ActivityClassifier, Attribute, AttributeValue, Attributes, Event, EventLog,
        EventLogClassifier, Trace,
    },
    io::{Exportable, Importable},
    process_models::case_centric::log_skeleton::{LogSkeleton, QueryConfig},
};

#[doc(inline)]
pub use conformance::case_centric::log_skeleton::{
    check_activities, check_event_log_trace, check_trace, classify_event_log, CheckConfig,
    CheckKind, LogClassification, Violation, ViolationKind,
};

#[doc(inline)]
pub use discovery::case_centric::log_skeleton::{
    discover_log_skeleton, discover_log_skeleton_from_sequences, LogSkeletonDiscoveryOptions,
};
