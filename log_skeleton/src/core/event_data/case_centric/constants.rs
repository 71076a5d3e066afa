//! Attribute keys of the XES concept extension

/// Event attribute holding the activity, used by the default classifier
pub const ACTIVITY_NAME: &str = "concept:name";
/// Trace attribute identifying a case
pub const TRACE_ID_NAME: &str = "concept:name";
/// Log attribute naming the log, used as label of discovered log skeletons
pub const LOG_NAME: &str = "concept:name";
