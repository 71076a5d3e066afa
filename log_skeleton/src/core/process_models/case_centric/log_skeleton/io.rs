//! IO implementations for `LogSkeleton`

use std::io::{BufReader, Read, Write};

use serde::Serialize;

use crate::core::io::{Exportable, Importable};

use super::{equivalence_classes::representative_of, LogSkeleton, QueryConfig};

/// Error type for `LogSkeleton` IO operations
#[derive(Debug)]
pub enum LogSkeletonIOError {
    /// IO Error
    Io(std::io::Error),
    /// JSON Parsing Error
    Json(serde_json::Error),
    /// CSV Writing Error
    Csv(csv::Error),
    /// Unsupported Format
    UnsupportedFormat(String),
}

impl std::fmt::Display for LogSkeletonIOError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogSkeletonIOError::Io(e) => write!(f, "IO Error: {}", e),
            LogSkeletonIOError::Json(e) => write!(f, "JSON Error: {}", e),
            LogSkeletonIOError::Csv(e) => write!(f, "CSV Error: {}", e),
            LogSkeletonIOError::UnsupportedFormat(s) => write!(f, "Unsupported Format: {}", s),
        }
    }
}

impl std::error::Error for LogSkeletonIOError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogSkeletonIOError::Io(e) => Some(e),
            LogSkeletonIOError::Json(e) => Some(e),
            LogSkeletonIOError::Csv(e) => Some(e),
            LogSkeletonIOError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for LogSkeletonIOError {
    fn from(e: std::io::Error) -> Self {
        LogSkeletonIOError::Io(e)
    }
}

impl From<serde_json::Error> for LogSkeletonIOError {
    fn from(e: serde_json::Error) -> Self {
        LogSkeletonIOError::Json(e)
    }
}

impl From<csv::Error> for LogSkeletonIOError {
    fn from(e: csv::Error) -> Self {
        LogSkeletonIOError::Csv(e)
    }
}

/// Column names of the CSV export
pub const CSV_HEADER: [&str; 4] = ["relation", "activity", "other", "value"];

#[derive(Serialize)]
struct CsvRow<'a> {
    relation: &'a str,
    activity: &'a str,
    other: &'a str,
    value: u64,
}

///
/// Write the facts of a log skeleton as CSV (one row per fact)
///
/// Rows are grouped by activity (in activity order). `same_count` rows relate an activity to the
/// representative of its class at noise level `0`; `never_together` rows use strict thresholds.
///
pub fn export_log_skeleton_csv<W: Write>(
    writer: W,
    skeleton: &LogSkeleton,
) -> Result<(), LogSkeletonIOError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    let strict = QueryConfig::default();
    let causal = &skeleton.causal;
    for activity in &skeleton.activities {
        let mut row = |relation: &str, other: &str, value: u64| {
            csv_writer.serialize(CsvRow {
                relation,
                activity,
                other,
                value,
            })
        };
        let bounds = skeleton.bounds(activity);
        row("count", "", skeleton.count_model.activity_count(activity))?;
        row("min", "", bounds.min)?;
        row("max", "", bounds.max)?;
        for ((_, to), count) in skeleton
            .count_model
            .transition_counts()
            .range((activity.clone(), String::new())..)
            .take_while(|((from, _), _)| from == activity)
        {
            row("transition", to, *count)?;
            row(
                "min_transition",
                to,
                skeleton.min_transition_count(activity, to),
            )?;
        }
        if let Some(representative) = skeleton
            .equivalence
            .class_of(activity, 0)
            .and_then(representative_of)
            .filter(|r| *r != activity)
        {
            row("same_count", representative, 0)?;
        }
        for other in causal.all_pre(activity).into_iter().flatten() {
            row("always_before", other, causal.pre_support(activity, other))?;
        }
        for other in causal.all_post(activity).into_iter().flatten() {
            row("always_after", other, causal.post_support(activity, other))?;
        }
        for other in &skeleton.activities {
            if skeleton.has_not_co_existence(activity, other, &strict) {
                row("never_together", other, causal.co_support(activity, other))?;
            }
        }
    }
    csv_writer.flush()?;
    Ok(())
}

impl Importable for LogSkeleton {
    type Error = LogSkeletonIOError;

    fn import_from_reader<R: Read>(reader: R, format: &str) -> Result<Self, Self::Error> {
        if format.ends_with("json") {
            Ok(serde_json::from_reader(BufReader::new(reader))?)
        } else {
            Err(LogSkeletonIOError::UnsupportedFormat(format.to_string()))
        }
    }

    fn known_import_formats() -> Vec<&'static str> {
        vec!["json"]
    }
}

impl Exportable for LogSkeleton {
    type Error = LogSkeletonIOError;

    fn export_to_writer<W: Write>(&self, writer: W, format: &str) -> Result<(), Self::Error> {
        match format {
            _ if format.ends_with("json") => {
                serde_json::to_writer(writer, self)?;
                Ok(())
            }
            _ if format.ends_with("csv") => export_log_skeleton_csv(writer, self),
            _ => Err(LogSkeletonIOError::UnsupportedFormat(format.to_string())),
        }
    }

    fn known_export_formats() -> Vec<&'static str> {
        vec!["json", "csv"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::case_centric::log_skeleton::{
        discover_log_skeleton, LogSkeletonDiscoveryOptions,
    };
    use crate::core::event_data::case_centric::EventLogClassifier;
    use crate::event_log;

    fn skeleton() -> LogSkeleton {
        let log = event_log!({"concept:name" => "Orders"}; ["a", "b"], ["a", "c"]);
        discover_log_skeleton(
            &log,
            &EventLogClassifier::default(),
            &LogSkeletonDiscoveryOptions::default(),
        )
    }

    #[test]
    fn json_file_roundtrip() {
        let sk = skeleton();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders-skeleton.json");
        sk.export_to_path(&path).unwrap();
        assert_eq!(LogSkeleton::import_from_path(&path).unwrap(), sk);
    }

    #[test]
    fn csv_rows() {
        let sk = skeleton();
        let bytes = sk.export_to_bytes("csv").unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "relation,activity,other,value");
        assert!(lines.contains(&"count,a,,2"));
        assert!(lines.contains(&"min,b,,0"));
        assert!(lines.contains(&"max,b,,1"));
        assert!(lines.contains(&"transition,a,b,1"));
        assert!(lines.contains(&"min_transition,__START,a,1"));
        assert!(lines.contains(&"always_before,b,a,1"));
        assert!(lines.contains(&"never_together,b,c,0"));
        assert!(lines.contains(&"never_together,c,b,0"));
        assert!(!lines.iter().any(|l| l.starts_with("never_together,a,")));
    }

    #[test]
    fn csv_is_export_only() {
        let bytes = skeleton().export_to_bytes("csv").unwrap();
        assert!(matches!(
            LogSkeleton::import_from_bytes(&bytes, "csv"),
            Err(LogSkeletonIOError::UnsupportedFormat(_))
        ));
    }
}
