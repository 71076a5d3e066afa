//! IO implementations for `EventLog`

use std::io::{BufReader, Read, Write};

use crate::core::event_data::case_centric::EventLog;
use crate::core::io::{Exportable, Importable};

/// Error type for `EventLog` IO operations
#[derive(Debug)]
pub enum EventLogIOError {
    /// IO Error
    Io(std::io::Error),
    /// JSON Parsing Error
    Json(serde_json::Error),
    /// Unsupported Format
    UnsupportedFormat(String),
}

impl std::fmt::Display for EventLogIOError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventLogIOError::Io(e) => write!(f, "IO Error: {}", e),
            EventLogIOError::Json(e) => write!(f, "JSON Error: {}", e),
            EventLogIOError::UnsupportedFormat(s) => write!(f, "Unsupported Format: {}", s),
        }
    }
}

impl std::error::Error for EventLogIOError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EventLogIOError::Io(e) => Some(e),
            EventLogIOError::Json(e) => Some(e),
            EventLogIOError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for EventLogIOError {
    fn from(e: std::io::Error) -> Self {
        EventLogIOError::Io(e)
    }
}

impl From<serde_json::Error> for EventLogIOError {
    fn from(e: serde_json::Error) -> Self {
        EventLogIOError::Json(e)
    }
}

impl Importable for EventLog {
    type Error = EventLogIOError;

    fn import_from_reader<R: Read>(reader: R, format: &str) -> Result<Self, Self::Error> {
        match format {
            _ if format.ends_with("json.gz") => {
                let gz = flate2::read::GzDecoder::new(reader);
                Ok(serde_json::from_reader(BufReader::new(gz))?)
            }
            _ if format.ends_with("json") => Ok(serde_json::from_reader(BufReader::new(reader))?),
            _ => Err(EventLogIOError::UnsupportedFormat(format.to_string())),
        }
    }

    fn known_import_formats() -> Vec<&'static str> {
        vec!["json", "json.gz"]
    }
}

impl Exportable for EventLog {
    type Error = EventLogIOError;

    fn export_to_writer<W: Write>(&self, writer: W, format: &str) -> Result<(), Self::Error> {
        if format.ends_with("json.gz") {
            let mut encoder = flate2::write::GzEncoder::new(writer, flate2::Compression::default());
            serde_json::to_writer(&mut encoder, self)?;
            encoder.finish()?;
            Ok(())
        } else if format.ends_with("json") {
            serde_json::to_writer(writer, self)?;
            Ok(())
        } else {
            Err(EventLogIOError::UnsupportedFormat(format.to_string()))
        }
    }

    fn known_export_formats() -> Vec<&'static str> {
        vec!["json", "json.gz"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log;

    #[test]
    fn gzipped_json_file_roundtrip() {
        let log = event_log!({"concept:name" => "Orders"}; ["a", "b"], ["a", "c", "b"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json.gz");
        log.export_to_path(&path).unwrap();
        let imported = EventLog::import_from_path(&path).unwrap();
        assert_eq!(imported, log);
    }

    #[test]
    fn unsupported_formats_are_rejected() {
        let log = event_log!(["a"]);
        assert!(matches!(
            log.export_to_bytes("xes"),
            Err(EventLogIOError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            EventLog::import_from_bytes(b"{}", "csv"),
            Err(EventLogIOError::UnsupportedFormat(_))
        ));
    }
}
