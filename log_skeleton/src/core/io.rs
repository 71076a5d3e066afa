//! Reading and writing event data and models in different formats
//!
//! Formats are named by file extension (e.g., `json`, `json.gz`, `csv`).
use std::io::{Read, Write};
use std::path::Path;

/// Format of a file, derived from its (possibly compound) extension
///
/// `orders.json.gz` has format `json.gz`, `Skeleton.JSON` has format `json`.
pub fn infer_format_from_path(path: &Path) -> Option<String> {
    let lowercase = path.to_string_lossy().to_lowercase();
    if lowercase.ends_with(".json.gz") {
        return Some("json.gz".to_string());
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn no_format(path: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("No file format could be derived from {}", path.display()),
    )
}

/// Types that can be read in at least one format
pub trait Importable: Sized {
    /// Error of failed imports
    type Error: std::error::Error + Send + Sync + 'static + From<std::io::Error>;

    /// Read from `reader`, which provides data in `format`
    fn import_from_reader<R: Read>(reader: R, format: &str) -> Result<Self, Self::Error>;

    /// Read a file; the format is derived with [`infer_format_from_path`]
    fn import_from_path<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error> {
        let path = path.as_ref();
        let format = infer_format_from_path(path).ok_or_else(|| no_format(path))?;
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        Self::import_from_reader(reader, &format)
    }

    /// Read from in-memory data in `format`
    fn import_from_bytes(bytes: &[u8], format: &str) -> Result<Self, Self::Error> {
        Self::import_from_reader(bytes, format)
    }

    /// Formats accepted by [`Importable::import_from_reader`]
    fn known_import_formats() -> Vec<&'static str>;
}

/// Types that can be written in at least one format
pub trait Exportable {
    /// Error of failed exports
    type Error: std::error::Error + Send + Sync + 'static + From<std::io::Error>;

    /// Write to `writer` in `format`
    fn export_to_writer<W: Write>(&self, writer: W, format: &str) -> Result<(), Self::Error>;

    /// Write a file; the format is derived with [`infer_format_from_path`]
    fn export_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::Error> {
        let path = path.as_ref();
        let format = infer_format_from_path(path).ok_or_else(|| no_format(path))?;
        let writer = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.export_to_writer(writer, &format)
    }

    /// Write into a new byte vector in `format`
    fn export_to_bytes(&self, format: &str) -> Result<Vec<u8>, Self::Error> {
        let mut bytes = Vec::new();
        self.export_to_writer(&mut bytes, format)?;
        Ok(bytes)
    }

    /// Formats accepted by [`Exportable::export_to_writer`]
    fn known_export_formats() -> Vec<&'static str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_from_paths() {
        let format = |p: &str| infer_format_from_path(Path::new(p));
        assert_eq!(format("logs/orders.json.gz").as_deref(), Some("json.gz"));
        assert_eq!(format("Skeleton.JSON").as_deref(), Some("json"));
        assert_eq!(format("skeleton.csv").as_deref(), Some("csv"));
        assert_eq!(format("README"), None);
    }
}
