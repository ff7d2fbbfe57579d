//! Format identifiers and extension handling.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

static FORMAT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9._+-]*$").expect("format name pattern is valid"));

/// A file format, identified by its normalized (lower-case) name.
///
/// Two formats are equal iff their normalized names match, so `"DOCX"` and
/// `"docx"` are the same format. The file extensions that map to a format are
/// declared by converters and tracked by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Format(String);

impl Format {
    /// Creates a format from a name, trimming whitespace, a leading dot and case.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(normalize_extension(name.as_ref()))
    }

    /// Returns the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is usable as a format identifier.
    pub fn is_valid(&self) -> bool {
        FORMAT_NAME.is_match(&self.0)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Format {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Format {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.0
    }
}

impl AsRef<str> for Format {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes a file extension: trimmed, lower-case, without a leading dot.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

/// Returns the candidate extensions of a path, longest first.
///
/// `report.tar.gz` yields `["tar.gz", "gz"]`. A dot-file such as `.bashrc`
/// has no extension.
pub fn extension_candidates(path: &Path) -> Vec<String> {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };

    let file_name = file_name.to_lowercase();
    let parts: Vec<&str> = file_name.split('.').collect();
    if parts.len() < 2 || (parts.len() == 2 && parts[0].is_empty()) {
        return Vec::new();
    }

    (1..parts.len())
        .map(|i| parts[i..].join("."))
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_case_insensitive() {
        assert_eq!(Format::new("DOCX"), Format::new("docx"));
        assert_eq!(Format::new(" .Html "), Format::new("html"));
        assert_eq!(Format::new("PDF").to_string(), "pdf");
    }

    #[test]
    fn test_format_validity() {
        assert!(Format::new("docx").is_valid());
        assert!(Format::new("tar.gz").is_valid());
        assert!(Format::new("c++").is_valid());
        assert!(!Format::new("").is_valid());
        assert!(!Format::new("two words").is_valid());
    }

    #[test]
    fn test_format_serde_normalizes() {
        let format: Format = serde_json::from_str("\"XLSX\"").unwrap();
        assert_eq!(format.as_str(), "xlsx");
        assert_eq!(serde_json::to_string(&format).unwrap(), "\"xlsx\"");
    }

    #[test]
    fn test_extension_candidates() {
        assert_eq!(extension_candidates(Path::new("/tmp/a.DOCX")), vec!["docx"]);
        assert_eq!(
            extension_candidates(Path::new("backup.tar.gz")),
            vec!["tar.gz", "gz"]
        );
        assert!(extension_candidates(Path::new("README")).is_empty());
        assert!(extension_candidates(Path::new(".bashrc")).is_empty());
        assert!(extension_candidates(Path::new("trailing.")).is_empty());
    }
}
