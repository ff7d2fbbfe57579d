//! Testing utilities and mock implementations.
//!
//! This module provides a mock converter that declares arbitrary formats,
//! allowing registry, resolver and engine tests without real conversion
//! tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileconv_core::testing::{fixtures, MockConverter};
//!
//! let docx_html = MockConverter::new("docx-html", &["docx"], &["html"]);
//! let html_pdf = MockConverter::new("html-pdf", &["html"], &["pdf"]);
//!
//! // Make the second step fail
//! html_pdf.set_failure(Some("renderer crashed".to_string())).await;
//!
//! let sources = vec![
//!     fixtures::mock_source("document", &docx_html),
//!     fixtures::mock_source("document", &html_pdf),
//! ];
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use super::MockConverter;
    use crate::engine::WORKSPACE_PREFIX;
    use crate::registry::ConverterSource;

    /// Write a file under `dir` and return its path.
    ///
    /// Panics if the file cannot be written.
    pub fn write_file(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap_or_else(|e| {
            panic!("failed to write fixture {}: {}", path.display(), e)
        });
        path
    }

    /// Count workspace directories left under `dir`.
    pub fn workspace_residue(dir: &Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        entries
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(WORKSPACE_PREFIX)
            })
            .count()
    }

    /// Discovery source sharing the mock's recorded state.
    pub fn mock_source(category: &str, mock: &MockConverter) -> ConverterSource {
        ConverterSource::from_instance(category, Arc::new(mock.clone()))
    }
}
