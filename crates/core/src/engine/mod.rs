//! Conversion engine.
//!
//! The engine is the entry point callers use. A request moves through:
//! - Validation: the input exists, is a readable file within the size limit
//! - Format detection: from extensions, unless explicitly overridden
//! - Planning: shortest converter chain from the resolver
//! - Execution: every step in a private workspace, the last one writing the
//!   caller's output path
//!
//! The workspace is removed on every exit path unless preservation was
//! requested. A failure at any stage aborts the whole request.
//!
//! # Example
//!
//! ```ignore
//! use fileconv_core::engine::{ConversionEngine, ConversionRequest};
//!
//! let (engine, _report) = ConversionEngine::bootstrap(&config, sources)?;
//!
//! let request = ConversionRequest::new("report.docx", "report.pdf")
//!     .with_parameter("page_size", "a4");
//! let result = engine.convert(request).await?;
//! println!("{} steps in {}ms", result.step_count(), result.duration_ms);
//! ```

mod batch;
mod config;
mod error;
mod executor;
mod types;
mod workspace;

pub use batch::{BatchConverter, BatchReport, BatchSummary};
pub use config::EngineConfig;
pub use error::ConversionError;
pub use executor::ConversionEngine;
pub use types::{ConversionInfo, ConversionRequest, ConversionResult};
pub use workspace::{Workspace, WORKSPACE_PREFIX};
