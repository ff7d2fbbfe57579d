//! Converter plugin interface.
//!
//! This module provides the `Converter` trait every format converter
//! implements, the capability data the registry indexes, and two built-in
//! converters:
//!
//! - `IdentityConverter`: copies a file when input and output formats match
//! - `CommandConverter`: delegates a conversion to an external program
//!
//! # Example
//!
//! ```ignore
//! use fileconv_core::converter::{CommandConverter, CommandConverterConfig, Converter};
//!
//! let config = CommandConverterConfig::new("pandoc", "pandoc", &["md"], &["html"])
//!     .with_args(&["{input}", "-o", "{output}"]);
//! let converter = CommandConverter::new(config);
//!
//! let metadata = converter
//!     .convert(Path::new("notes.md"), Path::new("notes.html"), workspace, &Parameters::new())
//!     .await?;
//! println!("exit code: {}", metadata["exit_code"]);
//! ```

mod command;
mod config;
mod error;
mod identity;
mod traits;
mod types;

pub use command::CommandConverter;
pub use config::CommandConverterConfig;
pub use error::ConverterError;
pub use identity::{IdentityConverter, IDENTITY_CONVERTER_NAME};
pub use traits::Converter;
pub use types::{ConverterCapability, Metadata, ParamSpec, ParamType, ParameterSchema, Parameters};
