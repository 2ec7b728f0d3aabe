//! HTML to Markdown converter with asset export
//!
//! This library converts HTML documents into Markdown by streaming tokenizer
//! events through a stateful transducer, and collects the local files the
//! document references so they can be copied alongside the converted output.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `parser`: html5ever tokenizer adapter producing parse events
//! - `event`: parse events and typed attribute access
//! - `converter`: the Markdown transducer
//! - `charset`: character encoding detection and decoding
//! - `export`: file, folder and tree export with asset copying
//! - `error`: error types
//!
//! # Example
//!
//! ```rust
//! use html_to_md_converter::MarkdownConverter;
//!
//! let result = MarkdownConverter::new()
//!     .convert_html(r#"<a href="docs/guide.pdf">Guide</a>"#);
//!
//! assert_eq!(result.markdown, "[Guide](docs/guide.pdf)");
//! assert_eq!(result.assets[0].as_str(), "docs/guide.pdf");
//! ```

pub mod charset;
pub mod converter;
pub mod error;
pub mod event;
pub mod export;
pub mod parser;

// Re-export main types for convenience
pub use converter::{AssetReference, ConversionResult, ConversionState, MarkdownConverter};
pub use error::{ConversionError, ExportError};
pub use event::{Attributes, ParseEvent};
pub use export::{BatchReport, ExportOptions, Exporter, FileReport};
pub use parser::tokenize;
