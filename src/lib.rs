//! # pdf2html
//!
//! Convert PDF documents to positioned HTML using the PDFium engine.
//!
//! ## Why this crate?
//!
//! Parsing PDF, decoding fonts and mapping glyphs to Unicode is a job for a
//! mature engine. This crate hands all of that to PDFium (through
//! `pdfium-render`) and only does the part an engine does not: group the
//! characters it reports into text runs and emit them as absolutely
//! positioned HTML boxes, with embedded images, one `<div>` per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Read     validate path, size and %PDF header
//!  ├─ 2. Engine   open in PDFium (blocking thread, serialised)
//!  ├─ 3. Layout   glyphs → positioned text runs
//!  ├─ 4. Polish   ligatures, invisible chars, whitespace
//!  ├─ 5. DOM      page divs + base64 images → HTML string
//!  └─ 6. Write    temp file + atomic rename
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2html::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let stats = convert_to_file("document.pdf", "document.html", &config).await?;
//!     eprintln!("{} pages, {} bytes of HTML", stats.processed_pages, stats.output_bytes);
//!     Ok(())
//! }
//! ```
//!
//! Blocking callers use [`convert_file_sync`] / [`convert_sync`], which need
//! no runtime.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2html` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2html = { version = "0.1", default-features = false }
//! ```
//!
//! ## Locating PDFium
//!
//! The PDFium shared library is loaded at runtime. Set
//! `PDF2HTML_PDFIUM_PATH` to the library file or its directory, or place it
//! in `<cache dir>/pdf2html/`, the working directory, or the system library
//! path. See [`pipeline::engine`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ImageMode, PageSelection};
pub use convert::{
    convert, convert_file_sync, convert_from_bytes, convert_sync, convert_to_file, inspect,
};
pub use error::{ConversionError, PageError, Pdf2HtmlError};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
pub use pipeline::dom::STYLESHEET;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, convert_stream_from_bytes, PageStream};
