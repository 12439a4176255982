//! Error types for the pdf2html library.
//!
//! Three types, three failure modes:
//!
//! * [`ConversionError`] — the single umbrella error returned by every public
//!   `convert*` entry point. Its message is fixed; the classified cause is
//!   attached as its [`std::error::Error::source`].
//!
//! * [`Pdf2HtmlError`] — **Fatal** cause: the conversion cannot proceed
//!   (missing input, not a PDF, engine unavailable, output not writable).
//!
//! * [`PageError`] — **Non-fatal**: a single page failed inside the engine
//!   but the others are fine. Stored inside [`crate::output::PageResult`]
//!   so one broken page does not cost the whole document.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The error returned by every public conversion entry point.
///
/// Callers that only care whether conversion worked can treat this as
/// opaque. Callers that want to react to the reason inspect [`cause`]
/// (or walk the `source()` chain).
///
/// [`cause`]: ConversionError::cause
#[derive(Debug, Error)]
#[error("Error occurred during conversion.")]
pub struct ConversionError {
    input: Option<PathBuf>,
    #[source]
    cause: Pdf2HtmlError,
}

impl ConversionError {
    /// Wrap a classified cause for the given input.
    pub fn new(input: Option<&Path>, cause: Pdf2HtmlError) -> Self {
        Self {
            input: input.map(Path::to_path_buf),
            cause,
        }
    }

    /// The input file the failed conversion was reading, when known.
    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    /// The classified reason for the failure.
    pub fn cause(&self) -> &Pdf2HtmlError {
        &self.cause
    }

    /// Consume the wrapper and return the classified reason.
    pub fn into_cause(self) -> Pdf2HtmlError {
        self.cause
    }
}

/// All fatal causes of a failed conversion.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2HtmlError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input file exists but contains no bytes.
    #[error("PDF file is empty: '{path}'")]
    EmptyFile { path: PathBuf },

    /// The input file exceeds the configured size limit.
    #[error("PDF file '{path}' is {size} bytes, over the {limit}-byte limit\nRaise it with --max-size-mb.")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Reading the input failed part-way through.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Every selected page failed inside the engine; output would be empty.
    #[error("All {total} selected pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::ConversionOutput::into_result`] when
    /// the caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed during conversion")]
    PartialFailure { failed: usize, total: usize },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is loaded dynamically. You can:\n\
  • Set PDF2HTML_PDFIUM_PATH=/path/to/libpdfium (file or directory).\n\
  • Place libpdfium in the pdf2html cache directory or the working directory.\n\
  • Install pdfium system-wide so the loader can find it.\n"
    )]
    EngineUnavailable(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2HtmlError {
    /// Wrap this cause into the public umbrella error.
    pub fn into_conversion(self, input: Option<&Path>) -> ConversionError {
        ConversionError::new(input, self)
    }
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page fails.
/// The overall conversion continues unless ALL pages fail.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The engine could not load the page or its text layer.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextFailed { page: usize, detail: String },

    /// An embedded image could not be decoded or encoded.
    #[error("Page {page}: image extraction failed: {detail}")]
    ImageFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::TextFailed { page, .. } | PageError::ImageFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn conversion_error_has_fixed_message_and_chained_cause() {
        let e = Pdf2HtmlError::FileNotFound {
            path: PathBuf::from("/nope.pdf"),
        }
        .into_conversion(Some(Path::new("/nope.pdf")));

        assert_eq!(e.to_string(), "Error occurred during conversion.");
        assert_eq!(e.input(), Some(Path::new("/nope.pdf")));

        let source = e.source().expect("cause is chained");
        assert!(source.to_string().contains("/nope.pdf"), "got: {source}");
        assert!(matches!(e.cause(), Pdf2HtmlError::FileNotFound { .. }));
        assert!(matches!(e.into_cause(), Pdf2HtmlError::FileNotFound { .. }));
    }

    #[test]
    fn output_write_failure_chains_io_error() {
        let e = Pdf2HtmlError::OutputWriteFailed {
            path: PathBuf::from("/ro/out.html"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        assert!(e.to_string().contains("/ro/out.html"));
        assert!(e.source().unwrap().to_string().contains("read-only"));
    }

    #[test]
    fn file_too_large_display() {
        let e = Pdf2HtmlError::FileTooLarge {
            path: PathBuf::from("big.pdf"),
            size: 100,
            limit: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("100 bytes"), "got: {msg}");
        assert!(msg.contains("10-byte"), "got: {msg}");
    }

    #[test]
    fn all_pages_failed_display() {
        let e = Pdf2HtmlError::AllPagesFailed {
            total: 3,
            first_error: "Page 1: text extraction failed: boom".into(),
        };
        assert!(e.to_string().contains("All 3"));
        assert!(e.to_string().contains("boom"));
    }

    #[test]
    fn partial_failure_display() {
        let e = Pdf2HtmlError::PartialFailure {
            failed: 1,
            total: 10,
        };
        assert!(e.to_string().contains("1/10"), "got: {e}");
    }

    #[test]
    fn page_error_reports_its_page() {
        let e = PageError::ImageFailed {
            page: 7,
            detail: "bad filter".into(),
        };
        assert_eq!(e.page(), 7);
        assert!(e.to_string().starts_with("Page 7"));
    }
}
