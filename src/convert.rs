//! Eager (full-document) conversion entry points.
//!
//! ## Blocking core, async wrappers
//!
//! PDFium is a synchronous C library, so the real work happens in the
//! blocking functions [`convert_sync`] and [`convert_file_sync`]. The async
//! functions move that work onto tokio's blocking pool with
//! `spawn_blocking` and never block the executor. Use
//! [`crate::stream::convert_stream`] instead to receive pages one by one.

use crate::config::ConversionConfig;
use crate::error::{ConversionError, Pdf2HtmlError};
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
use crate::pipeline::document::{self, DocumentSummary};
use crate::pipeline::dom::{self, HeadInfo};
use crate::pipeline::input::{self, PdfInput};
use crate::pipeline::output::OutputTarget;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file to HTML in memory.
///
/// # Errors
/// Returns [`ConversionError`] when the input cannot be read, is not a
/// PDF, cannot be opened by the engine, or every selected page failed.
/// Individual failed pages are reported in `output.pages` instead.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionError> {
    let path = input.as_ref();
    info!("Starting conversion: {}", path.display());
    let pdf = input::read_input(path, config.max_input_bytes)
        .map_err(|e| e.into_conversion(Some(path)))?;
    convert_input(&pdf, config).map_err(|e| e.into_conversion(Some(path)))
}

/// Convert a PDF file and write the HTML to `output`.
///
/// The destination is reserved before conversion starts and replaced
/// atomically on success. On failure nothing is created and an existing
/// file at `output` is left as it was. Missing parent directories are not
/// created.
pub fn convert_file_sync(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, ConversionError> {
    let in_path = input.as_ref();
    let out_path = output.as_ref();
    let fail = |e: Pdf2HtmlError| e.into_conversion(Some(in_path));

    // Input first so a missing input never leaves a temp file behind.
    let pdf = input::read_input(in_path, config.max_input_bytes).map_err(fail)?;
    let target = OutputTarget::prepare(out_path).map_err(fail)?;

    let result = convert_input(&pdf, config).map_err(fail)?;
    let written = target.commit(&result.html).map_err(fail)?;

    info!("Wrote {} ({} bytes)", out_path.display(), written);
    Ok(result.stats)
}

/// Convert a PDF file to HTML in memory without blocking the executor.
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionError> {
    let path = input.as_ref().to_path_buf();
    let config = config.clone();
    run_blocking(Some(path.clone()), move || convert_sync(&path, &config)).await
}

/// Convert a PDF file and write the HTML to `output`.
///
/// Async counterpart of [`convert_file_sync`], with the same atomic-write
/// guarantees.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, ConversionError> {
    let in_path = input.as_ref().to_path_buf();
    let out_path = output.as_ref().to_path_buf();
    let config = config.clone();
    run_blocking(Some(in_path.clone()), move || {
        convert_file_sync(&in_path, &out_path, &config)
    })
    .await
}

/// Convert PDF bytes held in memory.
///
/// Useful when the PDF comes from a database or a network body. The bytes
/// are validated exactly like a file and never touch the filesystem.
///
/// # Example
/// ```rust,no_run
/// use pdf2html::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("document.pdf")?;
/// let output = convert_from_bytes(bytes, &ConversionConfig::default()).await?;
/// println!("{}", output.html);
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: impl Into<Vec<u8>>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConversionError> {
    let bytes = bytes.into();
    let config = config.clone();
    run_blocking(None, move || {
        let pdf = input::from_bytes(bytes, config.max_input_bytes)
            .map_err(|e| e.into_conversion(None))?;
        convert_input(&pdf, &config).map_err(|e| e.into_conversion(None))
    })
    .await
}

/// Read document metadata without converting any page.
pub async fn inspect(
    input: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentMetadata, ConversionError> {
    let path = input.as_ref().to_path_buf();
    let password = password.map(str::to_string);
    run_blocking(Some(path.clone()), move || {
        let fail = |e: Pdf2HtmlError| e.into_conversion(Some(&path));
        // Metadata only: no size limit applies.
        let pdf = input::read_input(&path, u64::MAX).map_err(fail)?;
        document::inspect(&pdf, password.as_deref()).map_err(fail)
    })
    .await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run a blocking conversion on tokio's blocking pool.
async fn run_blocking<T, F>(input: Option<PathBuf>, f: F) -> Result<T, ConversionError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ConversionError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        Pdf2HtmlError::Internal(format!("conversion task failed: {e}"))
            .into_conversion(input.as_deref())
    })?
}

/// Render the whole document and assemble the output.
pub(crate) fn convert_input(
    pdf: &PdfInput,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2HtmlError> {
    let start = Instant::now();

    let mut pages: Vec<PageResult> = Vec::new();
    let summary = document::render_document(pdf, config, |page| {
        pages.push(page);
        ControlFlow::Continue(())
    })?;

    let fragments: Vec<String> = pages.iter().map(|p| p.html.clone()).collect();
    let html = if config.standalone {
        dom::assemble_document(&head_info(pdf, config, &summary.metadata), &fragments)
    } else {
        dom::assemble_fragment(&fragments)
    };

    let stats = build_stats(&summary, pdf.len(), html.len() as u64, start);
    info!(
        "Conversion complete: {}/{} pages, {}ms total",
        stats.processed_pages, summary.selected, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        html,
        pages,
        metadata: summary.metadata,
        stats,
    })
}

fn build_stats(
    summary: &DocumentSummary,
    input_bytes: u64,
    output_bytes: u64,
    start: Instant,
) -> ConversionStats {
    ConversionStats {
        total_pages: summary.metadata.page_count,
        processed_pages: summary.processed,
        failed_pages: summary.failed,
        skipped_pages: summary.metadata.page_count.saturating_sub(summary.selected),
        text_free_pages: summary.text_free,
        input_bytes,
        output_bytes,
        total_duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Title and `<meta>` tags for a standalone document.
///
/// Title precedence: configured title, PDF title, input file stem,
/// `"Document"`.
fn head_info(pdf: &PdfInput, config: &ConversionConfig, meta: &DocumentMetadata) -> HeadInfo {
    let title = config
        .title
        .clone()
        .or_else(|| meta.title.clone())
        .or_else(|| pdf.stem())
        .unwrap_or_else(|| "Document".to_string());
    debug!("Document title: {}", title);

    let mut tags = Vec::new();
    if config.include_metadata {
        let fields = [
            ("author", &meta.author),
            ("description", &meta.subject),
            ("creator", &meta.creator),
            ("producer", &meta.producer),
            ("created", &meta.creation_date),
            ("modified", &meta.modification_date),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                tags.push((name, v.clone()));
            }
        }
    }

    HeadInfo { title, meta: tags }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_named(name: &str) -> PdfInput {
        PdfInput {
            path: PathBuf::from(name),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            title: Some("Annual Report".into()),
            author: Some("Finance".into()),
            producer: Some("Writer".into()),
            page_count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn title_precedence() {
        let pdf = pdf_named("/tmp/scan-042.pdf");
        let mut meta = metadata();

        let configured = ConversionConfig::builder().title("Custom").build().unwrap();
        assert_eq!(head_info(&pdf, &configured, &meta).title, "Custom");

        let config = ConversionConfig::default();
        assert_eq!(head_info(&pdf, &config, &meta).title, "Annual Report");

        meta.title = None;
        assert_eq!(head_info(&pdf, &config, &meta).title, "scan-042");

        let anonymous = PdfInput {
            path: PathBuf::new(),
            bytes: Vec::new(),
        };
        assert_eq!(head_info(&anonymous, &config, &meta).title, "Document");
    }

    #[test]
    fn meta_tags_only_when_requested() {
        let pdf = pdf_named("a.pdf");
        let meta = metadata();

        let plain = head_info(&pdf, &ConversionConfig::default(), &meta);
        assert!(plain.meta.is_empty());

        let config = ConversionConfig::builder().include_metadata(true).build().unwrap();
        let head = head_info(&pdf, &config, &meta);
        assert_eq!(
            head.meta,
            vec![("author", "Finance".to_string()), ("producer", "Writer".to_string())]
        );
    }

    #[test]
    fn stats_count_skipped_pages() {
        let summary = DocumentSummary {
            metadata: metadata(),
            selected: 2,
            processed: 1,
            failed: 1,
            text_free: 1,
            stopped_early: false,
        };
        let stats = build_stats(&summary, 100, 200, Instant::now());
        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.skipped_pages, 1);
        assert_eq!(stats.failed_pages, 1);
        assert_eq!(stats.text_free_pages, 1);
        assert_eq!((stats.input_bytes, stats.output_bytes), (100, 200));
    }

    #[test]
    fn missing_input_is_reported_before_output_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.html");
        let err = convert_file_sync(dir.path().join("nope.pdf"), &out, &ConversionConfig::default())
            .unwrap_err();
        assert!(matches!(err.cause(), Pdf2HtmlError::FileNotFound { .. }));
        assert!(!out.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
