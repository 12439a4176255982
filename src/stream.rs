//! Streaming conversion API: emit pages as the engine finishes them.
//!
//! ## Why stream?
//!
//! Large documents take a while and their HTML can be big. A stream lets
//! callers show partial results, drive a progress display, or write pages
//! out incrementally instead of holding the whole document in memory.
//!
//! The engine runs on a blocking thread and forwards each [`PageResult`]
//! through a bounded channel, so pages arrive in page order and at most
//! [`STREAM_BUFFER`] rendered pages wait in memory. Dropping the stream
//! stops the producer at its next page.
//!
//! While the buffer is full the producer gives the engine lock back and
//! reopens the document once the consumer catches up, so a consumer may
//! run other conversions while it still holds the stream.

use crate::config::ConversionConfig;
use crate::error::{ConversionError, Pdf2HtmlError};
use crate::output::PageResult;
use crate::pipeline::document::PagePass;
use crate::pipeline::input::{self, PdfInput};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info};

/// Rendered pages buffered ahead of the consumer.
pub const STREAM_BUFFER: usize = 4;

/// A boxed stream of page results.
///
/// A fatal error (engine unavailable, corrupt PDF, every page failed) is
/// yielded as the last item.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageResult, ConversionError>> + Send>>;

/// Convert a PDF file to HTML, streaming page fragments in page order.
///
/// The input is read and validated before this returns, so a missing or
/// non-PDF file fails here rather than inside the stream.
///
/// # Example
/// ```rust,no_run
/// use pdf2html::{convert_stream, ConversionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut pages = convert_stream("document.pdf", &ConversionConfig::default()).await?;
/// while let Some(page) = pages.next().await {
///     let page = page?;
///     println!("page {}: {} runs", page.page_num, page.run_count);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_stream(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<PageStream, ConversionError> {
    let path = input.as_ref().to_path_buf();
    info!("Starting streaming conversion: {}", path.display());

    let max_bytes = config.max_input_bytes;
    let read_path = path.clone();
    let pdf = tokio::task::spawn_blocking(move || input::read_input(&read_path, max_bytes))
        .await
        .map_err(|e| Pdf2HtmlError::Internal(format!("input task failed: {e}")))
        .and_then(|r| r)
        .map_err(|e| e.into_conversion(Some(&path)))?;

    Ok(spawn_producer(pdf, Some(path), config.clone()))
}

/// Streaming counterpart of [`crate::convert::convert_from_bytes`].
pub async fn convert_stream_from_bytes(
    bytes: impl Into<Vec<u8>>,
    config: &ConversionConfig,
) -> Result<PageStream, ConversionError> {
    let pdf = input::from_bytes(bytes.into(), config.max_input_bytes)
        .map_err(|e| e.into_conversion(None))?;
    Ok(spawn_producer(pdf, None, config.clone()))
}

fn spawn_producer(pdf: PdfInput, input: Option<PathBuf>, config: ConversionConfig) -> PageStream {
    let (tx, rx) = mpsc::channel::<Result<PageResult, ConversionError>>(STREAM_BUFFER);

    tokio::task::spawn_blocking(move || {
        let fail = |e: Pdf2HtmlError| e.into_conversion(input.as_deref());
        let mut pass = PagePass::new(&config);

        loop {
            let mut pending = None;
            let mut closed = false;
            // Never wait on the consumer while holding the engine: a full
            // channel pauses the pass, which releases the lock.
            let step = pass.resume(&pdf, |page| match tx.try_send(Ok(page)) {
                Ok(()) => ControlFlow::Continue(()),
                Err(TrySendError::Full(item)) => {
                    pending = Some(item);
                    ControlFlow::Break(())
                }
                Err(TrySendError::Closed(_)) => {
                    closed = true;
                    ControlFlow::Break(())
                }
            });

            match step {
                Err(e) => {
                    let _ = tx.blocking_send(Err(fail(e)));
                    return;
                }
                Ok(_) if closed => break,
                Ok(done) => {
                    if let Some(item) = pending {
                        if tx.blocking_send(item).is_err() {
                            break;
                        }
                    }
                    if done {
                        break;
                    }
                }
            }
        }

        match pass.finish() {
            Ok(summary) if summary.stopped_early => {
                debug!("Stream dropped by consumer; stopped early");
            }
            Ok(summary) => {
                debug!(
                    "Stream finished: {}/{} pages",
                    summary.processed, summary.selected
                );
            }
            Err(e) => {
                let _ = tx.blocking_send(Err(fail(e)));
            }
        }
    });

    Box::pin(ReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_input_fails_before_streaming() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            convert_stream(dir.path().join("absent.pdf"), &ConversionConfig::default()).await;
        match result {
            Err(e) => assert!(matches!(e.cause(), Pdf2HtmlError::FileNotFound { .. })),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn non_pdf_bytes_fail_before_streaming() {
        let result =
            convert_stream_from_bytes(b"hello".to_vec(), &ConversionConfig::default()).await;
        match result {
            Err(e) => {
                assert!(e.input().is_none());
                assert!(matches!(e.cause(), Pdf2HtmlError::NotAPdf { .. }));
            }
            Ok(_) => panic!("expected an error"),
        }
    }
}
