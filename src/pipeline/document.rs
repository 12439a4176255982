//! Converter core: drive the engine over the selected pages and render each
//! one to its HTML fragment.
//!
//! Runs entirely on the calling thread and must only be called from a
//! blocking context. Pages are handed to `on_page` as soon as they are
//! rendered, which lets the eager API collect them and the streaming API
//! forward them without buffering the whole document.
//!
//! The streaming API drives a [`PagePass`] directly so it can release the
//! engine whenever its channel is full.

use crate::config::{ConversionConfig, ImageMode};
use crate::error::{PageError, Pdf2HtmlError};
use crate::output::{DocumentMetadata, PageResult};
use crate::pipeline::dom::{self, PageContent};
use crate::pipeline::engine::{self, Engine};
use crate::pipeline::input::PdfInput;
use crate::pipeline::layout;
use crate::pipeline::postprocess;
use pdfium_render::prelude::*;
use std::ops::ControlFlow;
use tracing::{debug, info, warn};

/// What a full pass over the document found.
#[derive(Debug, Clone, Default)]
pub struct DocumentSummary {
    pub metadata: DocumentMetadata,
    /// Pages the selection matched.
    pub selected: usize,
    /// Pages rendered without error.
    pub processed: usize,
    pub failed: usize,
    /// Rendered pages with no visible character.
    pub text_free: usize,
    /// True when `on_page` asked to stop before the last page.
    pub stopped_early: bool,
}

/// Open the document only to read its metadata.
pub fn inspect(
    input: &PdfInput,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2HtmlError> {
    let engine = Engine::acquire()?;
    let document = engine.open(input, password)?;
    Ok(engine::read_metadata(&document))
}

/// Convert every selected page, handing each result to `on_page` in page
/// order.
///
/// Fatal problems (engine, password, corrupt file, empty selection, every
/// page failed) are returned as `Err`; a single bad page is reported
/// through its [`PageResult::error`] and the pass continues. Returning
/// `Break` from `on_page` stops the pass after that page.
pub fn render_document<F>(
    input: &PdfInput,
    config: &ConversionConfig,
    on_page: F,
) -> Result<DocumentSummary, Pdf2HtmlError>
where
    F: FnMut(PageResult) -> ControlFlow<()>,
{
    let mut pass = PagePass::new(config);
    pass.resume(input, on_page)?;
    pass.finish()
}

/// A conversion pass that can give the engine back between pages.
///
/// [`PagePass::resume`] holds the engine lock only while it runs. When its
/// consumer returns `Break` the lock is released and a later `resume`
/// reopens the document at the next page, so a paused pass never blocks
/// other engine users.
pub struct PagePass<'c> {
    config: &'c ConversionConfig,
    /// Zero-based page indices, resolved on the first `resume`.
    indices: Option<Vec<usize>>,
    next: usize,
    summary: DocumentSummary,
    first_error: Option<String>,
}

impl<'c> PagePass<'c> {
    pub fn new(config: &'c ConversionConfig) -> Self {
        Self {
            config,
            indices: None,
            next: 0,
            summary: DocumentSummary::default(),
            first_error: None,
        }
    }

    /// True once every selected page has been handed out.
    pub fn is_done(&self) -> bool {
        self.indices
            .as_ref()
            .is_some_and(|indices| self.next >= indices.len())
    }

    /// Render pages until the selection is exhausted or `on_page` returns
    /// `Break`. Returns whether the pass is done.
    pub fn resume<F>(&mut self, input: &PdfInput, mut on_page: F) -> Result<bool, Pdf2HtmlError>
    where
        F: FnMut(PageResult) -> ControlFlow<()>,
    {
        let config = self.config;
        let engine = Engine::acquire()?;
        let document = engine.open(input, config.password.as_deref())?;
        let callback = config.progress_callback.as_ref();

        let indices = match self.indices.take() {
            Some(indices) => {
                debug!("Resuming at selected page {}", self.next + 1);
                indices
            }
            None => {
                let metadata = engine::read_metadata(&document);
                let total_pages = metadata.page_count;
                info!("PDF has {} pages", total_pages);

                let indices = config.pages.to_indices(total_pages);
                if indices.is_empty() {
                    return Err(Pdf2HtmlError::PageOutOfRange {
                        page: config.pages.first_requested(),
                        total: total_pages,
                    });
                }
                debug!("Selected {} pages for conversion", indices.len());

                self.summary.metadata = metadata;
                self.summary.selected = indices.len();
                if let Some(cb) = callback {
                    cb.on_conversion_start(indices.len());
                }
                indices
            }
        };
        let selected = indices.len();

        while let Some(&idx) = indices.get(self.next) {
            self.next += 1;
            let page_num = idx + 1;
            if let Some(cb) = callback {
                cb.on_page_start(page_num, selected);
            }

            let result = render_one(&document, idx, config);

            match &result.error {
                None => {
                    self.summary.processed += 1;
                    if result.char_count == 0 {
                        self.summary.text_free += 1;
                    }
                    if let Some(cb) = callback {
                        cb.on_page_complete(page_num, selected, result.html.len());
                    }
                }
                Some(e) => {
                    self.summary.failed += 1;
                    warn!("{}", e);
                    self.first_error.get_or_insert_with(|| e.to_string());
                    if let Some(cb) = callback {
                        cb.on_page_error(page_num, selected, &e.to_string());
                    }
                }
            }

            if on_page(result).is_break() {
                debug!("Page consumer paused after page {}", page_num);
                break;
            }
        }

        self.indices = Some(indices);
        Ok(self.is_done())
    }

    /// Close the pass, firing the completion callback.
    ///
    /// A pass finished before its last page is marked `stopped_early` and
    /// is never an `AllPagesFailed` error.
    pub fn finish(mut self) -> Result<DocumentSummary, Pdf2HtmlError> {
        self.summary.stopped_early = !self.is_done();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_conversion_complete(self.summary.selected, self.summary.processed);
        }

        if self.summary.processed == 0 && !self.summary.stopped_early {
            return Err(Pdf2HtmlError::AllPagesFailed {
                total: self.summary.selected,
                first_error: self
                    .first_error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        Ok(self.summary)
    }
}

/// Render one page. Never fails: engine errors become a placeholder page.
fn render_one(document: &PdfDocument<'_>, idx: usize, config: &ConversionConfig) -> PageResult {
    let page_num = idx + 1;

    let page = match engine::load_page(document, idx) {
        Ok(p) => p,
        Err(detail) => return failed_page(page_num, 0.0, 0.0, detail),
    };
    let (width, height) = engine::page_size(&page);

    let glyphs = match engine::page_glyphs(&page) {
        Ok(g) => g,
        Err(detail) => return failed_page(page_num, width, height, detail),
    };
    let char_count = layout::visible_chars(&glyphs);

    let runs: Vec<_> = layout::group_runs(&glyphs, height, config.gap_factor)
        .into_iter()
        .filter_map(|mut run| {
            run.text = postprocess::clean_text(&run.text);
            (!run.text.is_empty()).then_some(run)
        })
        .collect();

    let mut warnings = Vec::new();
    let images = match config.image_mode {
        ImageMode::Ignore => Vec::new(),
        ImageMode::EmbedBase64 => {
            let (images, failures) = engine::page_images(&page, height, config.max_image_pixels);
            for detail in failures {
                let w = PageError::ImageFailed {
                    page: page_num,
                    detail,
                };
                warn!("{}", w);
                warnings.push(w);
            }
            images
        }
    };

    let content = PageContent {
        page_num,
        width,
        height,
        runs,
        images,
    };
    let html = dom::render_page(&content);
    debug!(
        "Page {}: {} runs, {} images, {} chars",
        page_num,
        content.runs.len(),
        content.images.len(),
        char_count
    );

    PageResult {
        page_num,
        html,
        width_pt: width,
        height_pt: height,
        run_count: content.runs.len(),
        image_count: content.images.len(),
        char_count,
        error: None,
        warnings,
    }
}

fn failed_page(page_num: usize, width: f32, height: f32, detail: String) -> PageResult {
    let error = PageError::TextFailed {
        page: page_num,
        detail,
    };
    PageResult {
        page_num,
        html: dom::render_failed_page(page_num, width, height, &error.to_string()),
        width_pt: width,
        height_pt: height,
        run_count: 0,
        image_count: 0,
        char_count: 0,
        error: Some(error),
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_pass_is_not_done() {
        let config = ConversionConfig::default();
        let pass = PagePass::new(&config);
        assert!(!pass.is_done());
    }

    #[test]
    fn unopened_pass_finishes_as_stopped_early() {
        let config = ConversionConfig::default();
        let summary = PagePass::new(&config).finish().unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.processed, 0);
    }

    #[test]
    fn failed_page_is_a_placeholder() {
        let r = failed_page(4, 612.0, 792.0, "no text layer".into());
        assert_eq!(r.page_num, 4);
        assert!(matches!(r.error, Some(PageError::TextFailed { page: 4, .. })));
        assert!(r.html.contains(r#"id="page_4""#));
        assert!(r.html.contains("data-error="));
        assert!(r.html.contains("no text layer"));
        assert_eq!(r.run_count, 0);
    }
}
