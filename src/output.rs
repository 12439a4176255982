//! Result types returned by the conversion entry points.

use crate::error::{PageError, Pdf2HtmlError};
use serde::{Deserialize, Serialize};

/// Everything a successful conversion produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The assembled HTML (a full document, or page divs in fragment mode).
    pub html: String,
    /// One entry per selected page, in page order.
    pub pages: Vec<PageResult>,
    /// Document information dictionary.
    pub metadata: DocumentMetadata,
    /// Counters and timings.
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// True when no converted page carried a text layer.
    ///
    /// Such a PDF is almost certainly a scan: the HTML holds only images,
    /// and OCR is needed to get text out of it.
    pub fn is_scanned(&self) -> bool {
        self.stats.processed_pages > 0 && self.stats.text_free_pages == self.stats.processed_pages
    }

    /// Fail if any page failed, for callers with zero tolerance.
    pub fn into_result(self) -> Result<Self, Pdf2HtmlError> {
        let failed = self.pages.iter().filter(|p| p.error.is_some()).count();
        if failed > 0 {
            return Err(Pdf2HtmlError::PartialFailure {
                failed,
                total: self.pages.len(),
            });
        }
        Ok(self)
    }

    /// Serialise the whole output, HTML included, as pretty JSON.
    pub fn to_json(&self) -> Result<String, Pdf2HtmlError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Pdf2HtmlError::Internal(format!("JSON serialisation failed: {e}")))
    }
}

/// The outcome for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// The page's `<div class="page">` fragment. Empty-bodied on failure.
    pub html: String,
    /// Page width in PDF points.
    pub width_pt: f32,
    /// Page height in PDF points.
    pub height_pt: f32,
    /// Positioned text boxes emitted.
    pub run_count: usize,
    /// Images emitted.
    pub image_count: usize,
    /// Visible characters found in the text layer.
    pub char_count: usize,
    /// Set when the page failed; `html` is then a placeholder.
    pub error: Option<PageError>,
    /// Non-fatal problems, such as an image that could not be decoded.
    #[serde(default)]
    pub warnings: Vec<PageError>,
}

/// Counters and timings for a conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Selected pages converted without error.
    pub processed_pages: usize,
    /// Selected pages that failed.
    pub failed_pages: usize,
    /// Document pages not selected.
    pub skipped_pages: usize,
    /// Converted pages with no text layer at all.
    pub text_free_pages: usize,
    /// Size of the input PDF.
    pub input_bytes: u64,
    /// Size of the produced HTML.
    pub output_bytes: u64,
    pub total_duration_ms: u64,
}

/// The PDF information dictionary plus structural facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(processed: usize, text_free: usize, error: Option<PageError>) -> ConversionOutput {
        ConversionOutput {
            html: String::new(),
            pages: vec![PageResult {
                page_num: 1,
                html: String::new(),
                width_pt: 612.0,
                height_pt: 792.0,
                run_count: 0,
                image_count: 1,
                char_count: 0,
                error,
                warnings: Vec::new(),
            }],
            metadata: DocumentMetadata::default(),
            stats: ConversionStats {
                processed_pages: processed,
                text_free_pages: text_free,
                failed_pages: usize::from(processed == 0),
                ..Default::default()
            },
        }
    }

    #[test]
    fn scanned_when_every_page_is_text_free() {
        assert!(output(1, 1, None).is_scanned());
        assert!(!output(2, 1, None).is_scanned());
        assert!(!output(0, 0, None).is_scanned());
    }

    #[test]
    fn into_result_surfaces_page_errors() {
        let err = PageError::TextFailed {
            page: 1,
            detail: "boom".into(),
        };
        assert!(matches!(
            output(0, 0, Some(err)).into_result(),
            Err(Pdf2HtmlError::PartialFailure { failed: 1, total: 1 })
        ));
        assert!(output(1, 0, None).into_result().is_ok());
    }

    #[test]
    fn json_contains_html_and_stats() {
        let mut out = output(1, 0, None);
        out.html = "<p>x</p>".into();
        let json = out.to_json().unwrap();
        assert!(json.contains("\"html\": \"<p>x</p>\""));
        assert!(json.contains("\"processed_pages\": 1"));
    }
}
