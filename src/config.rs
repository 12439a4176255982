//! Configuration types for PDF-to-HTML conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Every knob lives in one struct so a
//! config can be shared across threads, logged, and compared between runs.

use crate::error::Pdf2HtmlError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default input size limit: 50 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 50 * 1024 * 1024;

/// Configuration for a PDF-to-HTML conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2html::{ConversionConfig, ImageMode, PageSelection};
///
/// let config = ConversionConfig::builder()
///     .pages(PageSelection::Range(1, 3))
///     .image_mode(ImageMode::Ignore)
///     .standalone(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// How embedded images are handled. Default: [`ImageMode::EmbedBase64`].
    pub image_mode: ImageMode,

    /// Longest edge, in pixels, of an embedded image. Default: 4096.
    ///
    /// Larger bitmaps are downscaled before PNG encoding so a single scanned
    /// page cannot balloon the HTML to hundreds of megabytes.
    pub max_image_pixels: u32,

    /// Emit a complete `<!DOCTYPE html>` document. Default: true.
    ///
    /// When false only the page `<div>`s are produced, ready to be spliced
    /// into a host page.
    pub standalone: bool,

    /// Emit `<meta>` tags for author, subject, creator and producer. Default: false.
    pub include_metadata: bool,

    /// Overrides the `<title>`; otherwise the PDF title or the file stem is used.
    pub title: Option<String>,

    /// Inputs larger than this are rejected before the engine sees them. Default: 50 MiB.
    pub max_input_bytes: u64,

    /// Horizontal gap, as a multiple of the font size, that splits a text run. Default: 0.6.
    ///
    /// Lower values produce more, smaller boxes that track the original
    /// spacing closely; higher values merge words into longer runs.
    pub gap_factor: f32,

    /// Optional per-page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pages: PageSelection::default(),
            password: None,
            image_mode: ImageMode::default(),
            max_image_pixels: 4096,
            standalone: true,
            include_metadata: false,
            title: None,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            gap_factor: 0.6,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("image_mode", &self.image_mode)
            .field("max_image_pixels", &self.max_image_pixels)
            .field("standalone", &self.standalone)
            .field("include_metadata", &self.include_metadata)
            .field("title", &self.title)
            .field("max_input_bytes", &self.max_input_bytes)
            .field("gap_factor", &self.gap_factor)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn image_mode(mut self, mode: ImageMode) -> Self {
        self.config.image_mode = mode;
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.max_image_pixels = px.max(16);
        self
    }

    pub fn standalone(mut self, v: bool) -> Self {
        self.config.standalone = v;
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn max_input_bytes(mut self, bytes: u64) -> Self {
        self.config.max_input_bytes = bytes;
        self
    }

    /// Unlike the other setters this one is not clamped; `build()` rejects
    /// values outside 0.1–5.0.
    pub fn gap_factor(mut self, factor: f32) -> Self {
        self.config.gap_factor = factor;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2HtmlError> {
        let c = &self.config;
        if !(0.1..=5.0).contains(&c.gap_factor) {
            return Err(Pdf2HtmlError::InvalidConfig(format!(
                "gap factor must be 0.1–5.0, got {}",
                c.gap_factor
            )));
        }
        if c.max_input_bytes == 0 {
            return Err(Pdf2HtmlError::InvalidConfig(
                "max input size must be ≥ 1 byte".into(),
            ));
        }
        if let PageSelection::Range(start, end) = c.pages {
            if start == 0 || start > end {
                return Err(Pdf2HtmlError::InvalidConfig(format!(
                    "invalid page range {start}-{end}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What to do with raster images placed on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageMode {
    /// Decode each image and inline it as a `data:image/png;base64,…` URI. (default)
    #[default]
    EmbedBase64,
    /// Drop images; output carries text only.
    Ignore,
}

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// The first page this selection names, for error reporting.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(s, _) => *s,
            PageSelection::Set(v) => v.iter().copied().min().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.pages, PageSelection::All);
        assert_eq!(c.image_mode, ImageMode::EmbedBase64);
        assert!(c.standalone);
        assert!(!c.include_metadata);
        assert_eq!(c.max_input_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn builder_rejects_bad_gap_factor() {
        let err = ConversionConfig::builder().gap_factor(0.0).build().unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::InvalidConfig(_)));
        assert!(ConversionConfig::builder().gap_factor(1.5).build().is_ok());
    }

    #[test]
    fn builder_rejects_inverted_range() {
        let err = ConversionConfig::builder()
            .pages(PageSelection::Range(5, 2))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("5-2"), "got: {err}");
    }

    #[test]
    fn builder_rejects_zero_size_limit() {
        assert!(ConversionConfig::builder().max_input_bytes(0).build().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ConversionConfig::builder()
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(2).to_indices(3), vec![1]);
        assert_eq!(PageSelection::Single(4).to_indices(3), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 9).to_indices(4), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3, 0]).to_indices(5),
            vec![0, 2]
        );
    }

    #[test]
    fn first_requested_page() {
        assert_eq!(PageSelection::Set(vec![9, 4]).first_requested(), 4);
        assert_eq!(PageSelection::Range(3, 5).first_requested(), 3);
    }
}
