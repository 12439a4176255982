//! PDF engine access: bind PDFium, open documents, pull glyphs, images and
//! metadata out of them.
//!
//! ## Serialised access
//!
//! PDFium keeps global state behind `FPDF_InitLibrary` and is not safe to
//! drive from several threads at once. [`Engine::acquire`] takes a
//! process-wide lock for as long as the returned handle lives, so
//! concurrent conversions queue instead of corrupting each other. All
//! callers run on blocking threads (`spawn_blocking`), never on the async
//! executor.
//!
//! ## Library discovery
//!
//! The pdfium shared library is loaded at runtime. Candidates, first match
//! wins:
//!
//! 1. `PDF2HTML_PDFIUM_PATH` (library file or directory)
//! 2. `PDFIUM_LIB_PATH` (library file or directory)
//! 3. `<user cache dir>/pdf2html/`
//! 4. the current directory
//! 5. the system library search path

use crate::error::Pdf2HtmlError;
use crate::output::DocumentMetadata;
use crate::pipeline::dom::PlacedImage;
use crate::pipeline::encode;
use crate::pipeline::input::PdfInput;
use crate::pipeline::layout::Glyph;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use tracing::{debug, info, warn};

static ENGINE_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Library path that bound successfully earlier in this process.
/// `None` inside the cell means the system library.
static RESOLVED_LIBRARY: OnceLock<Option<PathBuf>> = OnceLock::new();

/// A bound PDFium instance holding the process-wide engine lock.
pub struct Engine {
    pdfium: Pdfium,
    // Declared after `pdfium` so the library is torn down before unlocking.
    _guard: MutexGuard<'static, ()>,
}

impl Engine {
    /// Lock the engine and bind the pdfium library.
    pub fn acquire() -> Result<Self, Pdf2HtmlError> {
        let guard = ENGINE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let pdfium = bind()?;
        Ok(Self {
            pdfium,
            _guard: guard,
        })
    }

    /// Open a validated PDF held in memory.
    ///
    /// The returned document borrows both the engine and the input bytes and
    /// is closed when dropped.
    pub fn open<'a>(
        &'a self,
        input: &'a PdfInput,
        password: Option<&str>,
    ) -> Result<PdfDocument<'a>, Pdf2HtmlError> {
        self.pdfium
            .load_pdf_from_byte_slice(&input.bytes, password)
            .map_err(|e| classify_load_error(&input.path, password.is_some(), &format!("{e:?}")))
    }
}

/// Map a PDFium load failure onto a fatal cause.
fn classify_load_error(path: &Path, had_password: bool, detail: &str) -> Pdf2HtmlError {
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            Pdf2HtmlError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2HtmlError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        Pdf2HtmlError::CorruptPdf {
            path: path.to_path_buf(),
            detail: detail.to_string(),
        }
    }
}

// ── Binding ──────────────────────────────────────────────────────────────────

/// Returns `true` if a pdfium library can be bound in this process.
pub fn is_available() -> bool {
    let _guard = ENGINE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    bind().is_ok()
}

/// Explicit library locations to probe, in priority order.
pub fn library_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    for var in ["PDF2HTML_PDFIUM_PATH", "PDFIUM_LIB_PATH"] {
        if let Ok(p) = std::env::var(var) {
            if !p.is_empty() {
                candidates.push(library_file(Path::new(&p)));
            }
        }
    }

    if let Some(cache) = dirs::cache_dir() {
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(
            &cache.join("pdf2html"),
        ));
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));
    candidates
}

/// A directory resolves to the platform library name inside it.
fn library_file(p: &Path) -> PathBuf {
    if p.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(p)
    } else {
        p.to_path_buf()
    }
}

fn bind() -> Result<Pdfium, Pdf2HtmlError> {
    if let Some(resolved) = RESOLVED_LIBRARY.get() {
        return bind_resolved(resolved.as_deref()).map_err(Pdf2HtmlError::EngineUnavailable);
    }

    let mut failures = Vec::new();
    for candidate in library_candidates() {
        if !candidate.exists() {
            continue;
        }
        match bind_resolved(Some(&candidate)) {
            Ok(pdfium) => {
                info!("Bound pdfium from {}", candidate.display());
                let _ = RESOLVED_LIBRARY.set(Some(candidate));
                return Ok(pdfium);
            }
            Err(e) => {
                warn!("Could not bind pdfium at {}: {}", candidate.display(), e);
                failures.push(format!("{}: {e}", candidate.display()));
            }
        }
    }

    match bind_resolved(None) {
        Ok(pdfium) => {
            info!("Bound system pdfium library");
            let _ = RESOLVED_LIBRARY.set(None);
            Ok(pdfium)
        }
        Err(e) => {
            failures.push(format!("system library: {e}"));
            Err(Pdf2HtmlError::EngineUnavailable(failures.join("; ")))
        }
    }
}

fn bind_resolved(path: Option<&Path>) -> Result<Pdfium, String> {
    let bindings = match path {
        Some(p) => Pdfium::bind_to_library(p),
        None => Pdfium::bind_to_system_library(),
    };
    bindings.map(Pdfium::new).map_err(|e| e.to_string())
}

// ── Extraction ───────────────────────────────────────────────────────────────

/// Page count of an opened document.
pub fn page_count(document: &PdfDocument<'_>) -> usize {
    document.pages().len() as usize
}

/// Load the page at a 0-based index.
pub fn load_page<'a>(document: &PdfDocument<'a>, idx: usize) -> Result<PdfPage<'a>, String> {
    let index = idx
        .try_into()
        .map_err(|_| format!("page index {idx} exceeds the engine's range"))?;
    document.pages().get(index).map_err(|e| format!("{e:?}"))
}

/// Page width and height in points.
pub fn page_size(page: &PdfPage<'_>) -> (f32, f32) {
    (page.width().value, page.height().value)
}

/// Every character on the page, in content-stream order.
///
/// Characters without a Unicode mapping or bounding box are skipped; the
/// engine reports generated line breaks as `\n`/`\r` characters.
pub fn page_glyphs(page: &PdfPage<'_>) -> Result<Vec<Glyph>, String> {
    let text = page.text().map_err(|e| format!("{e:?}"))?;
    let chars = text.chars();

    let mut glyphs = Vec::with_capacity(chars.len() as usize);
    for pdf_char in chars.iter() {
        let Some(ch) = pdf_char.unicode_char() else {
            continue;
        };
        let Ok(bounds) = pdf_char.loose_bounds() else {
            continue;
        };
        let left = bounds.left().value;
        let bottom = bounds.bottom().value;
        glyphs.push(Glyph {
            ch,
            left,
            bottom,
            right: left + bounds.width().value,
            top: bottom + bounds.height().value,
            font_size: pdf_char.scaled_font_size().value,
            font_name: pdf_char.font_name(),
        });
    }

    debug!("Extracted {} glyphs", glyphs.len());
    Ok(glyphs)
}

/// Every raster image on the page, decoded and encoded as a data URI.
///
/// Returns the images that succeeded plus one message per image that did
/// not; a broken image never fails the page.
pub fn page_images(
    page: &PdfPage<'_>,
    page_height: f32,
    max_pixels: u32,
) -> (Vec<PlacedImage>, Vec<String>) {
    let mut images = Vec::new();
    let mut failures = Vec::new();

    for object in page.objects().iter() {
        let Some(image_object) = object.as_image_object() else {
            continue;
        };

        let bounds = match object.bounds() {
            Ok(b) => b,
            Err(e) => {
                failures.push(format!("image bounds: {e:?}"));
                continue;
            }
        };
        let raw = match image_object.get_raw_image() {
            Ok(img) => img,
            Err(e) => {
                failures.push(format!("image decode: {e:?}"));
                continue;
            }
        };
        let src = match encode::encode_data_uri(&raw, max_pixels) {
            Ok(uri) => uri,
            Err(e) => {
                failures.push(format!("image encode: {e}"));
                continue;
            }
        };

        let left = bounds.left().value;
        let bottom = bounds.bottom().value;
        let height = bounds.height().value;
        images.push(PlacedImage {
            left,
            top: page_height - (bottom + height),
            width: bounds.width().value,
            height,
            src,
        });
    }

    (images, failures)
}

/// Read the information dictionary and structural facts of a document.
pub fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: page_count(document),
        pdf_version: format!("{:?}", document.version()),
    }
}
