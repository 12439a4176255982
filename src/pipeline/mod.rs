//! Pipeline stages for PDF-to-HTML conversion.
//!
//! Each submodule implements one step. Everything except [`engine`] is
//! plain Rust over plain data, so the layout, markup and text rules are
//! tested without a PDFium library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine ──▶ layout ──▶ postprocess ──▶ dom ──▶ output
//! (bytes)   (pdfium)   (runs)     (text fixes)    (HTML)  (atomic write)
//!              └──────▶ encode (images → data URIs)
//! ```
//!
//! 1. [`input`]    — read and validate the PDF bytes
//! 2. [`engine`]   — bind PDFium, open the document, pull glyphs and images
//! 3. [`layout`]   — group glyphs into positioned text runs
//! 4. [`postprocess`] — deterministic text clean-up per run
//! 5. [`encode`]   — PNG-encode images as `data:` URIs
//! 6. [`dom`]      — emit page divs and the document wrapper
//! 7. [`document`] — drive steps 2–6 over the selected pages
//! 8. [`output`]   — temp file + rename into place

pub mod document;
pub mod dom;
pub mod encode;
pub mod engine;
pub mod input;
pub mod layout;
pub mod output;
pub mod postprocess;
