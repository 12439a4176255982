//! Input stage: open the user-supplied path and read the PDF bytes.
//!
//! The engine is handed bytes rather than a path, so the file handle is
//! opened, drained and closed here and never outlives this stage. Cheap
//! checks (empty, too large, wrong magic) run before PDFium is bound so a
//! wrong input fails fast with a precise cause.

use crate::error::Pdf2HtmlError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// PDF readers accept a header anywhere in the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Path reported for PDFs that never lived on disk.
pub const IN_MEMORY_PATH: &str = "<memory>";

/// A validated PDF held in memory.
#[derive(Debug)]
pub struct PdfInput {
    /// Where the bytes came from; a placeholder for in-memory input.
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl PdfInput {
    /// Size of the PDF in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File stem of the input, used as a fallback document title.
    pub fn stem(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty() && s != IN_MEMORY_PATH)
    }
}

/// Read and validate the PDF at `path`.
pub fn read_input(path: &Path, max_bytes: u64) -> Result<PdfInput, Pdf2HtmlError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Pdf2HtmlError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => Pdf2HtmlError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2HtmlError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let read_err = |e| Pdf2HtmlError::InputReadFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let meta = file.metadata().map_err(read_err)?;
    if meta.is_dir() {
        return Err(Pdf2HtmlError::InputReadFailed {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "path is a directory"),
        });
    }
    if meta.len() > max_bytes {
        return Err(Pdf2HtmlError::FileTooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            limit: max_bytes,
        });
    }

    // The file can grow between stat and read; never read past the limit.
    let mut bytes = Vec::with_capacity(meta.len() as usize);
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(read_err)?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    validate(path.to_path_buf(), bytes, max_bytes)
}

/// Validate a PDF that is already in memory.
pub fn from_bytes(bytes: Vec<u8>, max_bytes: u64) -> Result<PdfInput, Pdf2HtmlError> {
    validate(PathBuf::from(IN_MEMORY_PATH), bytes, max_bytes)
}

fn validate(path: PathBuf, bytes: Vec<u8>, max_bytes: u64) -> Result<PdfInput, Pdf2HtmlError> {
    if bytes.is_empty() {
        return Err(Pdf2HtmlError::EmptyFile { path });
    }
    if bytes.len() as u64 > max_bytes {
        return Err(Pdf2HtmlError::FileTooLarge {
            path,
            size: bytes.len() as u64,
            limit: max_bytes,
        });
    }
    if !has_pdf_header(&bytes) {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(Pdf2HtmlError::NotAPdf { path, magic });
    }
    Ok(PdfInput { path, bytes })
}

/// Check for the `%PDF` marker within the header search window.
pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(4).any(|w| w == b"%PDF")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &[u8] = b"%PDF-1.4\n%%EOF\n";

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f
    }

    #[test]
    fn reads_a_pdf() {
        let f = write_temp(MINIMAL);
        let input = read_input(f.path(), 1024).unwrap();
        assert_eq!(input.bytes, MINIMAL);
        assert_eq!(input.len(), MINIMAL.len() as u64);
    }

    #[test]
    fn unlimited_read_keeps_every_byte() {
        let f = write_temp(MINIMAL);
        let input = read_input(f.path(), u64::MAX).unwrap();
        assert_eq!(input.bytes, MINIMAL);
    }

    #[test]
    fn missing_file() {
        let err = read_input(Path::new("/definitely/not/here.pdf"), 1024).unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::FileNotFound { .. }));
    }

    #[test]
    fn empty_file() {
        let f = write_temp(b"");
        let err = read_input(f.path(), 1024).unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::EmptyFile { .. }));
    }

    #[test]
    fn text_file_is_not_a_pdf() {
        let f = write_temp(b"hello, this is plain text");
        match read_input(f.path(), 1024).unwrap_err() {
            Pdf2HtmlError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn oversize_file() {
        let f = write_temp(MINIMAL);
        let err = read_input(f.path(), 4).unwrap_err();
        assert!(matches!(
            err,
            Pdf2HtmlError::FileTooLarge { size, limit: 4, .. } if size == MINIMAL.len() as u64
        ));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(dir.path(), 1024).unwrap_err();
        assert!(matches!(
            err,
            Pdf2HtmlError::InputReadFailed { .. } | Pdf2HtmlError::PermissionDenied { .. }
        ));
    }

    #[test]
    fn header_after_junk_is_accepted() {
        let mut bytes = vec![b' '; 100];
        bytes.extend_from_slice(MINIMAL);
        assert!(has_pdf_header(&bytes));
        assert!(from_bytes(bytes, 1024).is_ok());
    }

    #[test]
    fn header_outside_window_is_rejected() {
        let mut bytes = vec![b'x'; HEADER_SEARCH_WINDOW];
        bytes.extend_from_slice(MINIMAL);
        assert!(!has_pdf_header(&bytes));
    }

    #[test]
    fn short_input_magic_is_padded() {
        match from_bytes(b"ab".to_vec(), 1024).unwrap_err() {
            Pdf2HtmlError::NotAPdf { magic, .. } => assert_eq!(magic, [b'a', b'b', 0, 0]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn stem_from_path() {
        let input = PdfInput {
            path: PathBuf::from("/tmp/report-2024.pdf"),
            bytes: MINIMAL.to_vec(),
        };
        assert_eq!(input.stem().as_deref(), Some("report-2024"));

        let in_memory = from_bytes(MINIMAL.to_vec(), 1024).unwrap();
        assert_eq!(in_memory.stem(), None);
    }
}
