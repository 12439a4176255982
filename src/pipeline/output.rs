//! Writer: put the HTML at the output path, all or nothing.
//!
//! [`OutputTarget::prepare`] creates a temporary file next to the
//! destination before any conversion work starts, so an unwritable or
//! missing directory fails fast. [`OutputTarget::commit`] writes, flushes
//! and renames over the destination. Dropping an uncommitted target
//! deletes the temporary file and leaves any existing output untouched.

use crate::error::Pdf2HtmlError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A destination reserved for one conversion.
#[derive(Debug)]
pub struct OutputTarget {
    path: PathBuf,
    tmp: NamedTempFile,
}

impl OutputTarget {
    /// Reserve a temporary file in the destination's directory.
    ///
    /// Parent directories are not created.
    pub fn prepare(path: &Path) -> Result<Self, Pdf2HtmlError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix(".pdf2html-").suffix(".tmp");
        // Temp files default to owner-only; the output gets the usual
        // mode of a newly created file (0666 less the umask).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let tmp = builder
            .tempfile_in(parent)
            .map_err(|e| write_failed(path, e))?;
        debug!("Staging output in {}", tmp.path().display());
        Ok(Self {
            path: path.to_path_buf(),
            tmp,
        })
    }

    /// Write `html` as UTF-8 and atomically replace the destination.
    ///
    /// An existing destination keeps its permissions.
    pub fn commit(mut self, html: &str) -> Result<u64, Pdf2HtmlError> {
        let path = self.path;
        self.tmp
            .write_all(html.as_bytes())
            .and_then(|_| self.tmp.flush())
            .map_err(|e| write_failed(&path, e))?;
        if let Ok(existing) = std::fs::metadata(&path) {
            self.tmp
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| write_failed(&path, e))?;
        }
        self.tmp
            .persist(&path)
            .map_err(|e| write_failed(&path, e.error))?;
        debug!("Wrote {} bytes to {}", html.len(), path.display());
        Ok(html.len() as u64)
    }
}

fn write_failed(path: &Path, source: std::io::Error) -> Pdf2HtmlError {
    Pdf2HtmlError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    }
}
