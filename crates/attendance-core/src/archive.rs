//! ZIP packaging of split records
//!
//! The archive is assembled entirely in memory and only then written out,
//! through a temporary file persisted over the destination, so a failed run
//! never leaves a half-written archive behind.

use crate::error::SplitError;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DEFAULT_ARCHIVE_NAME: &str = "Asistencias_Separadas.zip";

/// Build a deflated ZIP from `(entry name, bytes)` pairs, in order
pub fn build_archive<'a, I>(entries: I) -> Result<Vec<u8>, SplitError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer
            .start_file(name, options)
            .map_err(|e| SplitError::ArchiveError(format!("{}: {}", name, e)))?;
        writer
            .write_all(bytes)
            .map_err(|e| SplitError::ArchiveError(format!("{}: {}", name, e)))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| SplitError::ArchiveError(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Atomically write a sealed archive to `dest`
pub fn write_archive(bytes: &[u8], dest: &Path) -> Result<(), SplitError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| SplitError::ArchiveError(format!("temp file: {}", e)))?;
    tmp.write_all(bytes)
        .map_err(|e| SplitError::ArchiveError(format!("write: {}", e)))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| SplitError::ArchiveError(format!("sync: {}", e)))?;
    tmp.persist(dest)
        .map_err(|e| SplitError::ArchiveError(format!("persist {}: {}", dest.display(), e)))?;

    Ok(())
}
