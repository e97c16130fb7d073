//! Batch archive packaging (zip).
//!
//! Entry names are unique within an archive: when two entries share a name the
//! later entry's bytes win and the entry keeps the earlier position.

use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::utils::{StudioError, StudioResult};

/// One named file inside the batch archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

/// Packages `entries` into a zip buffer. An empty list yields a valid empty
/// archive.
pub fn archive(entries: Vec<ArchiveEntry>) -> StudioResult<Vec<u8>> {
    let entries = dedupe(entries);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    // Fixed timestamp so identical inputs give identical archives
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    for entry in &entries {
        writer
            .start_file(entry.name.clone(), options)
            .map_err(|e| StudioError::archive(format!("Failed to add {}: {}", entry.name, e)))?;
        writer
            .write_all(&entry.bytes)
            .map_err(|e| StudioError::archive(format!("Failed to write {}: {}", entry.name, e)))?;
    }

    let bytes = writer
        .finish()
        .map_err(|e| StudioError::archive(format!("Failed to finish archive: {e}")))?
        .into_inner();

    debug!("Packed {} entries into {} bytes", entries.len(), bytes.len());
    Ok(bytes)
}

fn dedupe(entries: Vec<ArchiveEntry>) -> Vec<ArchiveEntry> {
    let mut unique: Vec<ArchiveEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match unique.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => {
                debug!("Duplicate archive entry {}, keeping the later bytes", entry.name);
                existing.bytes = entry.bytes;
            }
            None => unique.push(entry),
        }
    }
    unique
}
