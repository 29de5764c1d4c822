use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use report_core::{SelectedFile, XLSX_MEDIA_TYPE, XLS_MEDIA_TYPE};

/// Reads a file the way a picker hands it over: name, declared type, size, bytes.
///
/// Files above `max_bytes` are not read; the descriptor carries the size so the
/// core can reject it.
pub fn load_selection(path: &Path, max_bytes: u64) -> Result<SelectedFile> {
    let metadata =
        fs::metadata(path).with_context(|| format!("cannot access {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} does not name a file", path.display()))?;
    let media_type = declared_media_type(&name);

    if metadata.len() > max_bytes {
        return Ok(SelectedFile {
            name,
            media_type,
            size: metadata.len(),
            contents: Bytes::new(),
        });
    }

    let contents = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(SelectedFile::new(name, media_type, contents))
}

/// Declared type for the two spreadsheet extensions; anything else is undeclared.
fn declared_media_type(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let media_type = match ext.to_ascii_lowercase().as_str() {
        "xlsx" => XLSX_MEDIA_TYPE,
        "xls" => XLS_MEDIA_TYPE,
        _ => return None,
    };
    Some(media_type.to_string())
}
