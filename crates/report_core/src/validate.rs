use thiserror::Error;

use crate::SelectedFile;

pub const XLSX_MEDIA_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MEDIA_TYPE: &str = "application/vnd.ms-excel";

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid file type. Please upload an Excel file (.xlsx or .xls)")]
    InvalidType,
    #[error("File too large. Maximum size is {}", format_limit(.max_bytes))]
    TooLarge { size: u64, max_bytes: u64 },
    #[error(
        "Invalid file type. Please upload an Excel file (.xlsx or .xls). File too large. Maximum size is {}",
        format_limit(.max_bytes)
    )]
    InvalidTypeAndTooLarge { size: u64, max_bytes: u64 },
}

/// Checks type and size before anything touches the network.
///
/// The extension is a fallback for platforms that report no or a generic
/// media type for office documents.
pub fn validate_selection(file: &SelectedFile, max_bytes: u64) -> Result<(), ValidationError> {
    let type_ok = is_spreadsheet(file);
    let size_ok = file.size <= max_bytes;
    match (type_ok, size_ok) {
        (true, true) => Ok(()),
        (false, true) => Err(ValidationError::InvalidType),
        (true, false) => Err(ValidationError::TooLarge {
            size: file.size,
            max_bytes,
        }),
        (false, false) => Err(ValidationError::InvalidTypeAndTooLarge {
            size: file.size,
            max_bytes,
        }),
    }
}

pub fn is_spreadsheet(file: &SelectedFile) -> bool {
    let declared = file
        .media_type
        .as_deref()
        .map(str::trim)
        .is_some_and(|mt| {
            mt.eq_ignore_ascii_case(XLSX_MEDIA_TYPE) || mt.eq_ignore_ascii_case(XLS_MEDIA_TYPE)
        });
    declared || has_spreadsheet_extension(&file.name)
}

fn has_spreadsheet_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        SPREADSHEET_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    })
}

fn format_limit(max_bytes: &u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if *max_bytes >= MIB && max_bytes % MIB == 0 {
        format!("{}MB", max_bytes / MIB)
    } else {
        format!("{max_bytes} bytes")
    }
}
