//! Container format detection from file content.

use std::fmt;

use serde::{Deserialize, Serialize};
use sheetwise_foundation::{Error, Result};

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
const OLE_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const SNIFF_WINDOW: usize = 64 * 1024;
const TEXT_SAMPLE: usize = 8 * 1024;

/// Supported input container formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Office Open XML workbook.
    Xlsx,
    /// Legacy binary (BIFF) workbook.
    Xls,
    /// Delimited text.
    Csv,
}

impl FileFormat {
    /// Detects the format from the leading bytes of a file.
    ///
    /// The file extension is never trusted; a mislabeled file is read by
    /// what it actually contains.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` when the bytes match no supported signature.
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::unsupported_format("file is empty"));
        }
        if bytes.starts_with(ZIP_SIGNATURE) {
            let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
            return if contains(window, b"xl/") || contains(window, b"[Content_Types].xml") {
                Ok(Self::Xlsx)
            } else {
                Err(Error::unsupported_format("zip archive without a workbook"))
            };
        }
        if bytes.starts_with(OLE_SIGNATURE) {
            return Ok(Self::Xls);
        }
        if looks_like_text(bytes) {
            return Ok(Self::Csv);
        }
        Err(Error::unsupported_format(
            "content matches neither Excel nor delimited text",
        ))
    }

    /// Format implied by a file extension, used only to log mismatches.
    #[must_use]
    pub fn from_extension(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xlsx => f.write_str("xlsx"),
            Self::Xls => f.write_str("xls"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Heuristic: text has a BOM, a UTF-16 NUL pattern, or almost no control bytes.
fn looks_like_text(bytes: &[u8]) -> bool {
    if encoding_rs::Encoding::for_bom(bytes).is_some() {
        return true;
    }
    let sample = &bytes[..bytes.len().min(TEXT_SAMPLE)];
    if crate::encoding::utf16_parity(sample).is_some() {
        return true;
    }
    let control = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C))
        .count();
    control * 100 <= sample.len()
}
