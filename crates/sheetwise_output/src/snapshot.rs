//! Analysis snapshots in `MessagePack`.
//!
//! A snapshot holds a whole [`AnalysisResult`], so documents can be
//! regenerated later without reading the workbook again.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use sheetwise_engine::AnalysisResult;
use sheetwise_foundation::{Error, ErrorKind, Result};

/// Serializes an analysis to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(result: &AnalysisResult) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(result).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Deserializes an analysis from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8]) -> Result<AnalysisResult> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Saves an analysis to a file, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(result: &AnalysisResult, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| io_error("create", path, &e))?;
    let bytes = to_bytes(result)?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to", path, &e))?;
    writer.flush().map_err(|e| io_error("flush", path, &e))?;
    Ok(())
}

/// Loads an analysis from a snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<AnalysisResult> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open", path, &e))?;

    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read", path, &e))?;
    from_bytes(&bytes)
}

fn io_error(verb: &str, path: &Path, err: &std::io::Error) -> Error {
    Error::new(ErrorKind::Io(format!(
        "failed to {verb} file '{}': {err}",
        path.display()
    )))
}
