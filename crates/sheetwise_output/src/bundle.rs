//! The four documents as one unit, with file output.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use sheetwise_foundation::{Error, ErrorKind, Result};
use tracing::info;

use crate::documents::{
    AutomationRulesDocument, ConfirmationUi, RelationshipsDocument, SchemaDocument,
};

/// File name of the schema document.
pub const SCHEMA_FILE: &str = "schema.json";
/// File name of the relationships document.
pub const RELATIONSHIPS_FILE: &str = "relationships.json";
/// File name of the automation rules document.
pub const AUTOMATION_RULES_FILE: &str = "automation_rules.json";
/// File name of the confirmation UI document.
pub const CONFIRMATION_UI_FILE: &str = "confirmation_ui.json";

/// All four output documents.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputBundle {
    /// `schema.json`
    pub schema: SchemaDocument,
    /// `relationships.json`
    pub relationships: RelationshipsDocument,
    /// `automation_rules.json`
    pub automation_rules: AutomationRulesDocument,
    /// `confirmation_ui.json`
    pub confirmation_ui: ConfirmationUi,
}

impl OutputBundle {
    /// Renders every document as pretty JSON, paired with its file name.
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` error if a document cannot be rendered.
    pub fn to_json(&self) -> Result<Vec<(&'static str, String)>> {
        Ok(vec![
            (SCHEMA_FILE, to_pretty_json(&self.schema)?),
            (RELATIONSHIPS_FILE, to_pretty_json(&self.relationships)?),
            (AUTOMATION_RULES_FILE, to_pretty_json(&self.automation_rules)?),
            (CONFIRMATION_UI_FILE, to_pretty_json(&self.confirmation_ui)?),
        ])
    }

    /// Writes the four documents into `dir`, creating it if needed.
    ///
    /// Returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the directory or a file cannot be written.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            Error::new(ErrorKind::Io(format!(
                "failed to create directory '{}': {e}",
                dir.display()
            )))
        })?;

        let mut written = Vec::new();
        for (name, json) in self.to_json()? {
            let path = dir.join(name);
            fs::write(&path, json).map_err(|e| {
                Error::new(ErrorKind::Io(format!(
                    "failed to write file '{}': {e}",
                    path.display()
                )))
            })?;
            written.push(path);
        }
        info!(dir = %dir.display(), files = written.len(), "wrote documents");
        Ok(written)
    }

    /// Reads the four documents back from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error for a missing file and a `Serialization` error
    /// for a document that does not parse.
    pub fn read_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            schema: read_document(&dir.join(SCHEMA_FILE))?,
            relationships: read_document(&dir.join(RELATIONSHIPS_FILE))?,
            automation_rules: read_document(&dir.join(AUTOMATION_RULES_FILE))?,
            confirmation_ui: read_document(&dir.join(CONFIRMATION_UI_FILE))?,
        })
    }
}

/// Renders a document as pretty JSON.
///
/// # Errors
///
/// Returns a `Serialization` error if rendering fails.
pub fn to_pretty_json<T: Serialize>(document: &T) -> Result<String> {
    serde_json::to_string_pretty(document)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to read file '{}': {e}",
            path.display()
        )))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        Error::new(ErrorKind::Serialization(format!(
            "invalid document '{}': {e}",
            path.display()
        )))
    })
}
