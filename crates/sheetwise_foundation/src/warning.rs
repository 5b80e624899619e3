//! Warnings surfaced for human review.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How urgently a warning needs attention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational; the result is usable as is.
    Low,
    /// Part of the workbook was skipped or guessed.
    Medium,
    /// The generated schema is likely wrong without a fix.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("LOW"),
            Self::Medium => f.write_str("MEDIUM"),
            Self::High => f.write_str("HIGH"),
        }
    }
}

/// A non-fatal finding about the analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Severity.
    pub severity: Severity,
    /// What was found.
    pub message: String,
    /// What a reviewer could do about it.
    pub suggestion: Option<String>,
    /// Affected entity id, if any.
    pub entity: Option<String>,
}

impl Warning {
    /// Creates a warning without suggestion or entity.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            suggestion: None,
            entity: None,
        }
    }

    /// Creates a low-severity warning.
    #[must_use]
    pub fn low(message: impl Into<String>) -> Self {
        Self::new(Severity::Low, message)
    }

    /// Creates a medium-severity warning.
    #[must_use]
    pub fn medium(message: impl Into<String>) -> Self {
        Self::new(Severity::Medium, message)
    }

    /// Creates a high-severity warning.
    #[must_use]
    pub fn high(message: impl Into<String>) -> Self {
        Self::new(Severity::High, message)
    }

    /// Attaches a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attaches the affected entity.
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}
