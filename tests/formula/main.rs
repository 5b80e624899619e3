//! Integration tests for Layer 3: Formula
//!
//! Tests parsing, pattern recognition and translation against entities
//! extracted from real sheets.

mod parsing;
mod translation;
