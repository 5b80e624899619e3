//! Integration tests for Layer 1: Loader
//!
//! Tests format detection, delimited text and Excel workbooks.

mod workbook;
