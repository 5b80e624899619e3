//! Integration tests for Layer 1: Table
//!
//! Tests region detection and normalization on loaded sheets.

mod normalize;
mod regions;
