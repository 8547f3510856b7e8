//! Integration tests for the import engine.
//!
//! Tests drive the full pipeline through in-memory workbooks so that no
//! spreadsheet fixtures are needed on disk.

pub mod pipeline;
