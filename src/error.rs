//! Error types for a write operation.
//!
//! Every variant is fatal: the write stops at the first error and the binary
//! artifact on disk (if any) must be treated as unusable.

use std::io;
use thiserror::Error;

/// A convenience `Result` type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Failure reported by a result encoder.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid result data: {0}")]
    Invalid(String),
}

/// Failure of a whole write operation.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("post = {post_mode}; use -1 or -2")]
    Configuration { post_mode: i32 },

    #[error("Table {table:?} ({kind}, subcase={subcase}) is not in the canonical table order")]
    UnknownTable { table: String, kind: String, subcase: i32 },

    #[error("No encoder registered for {kind} (table {table}, subcase={subcase})")]
    MissingEncoder { kind: String, table: String, subcase: i32 },

    #[error("Table {table} was dispatched but produced no results")]
    EmptyGroup { table: String },

    #[error("total_case_count = 0; nothing was written")]
    EmptyOutput,

    #[error("{kind} - table {table}, subcase={subcase}{}: {source}", element_suffix(.element))]
    Encoding {
        kind:    String,
        table:   String,
        subcase: i32,
        element: Option<String>,
        #[source]
        source:  EncodeError,
    },

    /// The encoder broke its contract of returning a smaller table index.
    #[error("{kind} - table {table}, subcase={subcase}: itable went from {before} to {after}")]
    NonMonotonicTableIndex {
        kind:    String,
        table:   String,
        subcase: i32,
        before:  i32,
        after:   i32,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn element_suffix(element: &Option<String>) -> String {
    match element {
        Some(name) => format!(" - {name}"),
        None       => String::new(),
    }
}
