// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Two families of fatal errors:
//   ConfigError     — bad hyper-parameters, bad batch shapes,
//                     a backend that was not compiled in
//   CheckpointError — anything that stops a checkpoint or a
//                     bundle from loading into a model
//
// Both are plain thiserror enums so callers holding an
// anyhow::Error can still `downcast_ref` to the exact variant.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("batch is empty")]
    EmptyBatch,

    #[error("batch shape mismatch: images {images:?} vs targets {targets:?}")]
    BatchShape {
        images:  Vec<usize>,
        targets: Vec<usize>,
    },

    #[error("model produced {found:?}, expected [{batch}, {classes}]")]
    OutputShape {
        found:   Vec<usize>,
        batch:   usize,
        classes: usize,
    },

    #[error("backend '{0}' is not available in this build (enable the cargo feature)")]
    BackendUnavailable(&'static str),
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("no checkpoint found in '{0}'")]
    NotFound(PathBuf),

    #[error("checkpoint is missing parameter '{name}'")]
    MissingParameter { name: String },

    #[error("checkpoint has unexpected parameter '{name}'")]
    UnexpectedParameter { name: String },

    #[error("shape mismatch for '{name}': model expects {expected:?}, checkpoint has {found:?}")]
    ShapeMismatch {
        name:     String,
        expected: Vec<usize>,
        found:    Vec<usize>,
    },

    #[error("unsupported checkpoint format version {found} (expected {expected})")]
    FormatVersion { found: u32, expected: u32 },

    #[error("bundle was written by version {found}, this build is {expected}")]
    VersionMismatch { found: String, expected: String },

    #[error("recorder failure: {0}")]
    Recorder(String),
}
