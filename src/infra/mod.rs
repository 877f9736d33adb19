// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   checkpoint.rs — State checkpoints: parameters, optimizer
//                   state and epoch counter, saved per epoch
//                   with Burn's NamedMpkFileRecorder.
//
//   bundle.rs     — Whole-model bundles: architecture config
//                   plus weights in one file, tied to the
//                   crate version that wrote it.
//
//   metrics.rs    — Per-epoch CSV log of loss and accuracy.

/// State-only checkpoints
pub mod checkpoint;

/// Whole-model bundles
pub mod bundle;

/// Training metrics CSV logger
pub mod metrics;
