// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model, loss and optimiser code lives here.
//
//   model.rs     — the Classifier trait, ModelConfig and the
//                  parameter-manifest helpers
//   cnn.rs       — two-conv-layer digit CNN
//   mlp.rs       — fully-connected baseline
//   backend.rs   — backend selection (ndarray / wgpu)
//   trainer.rs   — per-batch step and the epoch loop
//   evaluator.rs — evaluation pass: mean loss and accuracy
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Classifier trait and serialisable model configs
pub mod model;

/// Convolutional digit classifier
pub mod cnn;

/// Multi-layer perceptron baseline
pub mod mlp;

/// Compute backend selection
pub mod backend;

/// Training loop with evaluation and checkpointing
pub mod trainer;

/// Evaluation pass over held-out batches
pub mod evaluator;
