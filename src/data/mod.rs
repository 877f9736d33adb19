// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
//
//   MnistDataset / SyntheticDigits
//       │
//       ▼
//   DigitDataset   → implements Burn's Dataset trait, optional cap
//       │
//       ▼
//   DigitBatcher   → stacks items into normalised tensor batches
//       │
//       ▼
//   DataLoader     → shuffles (train) and prefetches batches

/// Digit dataset sources and splits
pub mod dataset;

/// Seeded in-memory digit patterns
pub mod synthetic;

/// Burn Batcher producing image/target tensors
pub mod batcher;
