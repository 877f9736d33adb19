// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires the other layers together for one
// command. No tensor math and no console printing here.

// Train (or resume) a model and checkpoint every epoch
pub mod train_use_case;

// Score a checkpoint or bundle on the test split
pub mod evaluate_use_case;

// Convert a state checkpoint into a whole-model bundle
pub mod export_use_case;

// Describe a saved model without loading tensors
pub mod inspect_use_case;
