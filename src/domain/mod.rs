// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer.
// No Burn types and no file I/O in here.

/// Typed error taxonomy (configuration vs checkpoint errors)
pub mod error;

/// Named parameter manifest and compatibility check
pub mod params;

/// Running epoch statistics and console lines
pub mod progress;
