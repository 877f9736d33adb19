// ============================================================
// Layer 3 — Parameter Manifest
// ============================================================
// A framework-free description of a model's trainable tensors:
// an ordered list of (name, shape) pairs.
//
// The manifest is written next to every checkpoint and compared
// against the target model before any weights are copied, so a
// mismatched load fails without touching the model.

use serde::{Deserialize, Serialize};

use crate::domain::error::CheckpointError;

/// One named trainable tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name:  String,
    pub shape: Vec<usize>,
}

impl ParamInfo {
    pub fn new(name: impl Into<String>, shape: impl Into<Vec<usize>>) -> Self {
        Self {
            name:  name.into(),
            shape: shape.into(),
        }
    }

    /// Number of scalar values in this tensor
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Total scalar count across a manifest
pub fn total_numel(params: &[ParamInfo]) -> usize {
    params.iter().map(ParamInfo::numel).sum()
}

/// Check that `found` (from a checkpoint) can be loaded into a model
/// whose parameter set is `expected`.
///
/// Names are matched by name, not by position. The first problem
/// found in `expected` order is reported.
pub fn check_compatible(expected: &[ParamInfo], found: &[ParamInfo]) -> Result<(), CheckpointError> {
    for want in expected {
        match found.iter().find(|p| p.name == want.name) {
            None => {
                return Err(CheckpointError::MissingParameter { name: want.name.clone() });
            }
            Some(have) if have.shape != want.shape => {
                return Err(CheckpointError::ShapeMismatch {
                    name:     want.name.clone(),
                    expected: want.shape.clone(),
                    found:    have.shape.clone(),
                });
            }
            Some(_) => {}
        }
    }

    if let Some(extra) = found
        .iter()
        .find(|p| !expected.iter().any(|want| want.name == p.name))
    {
        return Err(CheckpointError::UnexpectedParameter { name: extra.name.clone() });
    }

    Ok(())
}
