// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Describes a saved model without loading any tensors:
// architecture, epoch and the parameter manifest.
//
// Example output:
//   Source:       checkpoints (epoch 3)
//   Architecture: Cnn
//   fc1.weight    [320, 50]    16000
//   ...
//   Total parameters: 21840

use anyhow::Result;

use crate::application::evaluate_use_case::ModelSource;
use crate::domain::params::{total_numel, ParamInfo};
use crate::infra::{bundle::ModelBundle, checkpoint::CheckpointManager};
use crate::ml::model::ModelConfig;

#[derive(Debug, Clone)]
pub struct InspectReport {
    pub source:     String,
    pub model:      ModelConfig,
    pub parameters: Vec<ParamInfo>,
}

impl InspectReport {
    pub fn total_parameters(&self) -> usize {
        total_numel(&self.parameters)
    }

    pub fn lines(&self) -> Vec<String> {
        let width = self
            .parameters
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(0);

        let mut out = vec![
            format!("Source:       {}", self.source),
            format!("Architecture: {:?}", self.model.arch()),
            format!("Classes:      {}", self.model.num_classes()),
        ];
        for p in &self.parameters {
            out.push(format!(
                "{:<width$}  {:<14}  {:>8}",
                p.name,
                format!("{:?}", p.shape),
                p.numel(),
            ));
        }
        out.push(format!("Total parameters: {}", self.total_parameters()));
        out
    }
}

pub struct InspectUseCase {
    source: ModelSource,
}

impl InspectUseCase {
    pub fn new(source: ModelSource) -> Self {
        Self { source }
    }

    pub fn execute(&self) -> Result<InspectReport> {
        match &self.source {
            ModelSource::Checkpoint { dir, epoch } => {
                let ckpt  = CheckpointManager::open(dir)?;
                let epoch = ckpt.resolve_epoch(*epoch)?;
                let meta  = ckpt.load_meta(epoch)?;
                Ok(InspectReport {
                    source:     format!("{} (epoch {})", dir.display(), meta.epoch),
                    model:      meta.model,
                    parameters: meta.parameters,
                })
            }
            ModelSource::Bundle(path) => {
                let bundle = ModelBundle::load(path)?;
                Ok(InspectReport {
                    source:     format!("{} (bundle, version {})", path.display(), bundle.crate_version),
                    model:      bundle.model,
                    parameters: bundle.parameters,
                })
            }
        }
    }
}
