// ============================================================
// Layer 2 — ExportUseCase
// ============================================================
// Turns a state checkpoint into a whole-model bundle.
// Runs on the CPU backend: export never needs a GPU.

use anyhow::Result;
use burn::backend::NdArray;
use std::path::PathBuf;

use crate::infra::{bundle::ModelBundle, checkpoint::CheckpointManager};
use crate::ml::model::ModelConfig;

type Cpu = NdArray<f32>;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub checkpoint_dir: PathBuf,
    /// Latest epoch if unset
    pub epoch:          Option<usize>,
    pub output:         PathBuf,
}

pub struct ExportUseCase {
    config: ExportConfig,
}

impl ExportUseCase {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Returns the path of the written bundle.
    pub fn execute(&self) -> Result<PathBuf> {
        let cfg   = &self.config;
        let ckpt  = CheckpointManager::open(&cfg.checkpoint_dir)?;
        let epoch = ckpt.resolve_epoch(cfg.epoch)?;
        let meta  = ckpt.load_meta(epoch)?;
        let device = Default::default();

        let bundle = match &meta.model {
            ModelConfig::Cnn(c) => {
                let mut model = c.init::<Cpu>(&device);
                ckpt.load_model::<Cpu, _>(epoch, &mut model, &device)?;
                ModelBundle::from_model::<Cpu, _>(&model, &meta.model)?
            }
            ModelConfig::Mlp(c) => {
                let mut model = c.init::<Cpu>(&device);
                ckpt.load_model::<Cpu, _>(epoch, &mut model, &device)?;
                ModelBundle::from_model::<Cpu, _>(&model, &meta.model)?
            }
        };

        bundle.save(&cfg.output)?;
        tracing::info!("Exported epoch {} as a bundle", epoch);
        Ok(cfg.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::evaluate_use_case::{EvaluateConfig, EvaluateUseCase, ModelSource};
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::data::dataset::DataSource;
    use crate::domain::error::CheckpointError;
    use crate::ml::backend::BackendKind;
    use crate::ml::model::Architecture;

    fn evaluate(source: ModelSource) -> crate::domain::progress::EvalReport {
        EvaluateUseCase::new(EvaluateConfig {
            source,
            backend:           BackendKind::Ndarray,
            batch_size:        16,
            num_workers:       1,
            test_limit:        None,
            data:              Some(DataSource::Synthetic),
            synthetic_samples: Some(100),
            seed:              Some(42),
        })
        .execute()
        .unwrap()
    }

    #[test]
    fn exported_bundle_scores_like_the_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt_dir = dir.path().join("ckpt");
        TrainUseCase::new(TrainConfig {
            data:              DataSource::Synthetic,
            synthetic_samples: 100,
            checkpoint_dir:    ckpt_dir.to_string_lossy().into_owned(),
            arch:              Architecture::Cnn,
            batch_size:        16,
            log_interval:      1000,
            ..TrainConfig::default()
        })
        .execute()
        .unwrap();

        let output = ExportUseCase::new(ExportConfig {
            checkpoint_dir: ckpt_dir.clone(),
            epoch:          None,
            output:         dir.path().join("out").join("digits.bundle.json"),
        })
        .execute()
        .unwrap();
        assert!(output.exists());

        let from_bundle = evaluate(ModelSource::Bundle(output));
        let from_state  = evaluate(ModelSource::Checkpoint { dir: ckpt_dir, epoch: Some(1) });
        assert_eq!(from_bundle, from_state);
    }

    #[test]
    fn exporting_an_unknown_epoch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExportUseCase::new(ExportConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            epoch:          Some(3),
            output:         dir.path().join("x.json"),
        })
        .execute()
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CheckpointError>(),
            Some(CheckpointError::NotFound(_))
        ));
    }
}
