// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Rebuilds a trained model and scores it on the test split.
//
//   Step 1: Resolve the model source (state checkpoint or bundle)
//   Step 2: Resolve data settings: explicit flags, then the run's
//           train_config.json, then defaults
//   Step 3: Rebuild the model in evaluation mode (inner backend)
//   Step 4: Run the evaluator over the test split

use anyhow::Result;
use burn::{data::dataloader::DataLoaderBuilder, prelude::*, tensor::backend::AutodiffBackend};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::DigitBatcher,
    dataset::{DataSource, DigitDataset, Split},
};
use crate::domain::progress::EvalReport;
use crate::infra::{bundle::ModelBundle, checkpoint::CheckpointManager};
use crate::ml::backend::{dispatch, BackendJob, BackendKind};
use crate::ml::evaluator::evaluate;
use crate::ml::model::{Classifier, ModelConfig};

/// Where a trained model is read from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// A state checkpoint; the latest epoch if `epoch` is unset
    Checkpoint { dir: PathBuf, epoch: Option<usize> },
    /// A whole-model bundle file
    Bundle(PathBuf),
}

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub source:            ModelSource,
    pub backend:           BackendKind,
    pub batch_size:        usize,
    pub num_workers:       usize,
    pub test_limit:        Option<usize>,
    pub data:              Option<DataSource>,
    pub synthetic_samples: Option<usize>,
    pub seed:              Option<u64>,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(self) -> Result<EvalReport> {
        dispatch(self.config.backend, self)
    }

    /// Settings of the run that produced the checkpoint, if it left them behind.
    fn saved_train_config(&self) -> TrainConfig {
        let ModelSource::Checkpoint { dir, .. } = &self.config.source else {
            return TrainConfig::default();
        };
        match CheckpointManager::open(dir).and_then(|c| c.load_config()) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!("No saved training config, using defaults: {e:#}");
                TrainConfig::default()
            }
        }
    }

    fn test_dataset(&self) -> DigitDataset {
        let saved = self.saved_train_config();
        let cfg   = &self.config;

        let data    = cfg.data.unwrap_or(saved.data);
        let samples = cfg.synthetic_samples.unwrap_or(saved.synthetic_samples);
        let seed    = cfg.seed.unwrap_or(saved.seed);

        tracing::info!("Evaluating on the {:?} test split", data);
        DigitDataset::open(data, Split::Test, samples, seed).with_limit(cfg.test_limit)
    }

    fn score<B, M>(&self, model: &M, device: &B::Device) -> Result<EvalReport>
    where
        B: Backend,
        M: Classifier<B>,
    {
        let loader = DataLoaderBuilder::new(DigitBatcher::<B>::new(device.clone()))
            .batch_size(self.config.batch_size)
            .num_workers(self.config.num_workers)
            .build(self.test_dataset());
        evaluate(model, loader.iter())
    }
}

impl BackendJob for EvaluateUseCase {
    type Output = EvalReport;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<EvalReport> {
        // Models are built straight on the inner backend: evaluation mode.
        match &self.config.source {
            ModelSource::Checkpoint { dir, epoch } => {
                let ckpt  = CheckpointManager::open(dir)?;
                let epoch = ckpt.resolve_epoch(*epoch)?;
                let meta  = ckpt.load_meta(epoch)?;
                tracing::info!("Evaluating {:?} model from epoch {}", meta.model.arch(), epoch);

                match &meta.model {
                    ModelConfig::Cnn(c) => {
                        let mut model = c.init::<B::InnerBackend>(&device);
                        ckpt.load_model::<B::InnerBackend, _>(epoch, &mut model, &device)?;
                        self.score::<B::InnerBackend, _>(&model, &device)
                    }
                    ModelConfig::Mlp(c) => {
                        let mut model = c.init::<B::InnerBackend>(&device);
                        ckpt.load_model::<B::InnerBackend, _>(epoch, &mut model, &device)?;
                        self.score::<B::InnerBackend, _>(&model, &device)
                    }
                }
            }
            ModelSource::Bundle(path) => {
                let bundle = ModelBundle::load(path)?;
                tracing::info!("Evaluating {:?} model from bundle '{}'", bundle.model.arch(), path.display());

                match bundle.model.clone() {
                    ModelConfig::Cnn(c) => {
                        let template = c.init::<B::InnerBackend>(&device);
                        let model = bundle.into_model::<B::InnerBackend, _>(template, &device)?;
                        self.score::<B::InnerBackend, _>(&model, &device)
                    }
                    ModelConfig::Mlp(c) => {
                        let template = c.init::<B::InnerBackend>(&device);
                        let model = bundle.into_model::<B::InnerBackend, _>(template, &device)?;
                        self.score::<B::InnerBackend, _>(&model, &device)
                    }
                }
            }
        }
    }
}
