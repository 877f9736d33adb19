// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run:
//
//   Step 1: Validate the configuration
//   Step 2: Pick the backend                  (Layer 5 - ml)
//   Step 3: Open the checkpoint directory     (Layer 6 - infra)
//   Step 4: Decide the model config (fresh or from checkpoint)
//           and record the effective config as train_config.json
//   Step 5: Open train / test datasets        (Layer 4 - data)
//   Step 6: Run the training loop             (Layer 5 - ml)

use anyhow::Result;
use burn::{data::dataset::Dataset, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};

use crate::data::dataset::{DataSource, DigitDataset, Split};
use crate::domain::error::ConfigError;
use crate::domain::params::total_numel;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::backend::{dispatch, BackendJob, BackendKind};
use crate::ml::model::{Architecture, ModelConfig};
use crate::ml::trainer::{run_training, TrainSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a training run. Saved as train_config.json in the
// checkpoint directory so evaluation can reuse the data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data:              DataSource,
    /// Number of training images when `data` is synthetic
    pub synthetic_samples: usize,
    pub checkpoint_dir:    String,
    pub arch:              Architecture,
    pub backend:           BackendKind,
    pub epochs:            usize,
    pub batch_size:        usize,
    pub lr:                f64,
    pub dropout:           f64,
    /// Width of the fully-connected hidden layer(s); architecture default if unset
    pub hidden:            Option<usize>,
    pub seed:              u64,
    pub num_workers:       usize,
    /// Print a progress line every this many batches
    pub log_interval:      usize,
    pub train_limit:       Option<usize>,
    pub test_limit:        Option<usize>,
    pub resume:            bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data:              DataSource::Mnist,
            synthetic_samples: 6000,
            checkpoint_dir:    "checkpoints".to_string(),
            arch:              Architecture::Cnn,
            backend:           BackendKind::Ndarray,
            epochs:            1,
            batch_size:        64,
            lr:                1e-3,
            dropout:           0.5,
            hidden:            None,
            seed:              42,
            num_workers:       1,
            log_interval:      100,
            train_limit:       None,
            test_limit:        None,
            resume:            false,
        }
    }
}

impl TrainConfig {
    /// Reject hyper-parameters no run could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.epochs == 0 {
            return invalid("epochs must be at least 1");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return invalid("lr must be a positive number");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid("dropout must be in [0, 1)");
        }
        if self.hidden == Some(0) {
            return invalid("hidden must be at least 1");
        }
        if self.num_workers == 0 {
            return invalid("num_workers must be at least 1");
        }
        if self.log_interval == 0 {
            return invalid("log_interval must be at least 1");
        }
        if self.data == DataSource::Synthetic && self.synthetic_samples == 0 {
            return invalid("synthetic_samples must be at least 1");
        }
        if self.train_limit == Some(0) {
            return invalid("train_limit must be at least 1");
        }
        Ok(())
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig::new(self.arch, self.dropout, self.hidden)
    }

    /// Overwrite the model fields with those of an existing model config.
    pub fn adopt_model(&mut self, model: &ModelConfig) {
        self.arch    = model.arch();
        self.dropout = model.dropout();
        self.hidden  = Some(model.hidden());
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(self) -> Result<TrainSummary> {
        self.config.validate()?;
        dispatch(self.config.backend, self)
    }
}

impl BackendJob for TrainUseCase {
    type Output = TrainSummary;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<TrainSummary> {
        let mut effective = self.config.clone();
        B::seed(effective.seed);

        let ckpt = CheckpointManager::new(&effective.checkpoint_dir)?;

        // A resumed run keeps the model it was started with. A fresh run
        // never writes over another run's epochs and metrics.
        let model_cfg = if effective.resume && ckpt.has_checkpoint() {
            let meta = ckpt.load_meta(ckpt.latest_epoch()?)?;
            if meta.model.arch() != effective.arch {
                tracing::warn!(
                    "Checkpoint holds a {:?} model, ignoring --arch {:?}",
                    meta.model.arch(),
                    effective.arch,
                );
            }
            effective.adopt_model(&meta.model);
            meta.model
        } else if ckpt.has_checkpoint() {
            return Err(ConfigError::Invalid(format!(
                "checkpoint dir '{}' already holds a run; pass --resume or use a new dir",
                effective.checkpoint_dir,
            ))
            .into());
        } else {
            effective.model_config()
        };

        let cfg = &effective;
        ckpt.save_config(cfg)?;
        let metrics = MetricsLogger::new(ckpt.dir())?;

        tracing::info!("Loading {:?} data", cfg.data);
        let train_dataset = DigitDataset::open(cfg.data, Split::Train, cfg.synthetic_samples, cfg.seed)
            .with_limit(cfg.train_limit);
        let test_dataset = DigitDataset::open(cfg.data, Split::Test, cfg.synthetic_samples, cfg.seed)
            .with_limit(cfg.test_limit);
        tracing::info!(
            "Split: {} train, {} test",
            train_dataset.len(),
            test_dataset.len(),
        );

        tracing::info!(
            "Model ready: {:?} with {} parameters",
            model_cfg.arch(),
            total_numel(&model_cfg.manifest()),
        );

        match &model_cfg {
            ModelConfig::Cnn(c) => run_training::<B, _>(
                cfg, &model_cfg, c.init::<B>(&device),
                train_dataset, test_dataset, &ckpt, &metrics, &device,
            ),
            ModelConfig::Mlp(c) => run_training::<B, _>(
                cfg, &model_cfg, c.init::<B>(&device),
                train_dataset, test_dataset, &ckpt, &metrics, &device,
            ),
        }
    }
}
