// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores training state (the recommended,
// state-only strategy) with Burn's NamedMpkFileRecorder at
// full precision, so values round-trip bit for bit.
//
// Files per saved epoch n:
//   model_epoch_{n}.mpk          ← parameter values, by name
//   optim_epoch_{n}.mpk          ← Adam moment estimates
//   checkpoint_epoch_{n}.json    ← epoch, model config, parameter manifest
// Plus:
//   latest_epoch.json            ← number of the newest epoch
//   train_config.json            ← the run's TrainConfig
//
// Loading checks the manifest against the target model first,
// so a mismatched checkpoint never modifies the model.
//
// What is saved, and why each part is needed to resume:
//   - Parameters: the learned weights themselves
//   - Adam state: the first and second moment estimates plus
//     the step count. Without them a resumed run restarts with
//     bias-corrected first steps and jumps away from where it was
//   - Epoch counter: tells the loop which epoch comes next
//
// Why name-keyed MessagePack (NamedMpk) and not the compact format?
//   - Every tensor is stored under its module path, so a missing
//     or renamed parameter is visible in the file
//   - FullPrecisionSettings keeps f32 values exactly, which the
//     round-trip tests compare bit for bit
//
// Reference: Burn Book §5 (Checkpointing, Records)

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::CheckpointError;
use crate::domain::params::{check_compatible, ParamInfo};
use crate::ml::model::{Classifier, ModelConfig};

/// Current layout of `checkpoint_epoch_{n}.json`
pub const FORMAT_VERSION: u32 = 1;

type StateRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Metadata stored next to each state checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub format_version: u32,
    pub epoch:          usize,
    pub model:          ModelConfig,
    pub parameters:     Vec<ParamInfo>,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Open (and create if needed) a checkpoint directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(CheckpointError::NotFound(dir).into());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    fn optim_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("optim_epoch_{epoch}"))
    }

    fn meta_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("checkpoint_epoch_{epoch}.json"))
    }

    /// Save parameters, optimizer state and epoch counter.
    pub fn save_state<B, M, O>(
        &self,
        model:     &M,
        optim:     &O,
        model_cfg: &ModelConfig,
        epoch:     usize,
    ) -> Result<()>
    where
        B: AutodiffBackend,
        M: Classifier<B> + AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let recorder = StateRecorder::new();

        let path = self.model_path(epoch);
        Recorder::<B>::record(&recorder, model.clone().into_record(), path.clone())
            .map_err(|e| CheckpointError::Recorder(e.to_string()))
            .with_context(|| format!("Failed to save model state to '{}'", path.display()))?;

        let path = self.optim_path(epoch);
        Recorder::<B>::record(&recorder, optim.to_record(), path.clone())
            .map_err(|e| CheckpointError::Recorder(e.to_string()))
            .with_context(|| format!("Failed to save optimizer state to '{}'", path.display()))?;

        let meta = CheckpointMeta {
            format_version: FORMAT_VERSION,
            epoch,
            model:      model_cfg.clone(),
            parameters: model.parameters(),
        };
        let path = self.meta_path(epoch);
        fs::write(&path, serde_json::to_string_pretty(&meta)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;

        // written last so it never points at a half-written checkpoint
        let latest = self.dir.join("latest_epoch.json");
        fs::write(&latest, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Copy the parameters saved at `epoch` into `model`.
    ///
    /// Fails with a `CheckpointError` if a parameter is missing, unexpected
    /// or has a different shape; `model` is left untouched in that case.
    pub fn load_model<B, M>(
        &self,
        epoch:  usize,
        model:  &mut M,
        device: &B::Device,
    ) -> Result<CheckpointMeta>
    where
        B: Backend,
        M: Classifier<B>,
    {
        let meta = self.load_meta(epoch)?;
        let expected = model.parameters();
        check_compatible(&expected, &meta.parameters)?;

        let path = self.model_path(epoch);
        let record: <M as Module<B>>::Record = Recorder::<B>::load(&StateRecorder::new(), path.clone(), device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))
            .with_context(|| format!("Cannot load model state '{}'", path.display()))?;

        let candidate = model.clone().load_record(record);
        check_compatible(&expected, &candidate.parameters())?;
        *model = candidate;

        tracing::info!("Loaded model parameters from epoch {}", epoch);
        Ok(meta)
    }

    /// Restore optimizer state saved at `epoch`.
    /// The model must have been loaded from the same epoch first so
    /// parameter ids line up with the saved moment estimates.
    pub fn load_optimizer<B, M, O>(
        &self,
        epoch:  usize,
        optim:  O,
        device: &B::Device,
    ) -> Result<O>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let path = self.optim_path(epoch);
        let record: <O as Optimizer<M, B>>::Record = Recorder::<B>::load(&StateRecorder::new(), path.clone(), device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))
            .with_context(|| format!("Cannot load optimizer state '{}'", path.display()))?;

        tracing::info!("Loaded optimizer state from epoch {}", epoch);
        Ok(optim.load_record(record))
    }

    pub fn load_meta(&self, epoch: usize) -> Result<CheckpointMeta> {
        let path = self.meta_path(epoch);
        let json = fs::read_to_string(&path)
            .map_err(|_| CheckpointError::NotFound(path.clone()))
            .with_context(|| format!("No checkpoint for epoch {} in '{}'", epoch, self.dir.display()))?;
        let meta: CheckpointMeta = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt checkpoint metadata '{}'", path.display()))?;

        if meta.format_version != FORMAT_VERSION {
            return Err(CheckpointError::FormatVersion {
                found:    meta.format_version,
                expected: FORMAT_VERSION,
            }
            .into());
        }
        Ok(meta)
    }

    /// True once at least one epoch has been saved here
    pub fn has_checkpoint(&self) -> bool {
        self.dir.join("latest_epoch.json").exists()
    }

    /// Read latest_epoch.json and return the epoch number.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .map_err(|_| CheckpointError::NotFound(self.dir.clone()))
            .with_context(|| "Cannot find 'latest_epoch.json'. Have you run 'train' first?")?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    /// `epoch` if given, otherwise the latest saved epoch
    pub fn resolve_epoch(&self, epoch: Option<usize>) -> Result<usize> {
        match epoch {
            Some(e) => Ok(e),
            None    => self.latest_epoch(),
        }
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::DigitBatcher;
    use crate::data::synthetic::SyntheticDigits;
    use crate::ml::cnn::{DigitCnn, DigitCnnConfig};
    use crate::ml::mlp::MlpConfig;
    use crate::ml::model::Architecture;
    use crate::ml::trainer::train_step;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataloader::batcher::Batcher;
    use burn::optim::AdamConfig;

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    /// Every parameter value of the CNN as raw bits, weights first, then biases
    fn cnn_bits<B: Backend>(model: &DigitCnn<B>) -> Vec<u32> {
        let mut tensors: Vec<Tensor<B, 1>> = vec![
            model.conv1.weight.val().flatten(0, 3),
            model.conv2.weight.val().flatten(0, 3),
            model.fc1.weight.val().flatten(0, 1),
            model.fc2.weight.val().flatten(0, 1),
        ];
        for bias in [&model.conv1.bias, &model.conv2.bias, &model.fc1.bias, &model.fc2.bias]
            .into_iter()
            .flatten()
        {
            tensors.push(bias.val());
        }
        tensors
            .into_iter()
            .flat_map(|t| t.into_data().to_vec::<f32>().unwrap())
            .map(f32::to_bits)
            .collect()
    }

    fn trained_cnn(
        device: &<TestAutodiffBackend as Backend>::Device,
    ) -> (
        DigitCnn<TestAutodiffBackend>,
        impl Optimizer<DigitCnn<TestAutodiffBackend>, TestAutodiffBackend>,
    ) {
        let mut model = DigitCnnConfig::new().with_dropout(0.0).init::<TestAutodiffBackend>(device);
        let mut optim = AdamConfig::new().init();
        let batch = DigitBatcher::<TestAutodiffBackend>::new(device.clone())
            .batch(SyntheticDigits::new(9).generate(8));
        let (next, _) = train_step(model, &mut optim, batch, 1e-3).unwrap();
        model = next;
        (model, optim)
    }

    fn cnn_config() -> ModelConfig {
        ModelConfig::new(Architecture::Cnn, 0.0, None)
    }

    #[test]
    fn state_round_trip_is_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let (model, optim) = trained_cnn(&device);
        ckpt.save_state::<TestAutodiffBackend, _, _>(&model, &optim, &cnn_config(), 3).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 3);

        let mut fresh = DigitCnnConfig::new().with_dropout(0.0).init::<TestAutodiffBackend>(&device);
        assert_ne!(cnn_bits(&fresh), cnn_bits(&model));

        let meta = ckpt.load_model::<TestAutodiffBackend, _>(3, &mut fresh, &device).unwrap();
        assert_eq!(meta.epoch, 3);
        assert_eq!(cnn_bits(&fresh), cnn_bits(&model));
    }

    #[test]
    fn restored_optimizer_continues_like_an_uninterrupted_run() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let device: <TestAutodiffBackend as Backend>::Device = Default::default();

        let init = DigitCnnConfig::new().with_dropout(0.0).init::<TestAutodiffBackend>(&device);
        let batcher = DigitBatcher::<TestAutodiffBackend>::new(device.clone());
        let mut digits = SyntheticDigits::new(4);
        let first  = batcher.batch(digits.generate(8));
        let second = batcher.batch(digits.generate(8));

        // two steps without interruption
        let mut optim = AdamConfig::new().init();
        let (model, _) = train_step(init.clone(), &mut optim, first.clone(), 1e-3).unwrap();
        let (model, _) = train_step(model, &mut optim, second.clone(), 1e-3).unwrap();
        let expected = cnn_bits(&model);

        // one step, save, restore into fresh instances, second step
        let mut optim = AdamConfig::new().init();
        let (model, _) = train_step(init, &mut optim, first, 1e-3).unwrap();
        ckpt.save_state::<TestAutodiffBackend, _, _>(&model, &optim, &cnn_config(), 1).unwrap();

        let mut restored_model = DigitCnnConfig::new().with_dropout(0.0).init::<TestAutodiffBackend>(&device);
        ckpt.load_model::<TestAutodiffBackend, _>(1, &mut restored_model, &device).unwrap();
        let mut restored = ckpt
            .load_optimizer::<TestAutodiffBackend, DigitCnn<TestAutodiffBackend>, _>(1, AdamConfig::new().init(), &device)
            .unwrap();
        let (resumed, _) = train_step(restored_model, &mut restored, second.clone(), 1e-3).unwrap();
        assert_eq!(cnn_bits(&resumed), expected);

        // a fresh Adam on the same restored parameters takes a different step
        let mut control_model = DigitCnnConfig::new().with_dropout(0.0).init::<TestAutodiffBackend>(&device);
        ckpt.load_model::<TestAutodiffBackend, _>(1, &mut control_model, &device).unwrap();
        let mut fresh = AdamConfig::new().init();
        let (control, _) = train_step(control_model, &mut fresh, second, 1e-3).unwrap();
        assert_ne!(cnn_bits(&control), expected);
    }

    #[test]
    fn shape_mismatch_fails_and_leaves_model_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let (model, optim) = trained_cnn(&device);
        ckpt.save_state::<TestAutodiffBackend, _, _>(&model, &optim, &cnn_config(), 1).unwrap();

        let mut wider = DigitCnnConfig::new()
            .with_hidden(64)
            .with_dropout(0.0)
            .init::<TestAutodiffBackend>(&device);
        let before = cnn_bits(&wider);

        let err = ckpt.load_model::<TestAutodiffBackend, _>(1, &mut wider, &device).unwrap_err();
        match err.downcast_ref::<CheckpointError>() {
            Some(CheckpointError::ShapeMismatch { name, .. }) => assert_eq!(name, "fc1.weight"),
            other => panic!("expected a shape mismatch, got {other:?}"),
        }
        assert_eq!(cnn_bits(&wider), before);
    }

    #[test]
    fn other_architecture_reports_missing_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let mlp = MlpConfig::new().init::<TestAutodiffBackend>(&device);
        let optim = AdamConfig::new().init();
        let mlp_cfg = ModelConfig::new(Architecture::Mlp, 0.2, None);
        ckpt.save_state::<TestAutodiffBackend, _, _>(&mlp, &optim, &mlp_cfg, 1).unwrap();

        let mut cnn = DigitCnnConfig::new().init::<TestAutodiffBackend>(&device);
        let before = cnn_bits(&cnn);
        let err = ckpt.load_model::<TestAutodiffBackend, _>(1, &mut cnn, &device).unwrap_err();
        match err.downcast_ref::<CheckpointError>() {
            Some(CheckpointError::MissingParameter { name }) => assert_eq!(name, "conv1.weight"),
            other => panic!("expected a missing parameter, got {other:?}"),
        }
        assert_eq!(cnn_bits(&cnn), before);
    }

    #[test]
    fn missing_epoch_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(!ckpt.has_checkpoint());
        assert!(ckpt.latest_epoch().is_err());

        let err = ckpt.load_meta(5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckpointError>(),
            Some(CheckpointError::NotFound(_))
        ));
    }

    #[test]
    fn open_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::open(dir.path()).is_ok());
        assert!(CheckpointManager::open(dir.path().join("nope")).is_err());
    }

    #[test]
    fn config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg = TrainConfig { epochs: 7, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap().epochs, 7);
    }
}
