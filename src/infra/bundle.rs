// ============================================================
// Layer 6 — Whole-Model Bundle
// ============================================================
// Packs a model's architecture config and its weights into a
// single file that can be reloaded without knowing the
// architecture up front.
//
// Caveat: the weights are an opaque MessagePack blob tied to
// this crate's model definitions. A bundle only loads in the
// same crate version that wrote it. Use state checkpoints
// (infra::checkpoint) for anything long-lived.
//
// Why JSON around a MessagePack blob?
//   - The architecture and manifest stay readable with any
//     text tool, so `inspect` needs no tensor decoding
//   - The blob is burn's named record, the same format the
//     state checkpoints use, so loading goes through one path

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::domain::error::CheckpointError;
use crate::domain::params::{check_compatible, ParamInfo};
use crate::ml::model::{Classifier, ModelConfig};

type BundleRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub crate_version: String,
    pub model:         ModelConfig,
    pub parameters:    Vec<ParamInfo>,
    pub weights:       Vec<u8>,
}

impl ModelBundle {
    pub fn from_model<B, M>(model: &M, model_cfg: &ModelConfig) -> Result<Self>
    where
        B: Backend,
        M: Classifier<B>,
    {
        let weights = Recorder::<B>::record(&BundleRecorder::new(), model.clone().into_record(), ())
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;

        Ok(Self {
            crate_version: CRATE_VERSION.to_string(),
            model:         model_cfg.clone(),
            parameters:    model.parameters(),
            weights,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec(self)?)
            .with_context(|| format!("Cannot write bundle '{}'", path.display()))?;
        tracing::info!("Wrote model bundle to '{}'", path.display());
        Ok(())
    }

    /// Read a bundle, rejecting one written by another crate version.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|_| CheckpointError::NotFound(path.to_path_buf()))
            .with_context(|| format!("Cannot read bundle '{}'", path.display()))?;
        let bundle: ModelBundle = serde_json::from_slice(&bytes)
            .with_context(|| format!("Corrupt bundle '{}'", path.display()))?;

        if bundle.crate_version != CRATE_VERSION {
            return Err(CheckpointError::VersionMismatch {
                found:    bundle.crate_version,
                expected: CRATE_VERSION.to_string(),
            }
            .into());
        }
        Ok(bundle)
    }

    /// Load the bundled weights into `model`, which must be built from `self.model`.
    pub fn into_model<B, M>(self, model: M, device: &B::Device) -> Result<M>
    where
        B: Backend,
        M: Classifier<B>,
    {
        let expected = model.parameters();
        check_compatible(&expected, &self.parameters)?;

        let record: <M as Module<B>>::Record = Recorder::<B>::load(&BundleRecorder::new(), self.weights, device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
        Ok(model.load_record(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::IMAGE_SIZE;
    use crate::ml::mlp::MlpConfig;
    use crate::ml::model::Architecture;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn mlp_config() -> ModelConfig {
        ModelConfig::new(Architecture::Mlp, 0.0, Some(24))
    }

    fn build(cfg: &ModelConfig) -> crate::ml::mlp::MlpClassifier<TestBackend> {
        match cfg {
            ModelConfig::Mlp(c) => c.init::<TestBackend>(&Default::default()),
            ModelConfig::Cnn(_) => unreachable!(),
        }
    }

    #[test]
    fn bundle_round_trip_reproduces_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bundle.json");
        let device: <TestBackend as Backend>::Device = Default::default();

        let cfg = mlp_config();
        let model = build(&cfg);
        ModelBundle::from_model::<TestBackend, _>(&model, &cfg).unwrap().save(&path).unwrap();

        let bundle = ModelBundle::load(&path).unwrap();
        assert_eq!(bundle.model.arch(), Architecture::Mlp);
        let restored = bundle.into_model::<TestBackend, _>(build(&mlp_config()), &device).unwrap();

        let images = Tensor::<TestBackend, 4>::ones([2, 1, IMAGE_SIZE, IMAGE_SIZE], &device);
        let a = model.forward(images.clone()).into_data().to_vec::<f32>().unwrap();
        let b = restored.forward(images).into_data().to_vec::<f32>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn other_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.bundle.json");

        let cfg = mlp_config();
        let mut bundle = ModelBundle::from_model::<TestBackend, _>(&build(&cfg), &cfg).unwrap();
        bundle.crate_version = "0.0.0-old".to_string();
        bundle.save(&path).unwrap();

        let err = ModelBundle::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckpointError>(),
            Some(CheckpointError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn mismatched_template_is_rejected() {
        let cfg = mlp_config();
        let bundle = ModelBundle::from_model::<TestBackend, _>(&build(&cfg), &cfg).unwrap();
        let wider = MlpConfig::new().with_hidden(48).init::<TestBackend>(&Default::default());
        let err = bundle.into_model::<TestBackend, _>(wider, &Default::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckpointError>(),
            Some(CheckpointError::ShapeMismatch { .. })
        ));
    }
}
