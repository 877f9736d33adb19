// ============================================================
// Layer 5 — Model Contract
// ============================================================
// Every architecture implements `Classifier`:
//
//   forward(images [N,1,28,28]) → logits [N,num_classes]
//   parameters()                → ordered (name, shape) list
//
// Why a named parameter list on top of Burn's Module?
//   - Checkpoint metadata stores it, so a checkpoint can be
//     checked against a model before any tensor is read
//   - `inspect` can print a model's layout from JSON alone
//
// `ModelConfig` is the serialisable choice of architecture.
// It is written into every checkpoint and bundle, so loading
// code can rebuild the right model without extra flags.

use burn::{
    nn::{conv::Conv2d, Linear},
    prelude::*,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::data::dataset::NUM_CLASSES;
use crate::domain::error::ConfigError;
use crate::domain::params::ParamInfo;
use crate::ml::cnn::DigitCnnConfig;
use crate::ml::mlp::MlpConfig;

/// A model mapping an image batch [N, 1, 28, 28] to class logits [N, num_classes].
///
/// Training mode is the model on an autodiff backend (dropout active).
/// Evaluation mode is `AutodiffModule::valid()`, which moves the model to
/// the inner backend where dropout is a no-op.
pub trait Classifier<B: Backend>: Module<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;

    fn num_classes(&self) -> usize;

    /// Ordered, named shapes of every trainable tensor
    fn parameters(&self) -> Vec<ParamInfo>;
}

/// Check the model contract: logits are [batch, num_classes].
pub fn check_output<B: Backend>(
    logits:  &Tensor<B, 2>,
    batch:   usize,
    classes: usize,
) -> Result<(), ConfigError> {
    let dims = logits.dims();
    if dims != [batch, classes] {
        return Err(ConfigError::OutputShape { found: dims.to_vec(), batch, classes });
    }
    Ok(())
}

pub(crate) fn push_conv2d<B: Backend>(out: &mut Vec<ParamInfo>, name: &str, layer: &Conv2d<B>) {
    out.push(ParamInfo::new(format!("{name}.weight"), layer.weight.val().dims()));
    if let Some(bias) = &layer.bias {
        out.push(ParamInfo::new(format!("{name}.bias"), bias.val().dims()));
    }
}

pub(crate) fn push_linear<B: Backend>(out: &mut Vec<ParamInfo>, name: &str, layer: &Linear<B>) {
    out.push(ParamInfo::new(format!("{name}.weight"), layer.weight.val().dims()));
    if let Some(bias) = &layer.bias {
        out.push(ParamInfo::new(format!("{name}.bias"), bias.val().dims()));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// Two conv layers, dropout, two fully-connected layers
    #[default]
    Cnn,
    /// Three fully-connected layers over the flattened image
    Mlp,
}

/// Serialisable description of which model to build.
/// Stored in every checkpoint so evaluation can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelConfig {
    Cnn(DigitCnnConfig),
    Mlp(MlpConfig),
}

impl ModelConfig {
    /// Build the default configuration of an architecture with the given dropout.
    /// `hidden` overrides the width of the fully-connected hidden layer(s).
    pub fn new(arch: Architecture, dropout: f64, hidden: Option<usize>) -> Self {
        match arch {
            Architecture::Cnn => {
                let mut cfg = DigitCnnConfig::new()
                    .with_num_classes(NUM_CLASSES)
                    .with_dropout(dropout);
                if let Some(hidden) = hidden {
                    cfg = cfg.with_hidden(hidden);
                }
                ModelConfig::Cnn(cfg)
            }
            Architecture::Mlp => {
                let mut cfg = MlpConfig::new()
                    .with_num_classes(NUM_CLASSES)
                    .with_dropout(dropout);
                if let Some(hidden) = hidden {
                    cfg = cfg.with_hidden(hidden);
                }
                ModelConfig::Mlp(cfg)
            }
        }
    }

    pub fn arch(&self) -> Architecture {
        match self {
            ModelConfig::Cnn(_) => Architecture::Cnn,
            ModelConfig::Mlp(_) => Architecture::Mlp,
        }
    }

    pub fn num_classes(&self) -> usize {
        match self {
            ModelConfig::Cnn(c) => c.num_classes,
            ModelConfig::Mlp(c) => c.num_classes,
        }
    }

    pub fn dropout(&self) -> f64 {
        match self {
            ModelConfig::Cnn(c) => c.dropout,
            ModelConfig::Mlp(c) => c.dropout,
        }
    }

    /// Width of the fully-connected hidden layer(s)
    pub fn hidden(&self) -> usize {
        match self {
            ModelConfig::Cnn(c) => c.hidden,
            ModelConfig::Mlp(c) => c.hidden,
        }
    }

    /// Shape-only manifest of the model this config builds,
    /// computed on the CPU backend.
    pub fn manifest(&self) -> Vec<ParamInfo> {
        type Cpu = burn::backend::NdArray<f32>;
        let device = Default::default();
        match self {
            ModelConfig::Cnn(c) => Classifier::<Cpu>::parameters(&c.init::<Cpu>(&device)),
            ModelConfig::Mlp(c) => Classifier::<Cpu>::parameters(&c.init::<Cpu>(&device)),
        }
    }
}
