// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Subcommands `train`, `evaluate`, `export`, `inspect` and
// their flags. Conversions at the bottom turn clap types into
// application-layer configs.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    evaluate_use_case::{EvaluateConfig, ModelSource},
    export_use_case::ExportConfig,
    train_use_case::TrainConfig,
};
use crate::data::dataset::DataSource;
use crate::ml::backend::BackendKind;
use crate::ml::model::Architecture;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a digit classifier, checkpointing after every epoch
    Train(TrainArgs),

    /// Score a checkpoint or bundle on the test split
    Evaluate(EvaluateArgs),

    /// Write a state checkpoint out as a single-file bundle
    Export(ExportArgs),

    /// Show the architecture and parameter shapes of a saved model
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Where training images come from
    #[arg(long, value_enum, default_value_t = DataSource::Mnist)]
    pub data: DataSource,

    /// Training images to generate with `--data synthetic`
    #[arg(long, default_value_t = 6000)]
    pub synthetic_samples: usize,

    /// Directory for checkpoints, metrics.csv and train_config.json
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, value_enum, default_value_t = Architecture::Cnn)]
    pub arch: Architecture,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Dropout probability while training
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Width of the fully-connected hidden layer(s)
    #[arg(long)]
    pub hidden: Option<usize>,

    /// Seeds weight init, dropout, shuffling and synthetic data
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Print a progress line every N batches
    #[arg(long, default_value_t = 100)]
    pub log_interval: usize,

    /// Use only the first N training images
    #[arg(long)]
    pub train_limit: Option<usize>,

    /// Use only the first N test images
    #[arg(long)]
    pub test_limit: Option<usize>,

    /// Continue from the latest checkpoint in --checkpoint-dir
    #[arg(long)]
    pub resume: bool,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data:              a.data,
            synthetic_samples: a.synthetic_samples,
            checkpoint_dir:    a.checkpoint_dir,
            arch:              a.arch,
            backend:           a.backend,
            epochs:            a.epochs,
            batch_size:        a.batch_size,
            lr:                a.lr,
            dropout:           a.dropout,
            hidden:            a.hidden,
            seed:              a.seed,
            num_workers:       a.num_workers,
            log_interval:      a.log_interval,
            train_limit:       a.train_limit,
            test_limit:        a.test_limit,
            resume:            a.resume,
        }
    }
}

/// Selects a saved model: a checkpoint directory or a bundle file.
#[derive(Args, Debug)]
pub struct SourceArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Epoch to load; the latest if omitted
    #[arg(long)]
    pub epoch: Option<usize>,

    /// Read a bundle file instead of a checkpoint directory
    #[arg(long, conflicts_with = "epoch")]
    pub bundle: Option<PathBuf>,
}

impl From<SourceArgs> for ModelSource {
    fn from(a: SourceArgs) -> Self {
        match a.bundle {
            Some(path) => ModelSource::Bundle(path),
            None       => ModelSource::Checkpoint { dir: a.checkpoint_dir, epoch: a.epoch },
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,

    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Use only the first N test images
    #[arg(long)]
    pub test_limit: Option<usize>,

    /// Overrides the data source saved with the checkpoint
    #[arg(long, value_enum)]
    pub data: Option<DataSource>,

    #[arg(long)]
    pub synthetic_samples: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            source:            a.source.into(),
            backend:           a.backend,
            batch_size:        a.batch_size,
            num_workers:       a.num_workers,
            test_limit:        a.test_limit,
            data:              a.data,
            synthetic_samples: a.synthetic_samples,
            seed:              a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Epoch to export; the latest if omitted
    #[arg(long)]
    pub epoch: Option<usize>,

    /// Bundle file to write
    #[arg(long, default_value = "model.bundle.json")]
    pub output: PathBuf,
}

impl From<ExportArgs> for ExportConfig {
    fn from(a: ExportArgs) -> Self {
        ExportConfig {
            checkpoint_dir: a.checkpoint_dir,
            epoch:          a.epoch,
            output:         a.output,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}
