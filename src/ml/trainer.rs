// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over Burn's DataLoader with Adam.
//
// Per batch:
//   validate shape → forward → cross-entropy → backward → Adam step
//
// Per epoch:
//   model.valid() → evaluate on the test set → summary line
//   → metrics.csv row → state checkpoint
//
// Gradients are returned fresh by every `backward()` call, so
// there is nothing to clear between steps.
//
// Training runs on B (autodiff, dropout active). Evaluation runs
// on B::InnerBackend via `model.valid()` (dropout off).
//
// Adam update, per parameter θ with gradient g:
//   m = β1*m + (1-β1)*g        (mean)
//   v = β2*v + (1-β2)*g²       (variance)
//   θ = θ - lr * m̂ / (√v̂ + ε)  (update, m̂ and v̂ bias-corrected)
//
// Resume:
//   With `resume` set, the latest checkpoint's parameters and
//   Adam state are loaded and the loop starts at latest + 1.
//   The loader's shuffle restarts from the seed.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{DigitBatch, DigitBatcher},
    dataset::DigitDataset,
};
use crate::domain::error::ConfigError;
use crate::domain::progress::{epoch_line, EpochProgress, EvalReport};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::evaluator::evaluate;
use crate::ml::model::{check_output, Classifier, ModelConfig};

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    /// First epoch trained in this run (greater than 1 after a resume)
    pub start_epoch:  usize,
    /// Epoch number of the last checkpoint on disk
    pub last_epoch:   usize,
    pub final_report: EvalReport,
}

/// One optimisation step on one batch.
/// Returns the updated model and the batch loss before the update.
pub fn train_step<B, M, O>(model: M, optim: &mut O, batch: DigitBatch<B>, lr: f64) -> Result<(M, f64)>
where
    B: AutodiffBackend,
    M: Classifier<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    batch.validate()?;
    let n = batch.len();

    let logits = model.forward(batch.images);
    check_output(&logits, n, model.num_classes())?;

    let loss = CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, batch.targets);
    let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

    let grads = GradientsParams::from_grads(loss.backward(), &model);
    let model = optim.step(lr, model, grads);

    Ok((model, loss_val))
}

/// Train `model` from the first missing epoch up to `cfg.epochs`.
///
/// Each epoch ends with an evaluation pass in evaluation mode, one
/// metrics row and one checkpoint. With `cfg.resume` the parameters
/// and Adam state of the latest checkpoint replace `model` first.
#[allow(clippy::too_many_arguments)]
pub fn run_training<B, M>(
    cfg:           &TrainConfig,
    model_cfg:     &ModelConfig,
    mut model:     M,
    train_dataset: DigitDataset,
    test_dataset:  DigitDataset,
    ckpt:          &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        &B::Device,
) -> Result<TrainSummary>
where
    B: AutodiffBackend,
    M: Classifier<B> + AutodiffModule<B>,
    M::InnerModule: Classifier<B::InnerBackend>,
{
    let train_total = train_dataset.len();
    if train_total == 0 {
        return Err(ConfigError::Invalid("training set is empty".to_string()).into());
    }

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<B, M>();

    // ── Resume ────────────────────────────────────────────────────────────────
    let mut start_epoch = 1;
    if cfg.resume {
        if ckpt.has_checkpoint() {
            let latest = ckpt.latest_epoch()?;
            ckpt.load_model::<B, M>(latest, &mut model, device)?;
            optim = ckpt.load_optimizer::<B, M, _>(latest, optim, device)?;
            start_epoch = latest + 1;
            tracing::info!("Resuming after epoch {}", latest);
        } else {
            tracing::warn!("--resume given but no checkpoint found, starting fresh");
        }
    }

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(DigitBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    let test_loader = DataLoaderBuilder::new(DigitBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(test_dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut best_test_loss = f64::INFINITY;
    let mut last_report    = None;

    for epoch in start_epoch..=cfg.epochs {
        let mut progress = EpochProgress::new(epoch, train_total);

        for batch in train_loader.iter() {
            let n = batch.len();
            let (next, loss) = train_step(model, &mut optim, batch, cfg.lr)?;
            model = next;

            progress.record(n, loss);
            if progress.batches() % cfg.log_interval == 0 {
                println!("{}", progress.line());
            }
        }

        let train_loss = progress.running_loss();
        tracing::debug!(
            "Epoch {} trained on {} samples in {} batches",
            epoch,
            progress.seen(),
            progress.batches(),
        );

        // dropout off for a deterministic evaluation
        let model_valid = model.valid();
        let report = evaluate(&model_valid, test_loader.iter())?;
        println!("{}", epoch_line(epoch, cfg.epochs, train_loss, &report));

        let row = EpochMetrics::new(epoch, train_loss, &report);
        if row.is_improvement(best_test_loss) {
            best_test_loss = row.test_loss;
            tracing::info!("New best test loss {:.4} at epoch {}", best_test_loss, epoch);
        }
        metrics.log(&row)?;

        ckpt.save_state::<B, M, _>(&model, &optim, model_cfg, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);

        last_report = Some(report);
    }

    let final_report = match last_report {
        Some(report) => report,
        None => {
            tracing::info!("Already trained for {} epochs, nothing to do", cfg.epochs);
            evaluate(&model.valid(), test_loader.iter())?
        }
    };

    println!(
        "Final test accuracy: {}/{} ({:.2}%)",
        final_report.correct,
        final_report.total,
        final_report.accuracy() * 100.0,
    );
    tracing::info!("Training complete! Metrics in '{}'", metrics.csv_path().display());

    Ok(TrainSummary {
        start_epoch,
        last_epoch: cfg.epochs.max(start_epoch - 1),
        final_report,
    })
}
