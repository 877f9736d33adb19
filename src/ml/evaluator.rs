// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a model over held-out batches and reports the mean
// cross-entropy loss and the number of correct predictions.
//
// Callers pass a model in evaluation mode: either built directly
// on a non-autodiff backend or obtained with `model.valid()`.

use anyhow::Result;
use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

use crate::data::batcher::DigitBatch;
use crate::domain::progress::EvalReport;
use crate::ml::model::{check_output, Classifier};

/// Score `model` over `batches`: per-sample mean loss and argmax hits.
pub fn evaluate<B, M, I>(model: &M, batches: I) -> Result<EvalReport>
where
    B: Backend,
    M: Classifier<B>,
    I: IntoIterator<Item = DigitBatch<B>>,
{
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in batches {
        batch.validate()?;
        let n = batch.len();

        let logits = model.forward(batch.images);
        check_output(&logits, n, model.num_classes())?;

        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss: f64 = ce
            .forward(logits.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        // mean loss per batch, weighted so the report is a per-sample mean
        loss_sum += loss * n as f64;

        // argmax(1) returns [batch, 1]; flatten to [batch] before comparing
        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        correct += hits as usize;
        total   += n;
    }

    let avg_loss = if total > 0 { loss_sum / total as f64 } else { f64::NAN };
    tracing::debug!("Evaluated {} samples, {} correct", total, correct);

    Ok(EvalReport { avg_loss, correct, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::DigitBatcher;
    use crate::data::synthetic::SyntheticDigits;
    use crate::ml::mlp::MlpConfig;
    use burn::backend::NdArray;
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend = NdArray<f32>;

    #[test]
    fn counts_every_sample_once() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model = MlpConfig::new().with_hidden(16).init::<TestBackend>(&device);
        let batcher = DigitBatcher::<TestBackend>::new(device.clone());
        let mut digits = SyntheticDigits::new(2);
        let batches = vec![
            batcher.batch(digits.generate(7)),
            batcher.batch(digits.generate(5)),
        ];

        let report = evaluate(&model, batches).unwrap();
        assert_eq!(report.total, 12);
        assert!(report.correct <= 12);
        assert!(report.avg_loss.is_finite() && report.avg_loss > 0.0);
    }

    #[test]
    fn no_batches_gives_empty_report() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model = MlpConfig::new().with_hidden(16).init::<TestBackend>(&device);
        let report = evaluate(&model, Vec::<DigitBatch<TestBackend>>::new()).unwrap();
        assert_eq!(report.total, 0);
        assert!(report.avg_loss.is_nan());
    }
}
