// ============================================================
// Layer 3 — Progress Tracking
// ============================================================
// Running statistics for one epoch of training plus the
// human-readable lines printed to the console.
//
// Example output:
//   Epoch   1 [ 6400/60000 ( 10.7%)] running_loss=0.842113
//   Epoch   1 | train_loss=0.4127 | test_loss=0.1390 | accuracy=9581/10000 (95.81%)

use serde::{Deserialize, Serialize};

/// Accumulates loss and sample counts while an epoch runs.
#[derive(Debug, Clone)]
pub struct EpochProgress {
    epoch:    usize,
    total:    usize,
    seen:     usize,
    batches:  usize,
    loss_sum: f64,
}

impl EpochProgress {
    pub fn new(epoch: usize, total: usize) -> Self {
        Self { epoch, total, seen: 0, batches: 0, loss_sum: 0.0 }
    }

    /// Record one finished batch
    pub fn record(&mut self, batch_size: usize, loss: f64) {
        self.seen     += batch_size;
        self.batches  += 1;
        self.loss_sum += loss;
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Share of the epoch done, in percent. An empty dataset counts as done.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.seen as f64 * 100.0 / self.total as f64
        }
    }

    /// Mean loss over the batches seen so far (NaN before the first batch)
    pub fn running_loss(&self) -> f64 {
        if self.batches == 0 {
            f64::NAN
        } else {
            self.loss_sum / self.batches as f64
        }
    }

    pub fn line(&self) -> String {
        format!(
            "Epoch {:>3} [{:>5}/{:>5} ({:>5.1}%)] running_loss={:.6}",
            self.epoch,
            self.seen,
            self.total,
            self.percent(),
            self.running_loss(),
        )
    }
}

/// Result of one evaluation-mode pass over a held-out set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub avg_loss: f64,
    pub correct:  usize,
    pub total:    usize,
}

impl EvalReport {
    /// Fraction of correct predictions in [0, 1]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn line(&self) -> String {
        format!(
            "Test set: avg_loss={:.4} | accuracy={}/{} ({:.2}%)",
            self.avg_loss,
            self.correct,
            self.total,
            self.accuracy() * 100.0,
        )
    }
}

/// The per-epoch summary line
pub fn epoch_line(epoch: usize, epochs: usize, train_loss: f64, report: &EvalReport) -> String {
    format!(
        "Epoch {:>3}/{} | train_loss={:.4} | test_loss={:.4} | accuracy={}/{} ({:.2}%)",
        epoch,
        epochs,
        train_loss,
        report.avg_loss,
        report.correct,
        report.total,
        report.accuracy() * 100.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_loss_is_mean_over_batches() {
        let mut p = EpochProgress::new(1, 256);
        p.record(64, 2.0);
        p.record(64, 1.0);
        assert_eq!(p.batches(), 2);
        assert_eq!(p.seen(), 128);
        assert!((p.running_loss() - 1.5).abs() < 1e-12);
        assert!((p.percent() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn empty_progress_has_nan_loss() {
        let p = EpochProgress::new(3, 0);
        assert!(p.running_loss().is_nan());
        assert_eq!(p.percent(), 100.0);
    }

    #[test]
    fn progress_line_mentions_epoch_and_percent() {
        let mut p = EpochProgress::new(2, 1000);
        p.record(250, 0.5);
        let line = p.line();
        assert!(line.starts_with("Epoch   2"));
        assert!(line.contains("250/ 1000"));
        assert!(line.contains("25.0%"));
        assert!(line.contains("running_loss=0.500000"));
    }

    #[test]
    fn accuracy_of_empty_report_is_zero() {
        let r = EvalReport { avg_loss: f64::NAN, correct: 0, total: 0 };
        assert_eq!(r.accuracy(), 0.0);
    }

    #[test]
    fn report_line_prints_percentage() {
        let r = EvalReport { avg_loss: 0.25, correct: 9, total: 10 };
        assert_eq!(r.line(), "Test set: avg_loss=0.2500 | accuracy=9/10 (90.00%)");
        assert!(epoch_line(1, 3, 0.5, &r).contains("accuracy=9/10 (90.00%)"));
    }
}
