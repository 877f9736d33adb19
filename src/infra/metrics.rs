// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per finished epoch.
//
// Output file: <checkpoint_dir>/metrics.csv
//
//   epoch,train_loss,test_loss,accuracy
//   1,0.412700,0.139000,0.958100
//   2,0.201300,0.092200,0.971200
//
// A resumed run appends to the same file, so the log covers
// the whole history of a checkpoint directory. A fresh run is
// refused in a directory that already holds one, so rows from
// two different runs never mix.
//
// Why CSV?
//   - Opens directly in a spreadsheet or pandas for plotting
//   - One row per epoch is easy to diff between runs
//   - Survives crashes: each row is flushed as the file closes
//
// How to read the metrics:
//   - train_loss should fall every epoch
//   - test_loss rising while train_loss falls → overfitting
//   - accuracy is measured in evaluation mode (dropout off)
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::progress::EvalReport;

const HEADER: &str = "epoch,train_loss,test_loss,accuracy";

/// One row of the metrics log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    /// Mean loss over the epoch's training batches
    pub train_loss: f64,
    pub test_loss:  f64,
    /// Fraction of the test set classified correctly, in [0, 1]
    pub accuracy:   f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, report: &EvalReport) -> Self {
        Self {
            epoch,
            train_loss,
            test_loss: report.avg_loss,
            accuracy:  report.accuracy(),
        }
    }

    /// True if this epoch's test loss beats `best_test_loss`
    pub fn is_improvement(&self, best_test_loss: f64) -> bool {
        self.test_loss < best_test_loss
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header only when the file does not exist yet.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.test_loss, m.accuracy,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.test_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> EvalReport {
        EvalReport { avg_loss: 0.25, correct: 9, total: 10 }
    }

    #[test]
    fn improvement_compares_test_loss() {
        let m = EpochMetrics::new(2, 0.5, &report());
        assert!(m.is_improvement(0.3));
        assert!(!m.is_improvement(0.2));
        assert!((m.accuracy - 0.9).abs() < 1e-12);
    }

    #[test]
    fn reopening_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.5, &report())).unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(2, 0.4, &report())).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![
            HEADER,
            "1,0.500000,0.250000,0.900000",
            "2,0.400000,0.250000,0.900000",
        ]);
    }
}
