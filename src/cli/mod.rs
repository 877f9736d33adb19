// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to
// its use case in Layer 2. Final results are printed here.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, ExportArgs, InspectArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "digit-classifier",
    version,
    about = "Train, checkpoint and evaluate handwritten-digit classifiers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Export(args)   => run_export(args),
            Commands::Inspect(args)  => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training, checkpoints in: {}", args.checkpoint_dir);
    let dir = args.checkpoint_dir.clone();

    let summary = TrainUseCase::new(args.into()).execute()?;
    if summary.start_epoch > summary.last_epoch {
        println!("Nothing to train: '{}' already holds epoch {}", dir, summary.last_epoch);
    } else {
        println!(
            "Trained epochs {}..={}. Latest checkpoint: epoch {} in '{}'",
            summary.start_epoch, summary.last_epoch, summary.last_epoch, dir,
        );
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.into()).execute()?;
    println!("{}", report.line());
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<()> {
    use crate::application::export_use_case::ExportUseCase;

    let path = ExportUseCase::new(args.into()).execute()?;
    println!("Bundle written to '{}'", path.display());
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let report = InspectUseCase::new(args.source.into()).execute()?;
    for line in report.lines() {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::evaluate_use_case::ModelSource;
    use crate::application::train_use_case::TrainConfig;
    use crate::data::dataset::DataSource;

    #[test]
    fn train_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "digit-classifier", "train",
            "--data", "synthetic",
            "--arch", "mlp",
            "--epochs", "3",
            "--hidden", "64",
            "--resume",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.data, DataSource::Synthetic);
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.hidden, Some(64));
        assert!(cfg.resume);
        assert_eq!(cfg.batch_size, TrainConfig::default().batch_size);
    }

    #[test]
    fn bundle_flag_selects_bundle_source() {
        let cli = Cli::try_parse_from(["digit-classifier", "inspect", "--bundle", "m.json"]).unwrap();
        let Commands::Inspect(args) = cli.command else { panic!("expected inspect") };
        assert!(matches!(ModelSource::from(args.source), ModelSource::Bundle(_)));
    }

    #[test]
    fn bundle_and_epoch_conflict() {
        let res = Cli::try_parse_from([
            "digit-classifier", "evaluate", "--bundle", "m.json", "--epoch", "2",
        ]);
        assert!(res.is_err());
    }
}
