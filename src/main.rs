use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use orion_eval::dataset::{self, FeatureTable};
use orion_eval::harness::Harness;

#[derive(Parser, Debug)]
#[command(
    name = "orion-eval",
    version,
    about = "Evaluate exported Orion telemetry classifiers against a held-out split."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate every artifact in a models directory and write the report.
    Evaluate(EvaluateArgs),
}

#[derive(clap::Args, Debug)]
struct EvaluateArgs {
    /// Telemetry CSV export with features and the target column.
    #[arg(long)]
    data: PathBuf,

    /// Directory holding .onnx graphs and .so native scorers.
    #[arg(long)]
    models: PathBuf,

    /// Target column carrying the event class labels.
    #[arg(long, default_value = "EventType")]
    target: String,

    /// Where to write the comparison CSV. Defaults to
    /// <models>/model_metrics.csv.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Fraction of rows held out for evaluation.
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    /// Split seed; keep it fixed so metrics are comparable across runs.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Columns to drop before evaluation, repeatable. Defaults to the
    /// ingestion step's drops.
    #[arg(long = "drop")]
    drop_columns: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("orion_eval=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Evaluate(args) => evaluate(args),
    }
}

fn evaluate(args: EvaluateArgs) -> Result<()> {
    let drops: Vec<String> = if args.drop_columns.is_empty() {
        dataset::DEFAULT_DROP_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        args.drop_columns.clone()
    };

    let (table, labels) = FeatureTable::from_csv(&args.data, &args.target, &drops)
        .with_context(|| format!("loading dataset {}", args.data.display()))?;
    tracing::info!(
        rows = table.n_rows(),
        cols = table.n_cols(),
        "dataset loaded"
    );

    let split = dataset::heldout_split(&table, &labels, args.test_fraction, args.seed)
        .context("building held-out split")?;

    let harness = Harness::new(split);
    let report = harness.run(&args.models).context("evaluation run failed")?;

    let report_path = args
        .report
        .unwrap_or_else(|| args.models.join("model_metrics.csv"));
    report
        .write_csv(&report_path)
        .with_context(|| format!("writing report {}", report_path.display()))?;

    println!("{}", report.render());
    println!(
        "Metrics saved to: {} ({} evaluated, {} skipped)",
        report_path.display(),
        report.evaluated_count(),
        report.skipped_count()
    );
    Ok(())
}
