//! Moodcheck command line interface
//!
//! Instant questionnaire screening plus the CSV to Random Forest pipeline.

mod input;
mod render;
mod repl;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use moodcheck_ai_core::config::PipelineConfig;
use moodcheck_ai_core::TrainedArtifact;
use moodcheck_ai_trainer::{DataSource, Session};
use moodcheck_screening::assess;
use std::io;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "moodcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Depression screening questionnaire and Random Forest classifier", long_about = None)]
struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score the symptom questionnaire
    Questionnaire {
        /// Answer as key=value, e.g. --answer mood=Poor (repeatable)
        #[arg(short, long = "answer")]
        answers: Vec<String>,

        /// JSON object of answers keyed by symptom
        #[arg(short, long, conflicts_with = "answers")]
        file: Option<PathBuf>,

        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a dataset
    Inspect {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Train and evaluate a Random Forest
    Train {
        #[command(flatten)]
        source: SourceArgs,

        /// Held-out fraction, strictly between 0 and 1
        #[arg(long)]
        test_size: Option<f64>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Save the trained model to this path
        #[arg(long)]
        save: Option<PathBuf>,

        /// Print the metrics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Predict with a saved model
    Predict {
        /// Model path (defaults to the configured model path)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Feature as name=value (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// JSON record, or array of records
        #[arg(short, long, conflicts_with = "fields")]
        file: Option<PathBuf>,

        /// Print predictions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session
    Session,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Local CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// CSV over HTTP(S)
    #[arg(long)]
    url: Option<String>,
}

impl SourceArgs {
    fn into_source(self) -> Result<DataSource> {
        match (self.csv, self.url) {
            (Some(path), None) => Ok(DataSource::File(path)),
            (None, Some(url)) => Ok(DataSource::Url(url)),
            _ => bail!("pass exactly one of --csv or --url"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Questionnaire {
            answers,
            file,
            json,
        } => questionnaire(answers, file, json),
        Commands::Inspect { source } => inspect(config, source),
        Commands::Train {
            source,
            test_size,
            seed,
            save,
            json,
        } => train(config, source, test_size, seed, save, json),
        Commands::Predict {
            model,
            fields,
            file,
            json,
        } => predict(config, model, fields, file, json),
        Commands::Session => {
            let mut session = Session::new(config);
            let stdin = io::stdin();
            repl::run_session(&mut session, &mut stdin.lock(), &mut io::stdout())
        }
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    // The trainer validates after per-run overrides
    Ok(config)
}

fn questionnaire(answers: Vec<String>, file: Option<PathBuf>, json: bool) -> Result<()> {
    let responses = match file {
        Some(path) => input::responses_from_file(&path)?,
        None if !answers.is_empty() => input::responses_from_pairs(&answers)?,
        None => {
            let stdin = io::stdin();
            input::prompt_questionnaire(&mut stdin.lock(), &mut io::stdout())?
        }
    };

    let assessment = assess(&responses);
    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print!("{}", render::assessment(&assessment));
    }
    Ok(())
}

fn inspect(config: PipelineConfig, source: SourceArgs) -> Result<()> {
    let source = source.into_source()?;
    let mut session = Session::new(config);
    session
        .load(source.clone())
        .with_context(|| format!("Failed to load dataset from {}", source))?;

    let summary = session.summary()?;
    print!(
        "{}",
        render::summary(&summary, &session.config().target_column)
    );
    Ok(())
}

fn train(
    config: PipelineConfig,
    source: SourceArgs,
    test_size: Option<f64>,
    seed: Option<u64>,
    save: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let source = source.into_source()?;
    let mut session = Session::new(config);
    session
        .load(source.clone())
        .with_context(|| format!("Failed to load dataset from {}", source))?;

    let artifact = session.train(test_size, seed).context("Training failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&artifact.metrics)?);
    } else {
        print!("{}", render::training(artifact));
    }

    if let Some(path) = save {
        let path = session
            .save_model(Some(path.as_path()))
            .context("Failed to save model")?;
        info!("✓ Model saved to {}", path.display());
    }
    Ok(())
}

fn predict(
    config: PipelineConfig,
    model: Option<PathBuf>,
    fields: Vec<String>,
    file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let path = model.unwrap_or_else(|| config.model_path.clone());
    let artifact = TrainedArtifact::load(&path)
        .with_context(|| format!("Failed to load model {}", path.display()))?;

    let records = match file {
        Some(file) => input::records_from_file(&file)?,
        None if !fields.is_empty() => vec![input::record_from_pairs(&fields)?],
        None => bail!(
            "no input record; pass --field name=value or --file.\n{}",
            render::input_hints(&artifact)
        ),
    };

    let predictions = artifact.predict_many(&records).context("Prediction failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
    } else {
        for prediction in &predictions {
            print!("{}", render::prediction(prediction));
        }
    }
    Ok(())
}
