use anyhow::Context;
use clap::{Parser, Subcommand};
use drumclass::analysis::{DrumClass, Prediction};
use drumclass::config::OutputFormat;
use drumclass::{audio, spectral, Config, DrumClassifier};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

/// Drum Sample Classifier
#[derive(Parser)]
#[command(name = "drumclass")]
#[command(about = "Identify one-shot drum samples: cymbal, kick, perc/tom or snare")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one or more audio samples
    Classify {
        /// Input audio files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Model file (overrides the configuration)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Print per-class scores
        #[arg(long)]
        scores: bool,
    },
    /// Show the features extracted from a sample, without a model
    Inspect {
        /// Input audio file
        input: PathBuf,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

/// One line of `classify --json` output
#[derive(Serialize)]
struct FileResult {
    file: PathBuf,
    #[serde(flatten)]
    prediction: Option<Prediction>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose && cli.quiet {
        anyhow::bail!("Cannot specify both --verbose and --quiet");
    }

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Classify {
            files,
            model,
            config,
            json,
            scores,
        } => {
            let mut config = if let Some(config_path) = config {
                drumclass::config::load_config(config_path)?
            } else {
                Config::default()
            };
            if model.is_some() {
                config.model.path = model;
            }
            if json {
                config.output.format = OutputFormat::Json;
            }
            if scores {
                config.output.show_scores = true;
            }

            classify_files(&files, &config)?;
        }
        Commands::Inspect { input } => inspect(&input)?,
        Commands::ValidateConfig { config } => {
            let config = drumclass::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn classify_files(files: &[PathBuf], config: &Config) -> anyhow::Result<()> {
    let mut pipeline = DrumClassifier::from_config(config)?;
    let mut results = Vec::with_capacity(files.len());
    let mut failures = 0;

    for file in files {
        let result = match pipeline.predict_file(file) {
            Ok(prediction) => FileResult {
                file: file.clone(),
                message: prediction.sentence(),
                prediction: Some(prediction),
                error: None,
            },
            Err(e) => {
                error!("{}: {}", file.display(), e);
                failures += 1;
                FileResult {
                    file: file.clone(),
                    prediction: None,
                    message: "The sample could not be classified.".to_string(),
                    error: Some(e.to_string()),
                }
            }
        };

        if config.output.format == OutputFormat::Text {
            print_result(&result, files.len() > 1, config.output.show_scores);
        }
        results.push(result);
    }

    if config.output.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} files could not be classified", failures, files.len());
    }

    Ok(())
}

fn print_result(result: &FileResult, with_name: bool, show_scores: bool) {
    if with_name {
        println!("{}: {}", result.file.display(), result.message);
    } else {
        println!("{}", result.message);
    }

    if !show_scores {
        return;
    }
    if let Some(prediction) = &result.prediction {
        for (class, score) in DrumClass::ALL.iter().zip(&prediction.scores) {
            println!("  {:<12} {:.4}", class.name(), score);
        }
    }
}

fn inspect(input: &Path) -> anyhow::Result<()> {
    let waveform = audio::load_waveform(input)?;
    let fixed = audio::fix_length(&waveform.samples);
    let normalized = audio::peak_normalize(fixed);
    let spectrogram = spectral::extract_spectrogram(&normalized);

    println!("File:         {}", input.display());
    println!(
        "Duration:     {:.3} s ({} samples at {} Hz)",
        waveform.duration_sec(),
        waveform.n_samples(),
        waveform.sample_rate
    );
    if waveform.n_samples() > audio::SAMPLE_LENGTH {
        println!(
            "Length:       truncated by {} samples",
            waveform.n_samples() - audio::SAMPLE_LENGTH
        );
    } else {
        println!(
            "Length:       padded with {} zeros",
            audio::SAMPLE_LENGTH - waveform.n_samples()
        );
    }
    println!("Peak:         {:.6}", normalized.source_peak());
    println!("Silent:       {}", normalized.is_silent());
    println!("Spectrogram:  {:?}", spectrogram.shape());
    println!("Max mag:      {:.4}", spectrogram.max_magnitude());
    println!("Mean mag:     {:.6}", spectrogram.mean_magnitude());

    Ok(())
}
