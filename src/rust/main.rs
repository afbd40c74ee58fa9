use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::info;
use spam_detector::{
    ArtifactPaths, AssetLoader, ClassificationResult, ClassifierError, RuntimeConfig, SpamClassifier,
    DEFAULT_THRESHOLD,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Message to analyze; read from stdin when omitted
    message: Option<String>,

    /// Sensitivity threshold on the spam probability (0 to 1)
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f32,

    /// Directory holding vectorizer.json and model.onnx
    #[arg(short, long)]
    models_dir: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn read_message(message: Option<String>) -> anyhow::Result<String> {
    match message {
        Some(message) => Ok(message),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read message from stdin")?;
            Ok(buffer)
        }
    }
}

fn print_result(result: &ClassificationResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if result.is_spam() {
        println!("RESULT: SPAM");
    } else {
        println!("RESULT: HAM (legitimate)");
    }
    println!("Confidence: {:.2}%", result.confidence() * 100.0);
    println!("Spam probability: {:.4}", result.spam_probability());
    println!("Threshold: {}", result.threshold_used());
    Ok(())
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let paths = args
        .models_dir
        .map(ArtifactPaths::from_dir)
        .unwrap_or_else(ArtifactPaths::new_default);
    info!("Using artifacts: {:?}", paths);

    let loader = AssetLoader::from_paths(paths, RuntimeConfig::default());
    let classifier = match SpamClassifier::builder().with_loader(&loader).and_then(|b| b.build()) {
        Ok(classifier) => classifier,
        Err(e) => {
            eprintln!("Error loading model files: {}", e);
            return Ok(ExitCode::from(1));
        }
    };

    let message = read_message(args.message)?;
    match classifier.classify(&message, args.threshold) {
        Ok(result) => {
            print_result(&result, args.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ClassifierError::EmptyInput) => {
            eprintln!("Please enter a message before analyzing.");
            Ok(ExitCode::from(2))
        }
        Err(e) if e.is_recoverable() => {
            eprintln!("{}", e);
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();
    run(args)
}
