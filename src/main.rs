use anyhow::{bail, Context, Result};
use clap::Parser;
use mnist_idx::model::logreg::LogregClassifier;
use mnist_idx::model::{features, Model};
use mnist_idx::parsing::{read_dataset, Dataset, DEFAULT_FOLDER};
use mnist_idx::preprocessing::{binarize_dataset, normalize_dataset, DEFAULT_THRESHOLD};
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Folder holding the train-*/t10k-* IDX files
    #[arg(short, long, default_value = DEFAULT_FOLDER)]
    folder: String,

    /// Number of training records to read (0 reads all of them)
    #[arg(long, default_value_t = 0)]
    training_limit: usize,

    /// Number of test records to read (0 reads all of them)
    #[arg(long, default_value_t = 0)]
    test_limit: usize,

    /// Transform applied to every image before scoring
    #[arg(short, long, value_enum, default_value_t = Preprocess::None)]
    preprocess: Preprocess,

    /// Threshold used by binarization
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Logistic regression weights, JSON ({"W0": [...], "b0": [..]})
    /// or plain text with the intercept first
    /// If not provided, only the dataset is loaded
    #[arg(short, long, default_value = None)]
    weights: Option<String>,

    /// Label the model scores as positive
    #[arg(long, default_value_t = 0)]
    positive_class: u8,

    /// Write one CSV line per test record with its label and probability
    #[arg(long, default_value = None)]
    predictions: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Preprocess {
    None,
    Binarize,
    Normalize,
}

/// A line of the predictions CSV
#[derive(Serialize, Debug)]
struct Prediction {
    index: usize,
    label: u8,
    probability: f64,
    predicted: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("A global tracing subscriber is already installed");
    }
}

/// Score the test set and return the predictions
fn test_model(
    dataset: &Dataset<Vec<f64>, u8>,
    model: &LogregClassifier,
    positive_class: u8,
) -> Result<Vec<Prediction>> {
    let mut predictions = Vec::with_capacity(dataset.test_len());
    let mut num_mistakes = 0;

    for (index, (image, &label)) in dataset
        .test_images
        .iter()
        .zip(dataset.test_labels.iter())
        .enumerate()
    {
        let probability = model
            .predict_proba(&features(image).view())
            .with_context(|| format!("Failed to score test record {}", index))?;
        let predicted = probability > 0.5;

        if predicted != (label == positive_class) {
            num_mistakes += 1;
        }

        predictions.push(Prediction {
            index,
            label,
            probability,
            predicted,
        });
    }

    let accuracy = 1f64 - num_mistakes as f64 / predictions.len().max(1) as f64;
    info!(
        records = predictions.len(),
        mistakes = num_mistakes,
        accuracy,
        "Scored test set"
    );
    println!("The number of mistakes is {}", num_mistakes);

    Ok(predictions)
}

/// Write the predictions to a CSV file
fn write_predictions(path: &str, predictions: &[Prediction]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path))?;

    for prediction in predictions {
        writer.serialize(prediction)?;
    }
    writer.flush()?;

    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut dataset: Dataset<Vec<f64>, u8> =
        read_dataset(&args.folder, args.training_limit, args.test_limit)
            .with_context(|| format!("Failed to read dataset from {}", args.folder))?;

    if dataset.is_empty() {
        bail!("No IDX files found in {}", args.folder);
    }

    match args.preprocess {
        Preprocess::None => {}
        Preprocess::Binarize => binarize_dataset(&mut dataset, args.threshold),
        Preprocess::Normalize => normalize_dataset(&mut dataset),
    }

    println!(
        "Training records: {}, test records: {}",
        dataset.training_len(),
        dataset.test_len()
    );

    if let Some(weights) = args.weights {
        let model = LogregClassifier::load(&weights)?;
        let predictions = test_model(&dataset, &model, args.positive_class)?;

        if let Some(path) = args.predictions {
            write_predictions(&path, &predictions)?;
            info!(path = %path, "Wrote predictions");
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
