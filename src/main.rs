//! Customer Churn Prediction CLI
//!
//! Predicts whether customers will churn using a pre-trained classifier.

use churn::features::{Contract, InternetService, PaymentMethod, Vocabulary};
use churn::{Config, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "churn")]
#[command(about = "Customer churn prediction from a pre-trained model", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict churn for one customer entered on the command line
    Predict {
        #[arg(long, default_value = "35", value_parser = clap::value_parser!(u32).range(18..=100))]
        age: u32,
        /// Tenure in months
        #[arg(long, default_value = "24", value_parser = clap::value_parser!(u32).range(0..=72))]
        tenure: u32,
        /// Monthly charges ($), 0-200
        #[arg(long, default_value = "50.0", value_parser = parse_monthly_charges)]
        monthly_charges: f64,
        /// Total charges ($), 0-10000
        #[arg(long, default_value = "1200.0", value_parser = parse_total_charges)]
        total_charges: f64,
        /// Month-to-Month, One Year or Two Year
        #[arg(long, default_value = "Month-to-Month", value_parser = parse_label::<Contract>)]
        contract: Contract,
        /// Electronic Check, Mailed Check, Bank Transfer or Credit Card
        #[arg(long, default_value = "Electronic Check", value_parser = parse_label::<PaymentMethod>)]
        payment_method: PaymentMethod,
        /// DSL, Fiber Optic or None
        #[arg(long, default_value = "DSL", value_parser = parse_label::<InternetService>)]
        internet_service: InternetService,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Predict churn for every customer in a CSV file
    Upload {
        /// CSV file with a header row
        file: String,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
        /// Fail if any row is rejected
        #[arg(long)]
        strict: bool,
    },
    /// List the categorical vocabularies and their codes
    Vocab,
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn parse_label<V: Vocabulary>(s: &str) -> std::result::Result<V, String> {
    V::from_label(s).ok_or_else(|| {
        format!(
            "unknown {} '{}'. Expected one of: {}",
            V::FEATURE,
            s,
            V::FEATURE.labels().join(", ")
        )
    })
}

fn parse_charge(s: &str, max: f64) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if !(0.0..=max).contains(&value) {
        return Err(format!("{} is not in 0.0..={}", value, max));
    }
    Ok(value)
}

fn parse_monthly_charges(s: &str) -> std::result::Result<f64, String> {
    parse_charge(s, churn::data::manual::MONTHLY_CHARGES_RANGE.1)
}

fn parse_total_charges(s: &str) -> std::result::Result<f64, String> {
    parse_charge(s, churn::data::manual::TOTAL_CHARGES_RANGE.1)
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Predict {
            age,
            tenure,
            monthly_charges,
            total_charges,
            contract,
            payment_method,
            internet_service,
            format,
        } => {
            let input = churn::data::ManualInput {
                age,
                tenure,
                monthly_charges,
                total_charges,
                contract,
                payment_method,
                internet_service,
            };
            commands::predict(&config, input, format)
        }
        Commands::Upload {
            file,
            format,
            strict,
        } => commands::upload(&config, &file, format, strict),
        Commands::Vocab => commands::vocab(),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use churn::data::{AssembledUpload, ManualInput, UploadedFrame};
    use churn::features::{CategoricalFeature, REQUIRED_COLUMNS};
    use churn::model::artifact_file;
    use churn::predict::report::{format_manual, format_preview};
    use churn::predict::Predictor;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("model")?;
        println!("Created model/ directory");

        println!("\nNext steps:");
        println!("  1. Place a model artifact at {}", config.model.path);
        println!("  2. Run 'churn predict --age 35 --tenure 24' for a single customer");
        println!("  3. Run 'churn upload customers.csv' for a whole file");

        Ok(())
    }

    pub fn predict(config: &Config, input: ManualInput, format: OutputFormat) -> Result<()> {
        let predictor = Predictor::load(&config.model)?;
        let label = predictor.predict_manual(&input)?;
        let record = input.to_record();

        match format {
            OutputFormat::Table => {
                println!("{}", format_manual(label));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "input": record,
                    "features": record.to_vec(),
                    "prediction": label.to_string(),
                    "code": label.code(),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Csv => {
                println!("{},Churn Prediction", REQUIRED_COLUMNS.join(","));
                println!("{},{}", record.to_strings().join(","), label);
            }
        }

        Ok(())
    }

    pub fn upload(config: &Config, file: &str, format: OutputFormat, strict: bool) -> Result<()> {
        let predictor = Predictor::load(&config.model)?;
        let frame = UploadedFrame::from_path(file)?;

        if let OutputFormat::Table = format {
            println!("Uploaded Data Preview:");
            print!("{}", format_preview(&frame, config.upload.preview_rows));
        }

        let upload = AssembledUpload::assemble(frame)?;
        if strict || config.upload.strict {
            upload.ensure_all_accepted()?;
        }

        let report = predictor.predict_upload(&upload)?;

        match format {
            OutputFormat::Table => {
                println!("\nPrediction Results:");
                print!("{}", report.to_table_string());
                println!(
                    "\n{} rows: {} predicted ({} churn), {} rejected",
                    report.rows.len(),
                    report.predicted_count(),
                    report.churn_count(),
                    report.rejected_count()
                );
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            }
            OutputFormat::Csv => {
                print!("{}", report.to_csv_string()?);
            }
        }

        Ok(())
    }

    pub fn vocab() -> Result<()> {
        for feature in CategoricalFeature::ALL {
            println!("{}", feature);
            for (code, label) in feature.labels().iter().enumerate() {
                println!("  {}  {}", code, label);
            }
        }
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let predictor = Predictor::load(&config.model)?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Kind:     {}", config.model.kind);
        println!("  Path:     {}", artifact_file(&config.model));
        println!("  Model:    {}", predictor.model().describe());
        println!("  Inputs:   {}", REQUIRED_COLUMNS.join(", "));

        Ok(())
    }
}
