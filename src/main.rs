//! Credit Risk Assessor - Main Entry Point
//!
//! Loads the model assets once, scores a single customer profile and renders
//! the assessment as a text dashboard or JSON.

use anyhow::{Context, Result};
use clap::Parser;
use credit_risk_assessor::config::{AppConfig, LogFormat, LoggingConfig, DEFAULT_CONFIG_PATH};
use credit_risk_assessor::report::{welcome_text, AssessmentReport};
use credit_risk_assessor::types::{CustomerProfile, Education, MaritalStatus, Sex};
use credit_risk_assessor::{AssetLoadError, InferenceEngine};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "credit-risk-assessor",
    version,
    about = "Credit default risk assessment for a single customer"
)]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Overrides `models.models_dir` from the configuration
    #[arg(long)]
    models_dir: Option<String>,
    /// JSON file with the customer profile; replaces the per-field flags
    #[arg(long)]
    profile: Option<PathBuf>,
    #[arg(long, default_value_t = Sex::Male)]
    sex: Sex,
    #[arg(long, default_value_t = Education::GraduateSchool)]
    education: Education,
    #[arg(long, default_value_t = MaritalStatus::Married)]
    marriage: MaritalStatus,
    #[arg(long, default_value_t = 35, value_parser = clap::value_parser!(u32).range(18..=80))]
    age: u32,
    /// Credit limit (NT$)
    #[arg(long, default_value_t = 200_000.0)]
    credit_limit: f64,
    /// Average bill amount over 6 months
    #[arg(long, default_value_t = 50_000.0)]
    avg_bill: f64,
    /// Average payment amount over 6 months
    #[arg(long, default_value_t = 40_000.0)]
    avg_payment: f64,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=6))]
    late_payments: u32,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=10))]
    max_delay: u32,
    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    #[arg(long, default_value_t = false)]
    no_color: bool,
}

impl Args {
    fn customer_profile(&self) -> Result<CustomerProfile> {
        match &self.profile {
            Some(path) => read_profile(path),
            None => Ok(CustomerProfile {
                sex: self.sex,
                education: self.education,
                marriage: self.marriage,
                age: self.age,
                credit_limit: self.credit_limit,
                avg_bill_amount: self.avg_bill,
                avg_payment_amount: self.avg_payment,
                late_payment_count: self.late_payments,
                max_delay_months: self.max_delay,
            }),
        }
    }
}

fn read_profile(path: &Path) -> Result<CustomerProfile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid profile {}", path.display()))
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("credit_risk_assessor={}", logging.level).parse()?);

    // Logs go to stderr; stdout carries the report
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = AppConfig::load_from_path(&args.config)?;
    if let Some(dir) = &args.models_dir {
        config.models.models_dir = dir.clone();
    }

    init_tracing(&config.logging)?;
    info!("Starting Credit Risk Assessor");

    let profile = args.customer_profile()?;

    let engine = match InferenceEngine::new(&config) {
        Ok(engine) => engine,
        Err(e) => {
            // Degraded mode: the shell stays usable without a model
            warn!(error = %e, "Model assets unavailable");
            println!("{}", welcome_text());
            match e {
                AssetLoadError::Missing { .. } => println!(
                    "⚠️  Model files not found. Please check your '{}' directory.",
                    config.models.models_dir
                ),
                other => println!("⚠️  Model files could not be loaded: {}", other),
            }
            println!("Risk prediction is unavailable.");
            return Ok(ExitCode::SUCCESS);
        }
    };

    match engine.predict(&profile) {
        Ok(prediction) => {
            let report = AssessmentReport::new(&profile, &prediction);
            info!(
                report_id = %report.report_id,
                model = %engine.model_name(),
                default_probability = prediction.default_probability,
                risk_tier = ?prediction.risk_tier,
                "Assessment complete"
            );

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let color = !args.no_color && std::io::stdout().is_terminal();
                print!("{}", report.render_text(color));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Prediction failed");
            eprintln!("Prediction failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
