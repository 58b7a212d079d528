use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use virascan_client::commands::results::ExportFormat;
use virascan_client::commands::{pipeline, predict, results, upload};
use virascan_client::{Config, NotificationCenter, PipelineController, PipelineSettings};
use virascan_gateway::HttpGateway;
use virascan_store::{SqliteBacking, WorkflowStore};

type Controller = PipelineController<HttpGateway, SqliteBacking>;

#[derive(Parser)]
#[command(name = "virascan")]
#[command(about = "Viral genome classification client")]
#[command(version)]
#[command(long_about = "
virascan stages DNA sequences, submits them to a prediction service and
exports the results. State is kept between invocations in a SQLite file.

Examples:
  virascan health
  virascan upload --file genomes.fasta
  virascan predict --model random_forest --model xgboost
  virascan run --text ATGCGTACGTTAGC
  virascan export --format csv --out-dir reports/
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Prediction service URL, overrides the configuration
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Workflow state database, overrides the configuration
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// FASTA or plain sequence file (.fasta .fas .fa .fna .txt)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Raw nucleotide sequence or FASTA text
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the prediction service is up
    Health,

    /// Stage a sequence for prediction
    Upload(InputArgs),

    /// Submit the staged sequence to the prediction service
    Predict {
        /// Model to run; repeat for several. Defaults come from the configuration
        #[arg(short, long = "model")]
        models: Vec<String>,
    },

    /// Upload and predict in one step
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Model to run; repeat for several
        #[arg(short, long = "model")]
        models: Vec<String>,
    },

    /// Show the latest results
    Results {
        /// Print the full result in the service's JSON shape
        #[arg(long)]
        json: bool,
    },

    /// Write the latest results to a dated CSV or JSON file
    Export {
        #[arg(long, value_enum)]
        format: ExportFormat,

        /// Directory to write into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Discard the staged sequence and results
    Restart,

    /// Show the pipeline stage and what is stored
    Status,

    /// Print the effective configuration
    Config {
        /// Print a default configuration file instead
        #[arg(long)]
        example: bool,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_controller(config: &Config) -> Result<Controller> {
    let gateway = HttpGateway::new(config.gateway.base_url.as_str()).context("Failed to set up HTTP client")?;
    let backing = SqliteBacking::open(&config.store.path)
        .with_context(|| format!("Failed to open workflow store: {}", config.store.path.display()))?;

    Ok(PipelineController::new(
        gateway,
        WorkflowStore::new(backing).shared(),
        PipelineSettings::from(config),
        NotificationCenter::new(config.notification_ttl()),
    ))
}

fn stage_input(controller: &Controller, input: &InputArgs) -> Result<()> {
    let dto = match (&input.file, &input.text) {
        (Some(path), _) => upload::upload_file(controller, path),
        (None, Some(text)) => upload::upload_text(controller, text),
        (None, None) => bail!("Provide --file or --text"),
    }
    .map_err(|e| anyhow!(e))?;

    println!("Staged '{}' ({}, {})", dto.name, dto.size_label, dto.mime_type);
    Ok(())
}

fn run_prediction(controller: &Controller, models: &[String], config: &Config) -> Result<()> {
    let dto = predict::run_prediction(controller, models, &config.models.default).map_err(|e| anyhow!(e))?;
    println!("{}", results::render_results(&dto));
    Ok(())
}

fn print_config(config: &Config, example: bool) -> Result<()> {
    let text = if example {
        Config::example_toml()?
    } else {
        toml::to_string_pretty(config).context("Failed to serialize configuration")?
    };
    print!("{}", text);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.server, cli.db);

    // Printing the configuration must not create the store file.
    if let Commands::Config { example } = cli.command {
        return print_config(&config, example);
    }

    let controller = build_controller(&config)?;

    match cli.command {
        Commands::Health => {
            let health = pipeline::check_health(&controller, &config.gateway.base_url);
            if !health.reachable {
                bail!("Prediction service at {} is not reachable", health.server);
            }
            let trained = match (health.model_trained, health.training_accuracy) {
                (Some(true), Some(acc)) => format!("model trained, accuracy {:.2}%", acc * 100.0),
                (Some(true), None) => "model trained".to_string(),
                (Some(false), _) => "model not trained".to_string(),
                (None, _) => "model status unknown".to_string(),
            };
            println!("Prediction service at {} is up ({})", health.server, trained);
        }
        Commands::Upload(input) => stage_input(&controller, &input)?,
        Commands::Predict { models } => run_prediction(&controller, &models, &config)?,
        Commands::Run { input, models } => {
            stage_input(&controller, &input)?;
            run_prediction(&controller, &models, &config)?;
        }
        Commands::Results { json } => {
            let text = if json {
                results::get_results_json(&controller)
            } else {
                results::get_results(&controller).map(|dto| results::render_results(&dto))
            }
            .map_err(|e| anyhow!(e))?;
            println!("{}", text);
        }
        Commands::Export { format, out_dir } => {
            let today = chrono::Local::now().date_naive();
            let dto = results::export_results(&controller, format, &out_dir, today).map_err(|e| anyhow!(e))?;
            println!("Wrote {} ({} bytes)", dto.path, dto.bytes);
        }
        Commands::Restart => {
            pipeline::restart(&controller).map_err(|e| anyhow!(e))?;
            println!("Pipeline restarted");
        }
        Commands::Status => {
            let status = pipeline::get_status(&controller);
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("Failed to serialize status")?
            );
        }
        Commands::Config { example } => print_config(&config, example)?,
    }

    Ok(())
}
