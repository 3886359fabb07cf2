use jobsearch::cli::{Cli, Commands, ConfigAction};
use jobsearch::config::Config;
use jobsearch::error::{JobSearchError, Result};
use jobsearch::oracle::{GeminiOracle, MockOracle, Oracle};
use jobsearch::retrieval::{QdrantEngine, RetrievalEngine};
use jobsearch::{SearchOutcome, SearchService};
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Search { query, top, json } => cmd_search(cli.config, &query, top, json),
        Commands::Config { action } => cmd_config(cli.config, action),
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.kind(), e);
        std::process::exit(if e.kind().is_client_error() { 2 } else { 1 });
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "jobsearch=debug" } else { "jobsearch=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_search(config_path: Option<PathBuf>, query: &str, top: Option<usize>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let oracle: Arc<dyn Oracle> = match config.llm.provider.as_str() {
        "mock" => {
            tracing::warn!("Using mock oracle: answers come from the fallback template");
            Arc::new(MockOracle::new())
        }
        _ => Arc::new(GeminiOracle::new(&config.llm)?),
    };
    let engine: Arc<dyn RetrievalEngine> =
        Arc::new(QdrantEngine::new(&config.engine, config.engine.timeout()?)?);

    let service = SearchService::new(oracle, engine, &config)?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| JobSearchError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;
    let outcome = rt.block_on(service.search(query, top))?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&outcome.to_json()).map_err(|e| JobSearchError::Json {
                source: e,
                context: "Failed to serialize search outcome".to_string(),
            })?;
        println!("{}", rendered);
    } else {
        print_outcome(&outcome);
    }

    Ok(())
}

fn print_outcome(outcome: &SearchOutcome) {
    println!("{}", outcome.answer);

    if outcome.results.is_empty() {
        return;
    }

    println!();
    for result in &outcome.results {
        println!(
            "{}. {} - {} ({})",
            result.rank, result.job_title, result.company, result.location
        );
        println!(
            "   Level: {} | Category: {} | Published: {} | Job ID: {}",
            result.job_level, result.category, result.publication_date, result.job_id
        );
        println!("   Score: {:.4}", result.score);
        println!("   {}", result.description_snippet);
        println!();
    }
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let rendered = toml::to_string_pretty(&config)?;
            println!("{}", rendered);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| JobSearchError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'jobsearch config init' to create one."
        );
        return Config::from_env();
    }

    Config::load(&path)
}
