//! Internship recommender: rank internship listings against a user profile

use clap::Parser;
use internship_recommender::cli::{self, CacheAction, Cli, Commands, ConfigAction, ModelAction, RunArgs};
use internship_recommender::config::{Config, EmbeddingBackend, EmbeddingFailurePolicy};
use internship_recommender::error::{RecommenderError, Result};
use internship_recommender::input::manager::InputManager;
use internship_recommender::output::formatter::{save_report_to_file, ReportGenerator};
use internship_recommender::output::report::RecommendationReport;
use internship_recommender::processing::cache::EmbeddingCache;
use internship_recommender::processing::embedding_manager::EmbeddingModelManager;
use internship_recommender::processing::embeddings::{
    Embedder, EmbeddingEngine, HashingEmbedder, StaticEmbedder, UnavailableEmbedder,
};
use internship_recommender::processing::recommender::Recommender;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run_command(cli).await {
        error!("{}", e);
        process::exit(1);
    }
}

fn config_file(cli_path: Option<&Path>) -> PathBuf {
    cli_path.map(Path::to_path_buf).unwrap_or_else(Config::config_path)
}

fn load_config(cli_path: Option<&Path>) -> Result<Config> {
    match cli_path {
        Some(path) => {
            cli::validate_file_extension(path, &["toml"])
                .map_err(|e| RecommenderError::InvalidInput(format!("Config file: {}", e)))?;
            Config::load_from(path)
        }
        None => Config::load(),
    }
}

async fn run_command(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        None => run_recommendation(cli.run, load_config(config_path)?).await,
        Some(Commands::Models { action }) => run_models(action, load_config(config_path)?).await,
        Some(Commands::Config { action }) => run_config(action, config_path),
        Some(Commands::Cache { action }) => run_cache(action, load_config(config_path)?),
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(args: &RunArgs, config: &mut Config) -> Result<()> {
    if let Some(dataset) = &args.dataset {
        config.paths.dataset = dataset.clone();
    }
    if let Some(user) = &args.user {
        config.paths.user_profile = user.clone();
    }
    if let Some(cache) = &args.cache {
        config.paths.cache_path = cache.clone();
    }
    if let Some(k) = args.k {
        config.scoring.top_k = k;
    }
    if let Some(output) = &args.output {
        config.output.format = cli::parse_output_format(output).map_err(RecommenderError::InvalidInput)?;
    }
    if let Some(backend) = &args.backend {
        config.models.backend = cli::parse_backend(backend).map_err(RecommenderError::InvalidInput)?;
    }
    if let Some(model) = &args.embedding {
        config.models.default_embedding_model = model.clone();
    }
    if let Some(limit) = args.max_distance_km {
        if !(limit.is_finite() && limit >= 0.0) {
            return Err(RecommenderError::InvalidInput(format!(
                "--max-distance-km must be a non-negative number, got {}",
                limit
            )));
        }
    }
    if args.save.is_some() {
        config.output.color_output = false;
    }
    Ok(())
}

/// Build the configured embedding backend.
///
/// A Model2Vec model that cannot be loaded aborts the run under the `abort`
/// policy; otherwise every listing gets a zero semantic score.
async fn build_embedder(config: &Config) -> Result<Box<dyn Embedder>> {
    if config.models.backend == EmbeddingBackend::Hashing {
        return Ok(Box::new(HashingEmbedder::new(config.models.hashing_dimension)));
    }

    let model = config.models.default_embedding_model.clone();
    let loaded = async {
        let mut manager = EmbeddingModelManager::new(config).await?;
        let model_path = manager.ensure_model_available(&model).await?;
        StaticEmbedder::load(&model_path, &model)
    }
    .await;

    match loaded {
        Ok(embedder) => Ok(Box::new(embedder)),
        Err(e) => match config.scoring.embedding_failure {
            EmbeddingFailurePolicy::Abort => Err(RecommenderError::EmbeddingUnavailable(format!(
                "Failed to load embedding model {}: {}",
                model, e
            ))),
            EmbeddingFailurePolicy::ZeroScore => {
                warn!(
                    "Embedding model {} unavailable, semantic scores will be 0: {}",
                    model, e
                );
                Ok(Box::new(UnavailableEmbedder::new(&model, e.to_string())))
            }
        },
    }
}

fn open_cache(args: &RunArgs, config: &Config, embedder: &dyn Embedder) -> Result<EmbeddingCache> {
    let path = &config.paths.cache_path;
    // An unusable backend must not overwrite a cache built by a working one
    if args.no_cache || embedder.dimension() == 0 {
        return Ok(EmbeddingCache::in_memory(embedder.name(), embedder.dimension()));
    }
    if args.recompute_embeddings {
        info!("Recomputing all embeddings, existing cache will be replaced");
        return Ok(EmbeddingCache::fresh(path, embedder.name(), embedder.dimension()));
    }
    EmbeddingCache::load(path, embedder.name(), embedder.dimension())
}

async fn run_recommendation(args: RunArgs, mut config: Config) -> Result<()> {
    apply_overrides(&args, &mut config)?;
    config.validate()?;

    let input_manager = InputManager::new();
    let profile = input_manager.load_profile(&config.paths.user_profile).await?;
    let dataset = input_manager.load_dataset(&config.paths.dataset).await?;
    if !dataset.skipped.is_empty() {
        warn!("Skipped {} malformed rows", dataset.skipped.len());
    }

    let embedder = build_embedder(&config).await?;
    let cache = open_cache(&args, &config, embedder.as_ref())?;
    let model_name = embedder.name().to_string();
    let engine = EmbeddingEngine::new(embedder, cache);

    let mut recommender = Recommender::new(&config, engine)?
        .with_max_distance(args.max_distance_km)
        .with_progress(args.progress);

    let run = recommender.recommend(&profile, &dataset.listings, config.scoring.top_k)?;
    info!(
        "Scored {} listings, returning {} (cache hits: {}, misses: {}, embedding failures: {})",
        run.stats.scored,
        run.recommendations.len(),
        run.stats.cache_hits,
        run.stats.cache_misses,
        run.stats.embedding_failures
    );

    let report = RecommendationReport::from_run(run, &model_name);
    let content = ReportGenerator::new(&config.output).generate_report(&report, config.output.format)?;

    match &args.save {
        Some(path) => {
            save_report_to_file(&content, path)?;
            info!("Recommendations saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

async fn run_models(action: ModelAction, config: Config) -> Result<()> {
    let mut manager = EmbeddingModelManager::new(&config).await?;

    match action {
        ModelAction::List => {
            println!("Available embedding models:\n");
            for model in manager.list_available_models() {
                let status = if manager.is_model_downloaded(&model.name) {
                    "downloaded"
                } else {
                    "available"
                };
                let default_marker = if model.name == config.models.default_embedding_model {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  • {}{} [{}] - {} ({} MB, {} dims)",
                    model.name, default_marker, status, model.repo_id, model.size_mb, model.dimensions
                );
                println!("    {}", model.description);
            }
            println!("\nModels directory: {}", config.models.models_dir.display());
        }

        ModelAction::Download { model, force } => {
            let model_id = manager.resolve_model_id(&model).ok_or_else(|| {
                RecommenderError::ModelLoading(format!(
                    "Unknown embedding model '{}'. Run `models list` to see available models",
                    model
                ))
            })?;

            if !force && manager.is_model_downloaded(&model_id) {
                println!("✅ Model '{}' is already downloaded", model_id);
                println!("💡 Use --force to re-download");
                return Ok(());
            }

            let model_path = manager.download_model(&model_id, force).await?;
            println!("✅ Model '{}' downloaded to {}", model_id, model_path.display());
        }
    }
    Ok(())
}

fn run_config(action: Option<ConfigAction>, cli_path: Option<&Path>) -> Result<()> {
    let path = config_file(cli_path);

    match action {
        Some(ConfigAction::Show) | None => {
            let config = load_config(cli_path)?;
            let content = toml::to_string_pretty(&config).map_err(|e| {
                RecommenderError::Configuration(format!("Failed to serialize config: {}", e))
            })?;
            println!("# {}\n", path.display());
            println!("{}", content);
        }

        Some(ConfigAction::Path) => {
            println!("{}", path.display());
        }

        Some(ConfigAction::Reset) => {
            Config::default().save_to(&path)?;
            println!("✅ Configuration reset to defaults: {}", path.display());
        }

        Some(ConfigAction::Set { key, value }) => {
            let mut config = load_config(cli_path)?;
            config.set_value(&key, &value)?;
            config.validate()?;
            config.save_to(&path)?;
            println!("✅ {} = {}", key, value);
        }
    }
    Ok(())
}

fn run_cache(action: CacheAction, config: Config) -> Result<()> {
    let path = &config.paths.cache_path;

    match action {
        CacheAction::Stats => match EmbeddingCache::inspect(path) {
            Ok(Some(summary)) => {
                println!("Cache file: {}", path.display());
                println!("Model: {} ({} dims)", summary.model, summary.dimension);
                println!("Entries: {}", summary.entries);
                println!("Size: {:.1} KB", summary.size_bytes as f64 / 1024.0);
            }
            Ok(None) => println!("No embedding cache at {}", path.display()),
            Err(e) => {
                warn!("Cache file {} is unreadable: {}", path.display(), e);
                println!("Cache file {} is unreadable and will be rebuilt on the next run", path.display());
            }
        },

        CacheAction::Clear => {
            if path.exists() {
                std::fs::remove_file(path)?;
                println!("🗑️  Removed {}", path.display());
            } else {
                println!("No embedding cache at {}", path.display());
            }
        }
    }
    Ok(())
}
