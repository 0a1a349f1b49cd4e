use anyhow::Context;
use huntsmith::chunking::Chunker;
use huntsmith::cli::{Cli, Commands, ConfigAction, PolicyAction, SourcesAction};
use huntsmith::config::{expand_path, Config, ConfigValidator};
use huntsmith::embedding::{build_provider, EmbeddingProvider};
use huntsmith::generation::{build_llm_provider, GenerationRequest};
use huntsmith::ingest::{IngestOptions, Ingestor};
use huntsmith::originality::OriginalityPolicy;
use huntsmith::patterns::{LeakPatternsConfig, PatternRegistry};
use huntsmith::pipeline::{GenerationResponse, GenerationService};
use huntsmith::retrieval::Retriever;
use huntsmith::storage::{Database, KnowledgeStore};
use huntsmith::HuntError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Exit code for a 409 generation response
const EXIT_CONFLICT: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "huntsmith=debug" } else { "huntsmith=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli.config;
    let profile = cli.profile;

    match cli.command {
        Commands::Ingest {
            path,
            title,
            license,
            url,
        } => {
            let config = load_config(config_path, profile)?;
            let options = IngestOptions {
                title,
                license_note: license,
                origin_url: url,
            };
            runtime()?.block_on(cmd_ingest(&config, &path, &options))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate { request } => {
            let config = load_config(config_path, profile)?;
            let request = read_request(&request)?;
            runtime()?.block_on(cmd_generate(&config, &request))
        }
        Commands::Search { query, limit, json } => {
            let mut config = load_config(config_path, profile)?;
            if let Some(limit) = limit {
                config.retrieval.top_k = limit;
            }
            runtime()?.block_on(cmd_search(&config, &query, json))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sources { action } => {
            let config = load_config(config_path, profile)?;
            cmd_sources(&config, action)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Policy { action } => {
            let config = load_config(config_path, profile)?;
            cmd_policy(&config, action)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => {
            cmd_config(config_path, profile, action)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create tokio runtime")
}

async fn cmd_ingest(config: &Config, path: &Path, options: &IngestOptions) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let embedder = build_provider(&config.embedding).map_err(HuntError::from)?;
    let chunker = Chunker::from_config(&config.chunking)?;

    let ingestor = Ingestor::new(chunker, embedder, store, config.embedding.batch_size);
    let report = ingestor
        .ingest_file(path, options, |progress| {
            println!("  embedded chunk {}/{}", progress.embedded, progress.total);
        })
        .await?;

    println!("✓ Ingested '{}'", report.source.title);
    println!("  Source: {}", report.source.id);
    println!("  Chunks: {}", report.chunk_count);
    println!("  Time:   {}ms", report.duration_ms);
    Ok(())
}

async fn cmd_generate(config: &Config, request: &GenerationRequest) -> anyhow::Result<ExitCode> {
    let store = open_store(config)?;
    let embedder = build_provider(&config.embedding).map_err(HuntError::from)?;
    let llm = build_llm_provider(&config.llm).map_err(HuntError::from)?;
    let patterns = Arc::new(PatternRegistry::load(&config.patterns)?);

    let service = GenerationService::from_config(config, embedder, llm, store, patterns);
    let response = GenerationResponse::from_result(service.generate(request).await)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to serialize response")?
    );

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_CONFLICT)
    })
}

async fn cmd_search(config: &Config, query: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let embedder: Arc<dyn EmbeddingProvider> =
        build_provider(&config.embedding).map_err(HuntError::from)?;

    let retriever = Retriever::new(embedder, store, config.retrieval.clone());
    let results = retriever.search(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No chunks at or above similarity {}", config.retrieval.min_similarity);
        return Ok(());
    }

    for (rank, chunk) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] chunk {} (source {})",
            rank + 1,
            chunk.score,
            chunk.chunk_id,
            chunk.source_id
        );
        println!("   {}", preview(&chunk.content, 160));
    }
    Ok(())
}

fn cmd_sources(config: &Config, action: SourcesAction) -> anyhow::Result<()> {
    let store = open_database(config)?;

    match action {
        SourcesAction::List { json } => {
            let sources = store.list_sources()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sources)?);
                return Ok(());
            }
            if sources.is_empty() {
                println!("Knowledge base is empty");
                return Ok(());
            }
            for source in sources {
                println!(
                    "{}  {}  ({} chunks, {})",
                    source.id,
                    source.title,
                    store.chunk_count(&source.id)?,
                    source.created_at.format("%Y-%m-%d %H:%M:%S")
                );
                if let Some(license) = &source.license_note {
                    println!("    license: {}", license);
                }
                if let Some(url) = &source.origin_url {
                    println!("    origin:  {}", url);
                }
            }
            let stats = store.stats()?;
            println!(
                "\n{} sources, {} chunks, {} chars, models: {}",
                stats.source_count,
                stats.chunk_count,
                stats.total_chunk_chars,
                stats.embedding_models.join(", ")
            );
        }
        SourcesAction::Delete { id } => {
            store.delete_source(&id)?;
            println!("✓ Deleted source {}", id);
        }
    }
    Ok(())
}

fn cmd_policy(config: &Config, action: PolicyAction) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let defaults = OriginalityPolicy::from_config(&config.originality);
    let stored = store.load_policy()?;

    match action {
        PolicyAction::Show => {
            let policy = stored.unwrap_or(defaults);
            println!(
                "max_cosine_similarity = {}\nmax_jaccard_overlap = {}",
                policy.max_cosine_similarity, policy.max_jaccard_overlap
            );
            if stored.is_none() {
                println!("(configured defaults, no stored policy)");
            }
        }
        PolicyAction::Set {
            max_cosine,
            max_jaccard,
        } => {
            let current = stored.unwrap_or(defaults);
            let policy = OriginalityPolicy::new(
                max_cosine.unwrap_or(current.max_cosine_similarity),
                max_jaccard.unwrap_or(current.max_jaccard_overlap),
            )?;
            store.save_policy(&policy)?;
            println!(
                "✓ Policy stored: max_cosine_similarity = {}, max_jaccard_overlap = {}",
                policy.max_cosine_similarity, policy.max_jaccard_overlap
            );
        }
    }
    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            if !path.exists() {
                return Err(HuntError::ConfigNotFound { path }.into());
            }
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

            let config_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&config_dir).map_err(|e| HuntError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", config_dir),
            })?;

            let leak_file = config_dir.join("leak_patterns.toml");
            if force || !leak_file.exists() {
                let content = toml::to_string_pretty(&LeakPatternsConfig::default())?;
                std::fs::write(&leak_file, content).map_err(|e| HuntError::Io {
                    source: e,
                    context: format!("Failed to write leak patterns: {:?}", leak_file),
                })?;
            }

            let mut config = Config::default();
            config.patterns.leak_file = Some(leak_file.clone());
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!("✓ Leak patterns installed at: {}", leak_file.display());
        }
    }
    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> anyhow::Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'huntsmith config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if let Some(profile) = profile {
        config.apply_profile(&profile)?;
        ConfigValidator::validate(&config)?;
    }
    Ok(config)
}

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn KnowledgeStore>> {
    Ok(Arc::new(open_database(config)?))
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let data_dir = expand_path(&config.storage.data_dir)?;
    std::fs::create_dir_all(&data_dir).map_err(|e| HuntError::Io {
        source: e,
        context: format!("Failed to create data directory: {:?}", data_dir),
    })?;

    let db_path = expand_path(&config.storage.database_path())?;
    Ok(Database::new(&db_path)?)
}

fn read_request(source: &str) -> anyhow::Result<GenerationRequest> {
    let raw = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read request from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read request file: {}", source))?
    };

    serde_json::from_str(&raw).map_err(|e| {
        HuntError::Json {
            source: e,
            context: "Invalid generation request".to_string(),
        }
        .into()
    })
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut)
}
