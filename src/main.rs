//! CLI entry point for linkmeta.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use futures_util::future::join_all;
use linkmeta_core::{
    CacheStore, CachedResolver, Database, Dispatcher, MemoryCacheStore, NormalizedMetadata,
    ProxyTemplate, ResolveError, SqliteCacheStore,
};
use serde::Serialize;
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use app_config::FileConfig;
use cli::{Args, CacheAction, Command, ResolveArgs};

/// Exit status when at least one link failed to resolve.
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = app_config::load_config(args.config.as_deref())?;

    match args.command {
        Command::Resolve(resolve) => run_resolve(&config, resolve).await,
        Command::Detect { urls } => run_detect(&config, &urls),
        Command::Cache { action } => run_cache(&config, action).await,
    }
}

/// One line of `resolve` output.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ResolveOutcome {
    Resolved {
        url: String,
        metadata: NormalizedMetadata,
    },
    Failed {
        url: String,
        error: ErrorReport,
    },
}

#[derive(Debug, Serialize)]
struct ErrorReport {
    kind: &'static str,
    message: String,
}

impl ResolveOutcome {
    fn new(url: &str, result: Result<NormalizedMetadata, ResolveError>) -> Self {
        match result {
            Ok(metadata) => Self::Resolved {
                url: url.to_string(),
                metadata,
            },
            Err(error) => Self::Failed {
                url: url.to_string(),
                error: ErrorReport {
                    kind: error.kind(),
                    message: error.to_string(),
                },
            },
        }
    }

    fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Resolution backend selected by the cache flags.
enum Resolution {
    Uncached(Dispatcher),
    Cached(CachedResolver),
}

impl Resolution {
    async fn resolve(&self, profile: Option<&str>, url: &str) -> Result<NormalizedMetadata, ResolveError> {
        match (self, profile) {
            (Self::Uncached(dispatcher), _) => dispatcher.resolve(url).await,
            (Self::Cached(resolver), Some(profile)) => resolver.resolve_for_profile(profile, url).await,
            (Self::Cached(resolver), None) => resolver.resolve(url).await,
        }
    }
}

async fn run_resolve(config: &FileConfig, args: ResolveArgs) -> Result<ExitCode> {
    let proxies = args
        .proxies
        .iter()
        .map(|raw| ProxyTemplate::parse(raw).map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()
        .context("Invalid --proxy value")?;

    let resolver_config = config.resolver_config(proxies);
    debug!(?resolver_config, "Resolver configuration");
    let dispatcher = Dispatcher::new(&resolver_config)?;

    let resolution = if args.no_cache {
        Resolution::Uncached(dispatcher)
    } else {
        let store: Arc<dyn CacheStore> = match args.cache_db.as_ref().or(config.cache_db.as_ref()) {
            Some(path) => Arc::new(open_sqlite_store(path).await?),
            None => Arc::new(MemoryCacheStore::new()),
        };
        let mut resolver = CachedResolver::new(dispatcher, store);
        if let Some(ttl) = config.link_metadata_ttl() {
            resolver = resolver.with_ttl(ttl);
        }
        Resolution::Cached(resolver)
    };

    let profile = args.profile.as_deref();
    let outcomes: Vec<ResolveOutcome> = join_all(args.urls.iter().map(|url| {
        let resolution = &resolution;
        async move { ResolveOutcome::new(url, resolution.resolve(profile, url).await) }
    }))
    .await;

    let failed = outcomes.iter().filter(|outcome| outcome.is_failure()).count();
    info!(total = outcomes.len(), failed, "Resolution complete");

    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    if failed > 0 {
        warn!(failed, "Some links could not be resolved");
        return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_detect(config: &FileConfig, urls: &[String]) -> Result<ExitCode> {
    let dispatcher = Dispatcher::new(&config.resolver_config(Vec::new()))?;
    for url in urls {
        let provider = dispatcher
            .detect(url)
            .map_or("other", |provider| provider.as_str());
        println!("{provider}\t{url}");
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_cache(config: &FileConfig, action: CacheAction) -> Result<ExitCode> {
    let (cache_db, describe): (Option<PathBuf>, String) = match &action {
        CacheAction::Clear { key, cache_db } => (cache_db.clone(), format!("key '{key}'")),
        CacheAction::ClearScope { token, cache_db } => {
            (cache_db.clone(), format!("scope '{token}'"))
        }
    };
    let Some(path) = cache_db.or_else(|| config.cache_db.clone()) else {
        bail!("No cache database given. Pass --cache-db or set `cache_db` in the config file");
    };
    let store = open_sqlite_store(&path).await?;

    let removed = match action {
        CacheAction::Clear { key, .. } => {
            let existed = store.get(&key).await?.is_some();
            store.clear(&key).await?;
            usize::from(existed)
        }
        CacheAction::ClearScope { token, .. } => store.clear_scope(&token).await?,
    };
    info!(removed, entry = %describe, "Cache cleared");
    println!("{removed}");
    Ok(ExitCode::SUCCESS)
}

async fn open_sqlite_store(path: &Path) -> Result<SqliteCacheStore> {
    let db = Database::new(path)
        .await
        .with_context(|| format!("Failed to open cache database '{}'", path.display()))?;
    Ok(SqliteCacheStore::new(db))
}
