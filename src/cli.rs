//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Resolve social and media links into uniform metadata cards.
///
/// linkmeta recognizes Discord invites, GitHub repositories and profiles,
/// YouTube channels, Spotify tracks and Steam profiles. Any other link
/// resolves to a generic "External Link" card.
#[derive(Parser, Debug)]
#[command(name = "linkmeta")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve links into metadata and print them as a JSON array
    ///
    /// Links are resolved concurrently. A failing link is reported in its own
    /// entry and does not affect the others; the exit status is 2 when any
    /// link failed.
    Resolve(ResolveArgs),

    /// Print the provider each link would be routed to
    Detect {
        /// Links to classify
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },

    /// Manage the persistent metadata cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(ClapArgs, Debug)]
pub struct ResolveArgs {
    /// Links to resolve
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// SQLite cache file (created if missing)
    #[arg(long, value_name = "PATH")]
    pub cache_db: Option<PathBuf>,

    /// Skip the cache entirely
    #[arg(long, conflicts_with = "cache_db")]
    pub no_cache: bool,

    /// Scope cache entries to this profile ID
    #[arg(long, value_name = "ID")]
    pub profile: Option<String>,

    /// Proxy template, repeatable (`direct`, `suffix:<prefix>`, `encoded:<prefix>`)
    #[arg(long = "proxy", value_name = "TEMPLATE")]
    pub proxies: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Remove one cache entry by exact key
    Clear {
        key: String,
        /// SQLite cache file
        #[arg(long, value_name = "PATH")]
        cache_db: Option<PathBuf>,
    },

    /// Remove every cache entry whose key contains TOKEN
    ClearScope {
        token: String,
        /// SQLite cache file
        #[arg(long, value_name = "PATH")]
        cache_db: Option<PathBuf>,
    },
}
