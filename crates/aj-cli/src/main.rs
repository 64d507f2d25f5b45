//! ArchiveJump CLI
//!
//! Inspect the redirect engine from the command line: classify URLs, check
//! hosts against the site list, replay tab events and run the perf budget.

mod perf_budget;
mod simulate;
mod sites_file;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use aj_core::policy::{fallback_archive_url_for, offers_archive_button};
use aj_core::{archive_url_for, classify, is_archive_host, RedirectMode, RedirectPolicy, Settings};

use perf_budget::{run_perf_budget, PerfBudgetOptions};
use simulate::{run_simulate, SimulateOptions};
use sites_file::load_registry;

#[derive(Parser)]
#[command(name = "aj-cli")]
#[command(about = "ArchiveJump redirect engine tools")]
struct Cli {
    /// Site list file (one domain per line) replacing the built-in list
    #[arg(long, global = true)]
    sites: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify URLs as article or non-article pages
    Classify {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Also print the rule that decided
        #[arg(long)]
        explain: bool,
    },

    /// Check hostnames against the site list
    CheckHost {
        #[arg(required = true)]
        hosts: Vec<String>,
    },

    /// Print the action taken for a navigation to URL
    Decide {
        url: String,

        /// Redirect mode
        #[arg(long, default_value = "automatic")]
        mode: RedirectMode,

        /// Decide as if the extension were switched off
        #[arg(long)]
        disabled: bool,
    },

    /// Print the archive URL for a page
    ArchiveUrl {
        url: String,

        /// Use the archive search form instead of the newest snapshot
        #[arg(long)]
        fallback: bool,
    },

    /// List registered domains
    Sites,

    /// Replay a JSON-lines tab event script
    Simulate {
        /// Event script
        #[arg(short, long)]
        events: String,

        /// Initial redirect mode
        #[arg(long, default_value = "automatic")]
        mode: RedirectMode,
    },

    /// Check engine latency against performance budgets
    PerfBudget {
        /// Iterations over the sample URL set
        #[arg(long, default_value_t = 2000)]
        iterations: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Classify { urls, explain } => cmd_classify(&urls, explain),
        Commands::CheckHost { hosts } => cmd_check_host(cli.sites.as_deref(), &hosts),
        Commands::Decide { url, mode, disabled } => cmd_decide(cli.sites.as_deref(), &url, mode, disabled),
        Commands::ArchiveUrl { url, fallback } => cmd_archive_url(&url, fallback),
        Commands::Sites => cmd_sites(cli.sites.as_deref()),
        Commands::Simulate { events, mode } => load_registry(cli.sites.as_deref()).and_then(|registry| {
            run_simulate(
                registry,
                SimulateOptions {
                    events_path: events,
                    settings: Settings { enabled: true, redirect_mode: mode },
                },
            )
        }),
        Commands::PerfBudget { iterations } => load_registry(cli.sites.as_deref())
            .and_then(|registry| run_perf_budget(&registry, PerfBudgetOptions { iterations })),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn cmd_classify(urls: &[String], explain: bool) -> Result<(), String> {
    for url in urls {
        let verdict = classify(url);
        let label = if verdict.classification.is_article() { "article" } else { "non-article" };
        if explain {
            println!("{:<12} {:<16} {}", label, format!("{:?}", verdict.rule), url);
        } else {
            println!("{:<12} {}", label, url);
        }
    }
    Ok(())
}

fn cmd_check_host(sites: Option<&Path>, hosts: &[String]) -> Result<(), String> {
    let registry = load_registry(sites)?;
    for host in hosts {
        let status = if is_archive_host(host) {
            "archive"
        } else if registry.contains_host(host) {
            "paywalled"
        } else {
            "-"
        };
        println!("{:<10} {}", status, host);
    }
    Ok(())
}

fn cmd_decide(sites: Option<&Path>, url: &str, mode: RedirectMode, disabled: bool) -> Result<(), String> {
    let registry = load_registry(sites)?;
    let settings = Settings { enabled: !disabled, redirect_mode: mode };
    let action = RedirectPolicy::new(&registry).evaluate(url, &settings);

    let json = serde_json::to_string_pretty(&action)
        .map_err(|e| format!("Failed to serialize action: {}", e))?;
    println!("{}", json);
    if offers_archive_button(&action) {
        println!("(archive button offered)");
    }
    Ok(())
}

fn cmd_archive_url(url: &str, fallback: bool) -> Result<(), String> {
    if fallback {
        println!("{}", fallback_archive_url_for(url));
    } else {
        println!("{}", archive_url_for(url));
    }
    Ok(())
}

fn cmd_sites(sites: Option<&Path>) -> Result<(), String> {
    let registry = load_registry(sites)?;
    for domain in registry.domains() {
        println!("{}", domain);
    }
    println!();
    println!("{} domains", registry.len());
    Ok(())
}
