mod analysis;
mod api;
mod cache;
mod config;
mod display;
mod error;
mod metadata;
mod rate_limit;

use analysis::descriptions::DescriptionTable;
use analysis::synergy::{validate_enemy_selection, SynergyEngine};
use analysis::timeline::{BuildSource, FetchProgress, TimelineEngine};
use anyhow::Context;
use api::cached::CachedSource;
use api::client::OpenDotaClient;
use api::MatchDataSource;
use cache::DiskCache;
use clap::{Parser, Subcommand};
use config::Config;
use display::output::{
    display_error, display_heroes, display_info, display_item_build, display_recommendations,
    display_success, display_usage, display_warning,
};
use error::AppError;
use indicatif::{ProgressBar, ProgressStyle};
use metadata::HeroCatalog;
use rate_limit::RequestLog;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "dota_counters")]
#[command(about = "Counter-picks and item timelines from OpenDota statistics", long_about = None)]
#[command(version)]
struct Args {
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Ignore the on-disk hero cache and fetch fresh data
    #[arg(long, global = true)]
    refresh: bool,

    /// Show OpenDota API usage after the command
    #[arg(long, global = true)]
    usage: bool,

    /// Log level for diagnostics on stderr (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recommend counter-picks against 2 or 4 enemy heroes
    Counters {
        /// Enemy hero names, e.g. "Anti-Mage" Pudge
        #[arg(required = true)]
        enemies: Vec<String>,

        /// OpenDota account id to attach your own hero stats
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Phase-bucketed item timeline for a hero (id or name)
    Build {
        hero: String,
    },

    /// List every known hero
    Heroes,
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        let code = match e.downcast_ref::<AppError>() {
            Some(app_error) if app_error.is_client_error() => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    let request_log = RequestLog::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "request log unreadable; starting a fresh one");
        RequestLog::new()
    });
    if !request_log.can_make_request() && config.api_key.is_none() {
        display_warning("Daily OpenDota allowance used up; requests may be rejected until the reset");
    }

    let client = OpenDotaClient::new(config.clone(), request_log);
    let source = CachedSource::new(client, config.cache_ttl_mins)
        .with_disk(DiskCache::in_default_dir())
        .refreshing(args.refresh);

    match &args.command {
        Command::Counters { enemies, account } => {
            run_counters(&config, &source, enemies, account.as_deref(), args.json)?
        }
        Command::Build { hero } => run_build(&config, &source, hero, args.json)?,
        Command::Heroes => run_heroes(&source, args.json)?,
    }

    if args.usage {
        display_usage(&source.inner().request_log());
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{}", json);
    Ok(())
}

fn run_counters<S: MatchDataSource>(
    config: &Config,
    source: &S,
    enemies: &[String],
    account: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    validate_enemy_selection(enemies)?;

    let descriptions = DescriptionTable::load(&config.counters_path);
    let engine = SynergyEngine::new(source, &descriptions).with_top_picks(config.top_synergy_picks);

    if !json {
        display_info(&format!("Ranking counter-picks against {}", enemies.join(", ")));
    }
    let recommendations = engine.recommend(enemies, account)?;

    if json {
        return print_json(&serde_json::json!({ "recommendations": recommendations.results }));
    }
    display_success(&format!("{} heroes known", engine.catalog().len()));
    display_recommendations(&recommendations);
    Ok(())
}

fn run_build<S: MatchDataSource>(config: &Config, source: &S, hero: &str, json: bool) -> anyhow::Result<()> {
    let catalog = HeroCatalog::resolve(source);
    // Numeric ids are accepted even when the catalog is unavailable.
    let hero_id = catalog
        .lookup(hero)
        .or_else(|| hero.trim().parse::<u32>().ok())
        .ok_or_else(|| AppError::HeroNotFound(hero.to_string()))?;
    let hero_name = catalog
        .get(hero_id)
        .map(|h| h.display_name.clone())
        .unwrap_or_else(|| format!("hero #{}", hero_id));

    let pb = if json {
        ProgressBar::hidden()
    } else {
        display_info(&format!("Sampling up to {} pro matches for {}", config.pro_match_sample, hero_name));
        ProgressBar::new(0)
    };
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}") {
        pb.set_style(style);
    }
    pb.set_message("Fetching match details");
    let progress = |event: FetchProgress| match event {
        FetchProgress::Started { total } => pb.set_length(total as u64),
        FetchProgress::MatchDone => pb.inc(1),
    };

    let engine = TimelineEngine::new(source)
        .with_sample_size(config.pro_match_sample)
        .with_workers(config.fetch_workers)
        .with_deadline(config.timeline_deadline);
    let build = engine.build(hero_id, &progress);
    pb.finish_and_clear();
    tracing::info!(hero_id, items = build.phases.total_items(), "item build ready");

    if json {
        return print_json(&build.phases);
    }
    if let BuildSource::ProMatches(summary) = &build.source {
        if summary.matches_failed > 0 || summary.matches_skipped > 0 {
            display_warning(&format!(
                "{} match details failed and {} were skipped at the deadline",
                summary.matches_failed, summary.matches_skipped
            ));
        }
    }
    display_item_build(&hero_name, &build);
    Ok(())
}

fn run_heroes<S: MatchDataSource>(source: &S, json: bool) -> anyhow::Result<()> {
    let catalog = HeroCatalog::resolve(source);
    if json {
        let heroes: Vec<_> = catalog.heroes().collect();
        return print_json(&heroes);
    }
    display_heroes(&catalog);
    Ok(())
}
