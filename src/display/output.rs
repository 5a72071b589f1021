use crate::analysis::items::{Phase, PhaseBuild};
use crate::analysis::synergy::Recommendations;
use crate::analysis::timeline::{BuildSource, ItemBuild};
use crate::metadata::HeroCatalog;
use crate::rate_limit::{RequestLog, MAX_REQUESTS_PER_DAY, MAX_REQUESTS_PER_MINUTE};
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct CounterRow {
    enemy: String,
    #[tabled(rename = "pick")]
    hero: String,
    win_rate: String,
    advantage: String,
    games: String,
    #[tabled(rename = "you")]
    personal: String,
}

#[derive(Tabled)]
struct ItemRow {
    item: String,
    time: String,
}

#[derive(Tabled)]
struct HeroRow {
    id: u32,
    name: String,
    portrait: String,
}

pub fn display_recommendations(recommendations: &Recommendations) {
    println!("\n{}", "🛡️  Counter-pick Recommendations".bold().cyan());
    println!("{}\n", "=".repeat(72).cyan());

    for name in &recommendations.unresolved {
        display_warning(&format!("Unknown hero '{}' skipped", name));
    }
    for name in &recommendations.degraded {
        display_warning(&format!("Matchup data for {} is unavailable right now", name));
    }
    if recommendations.personal_stats_failed {
        display_warning("Personal stats could not be fetched; showing zeros");
    }

    if recommendations.results.is_empty() {
        println!("{}", "No counter-picks available (not enough data)".yellow());
        return;
    }

    let rows: Vec<CounterRow> = recommendations
        .results
        .iter()
        .map(|r| CounterRow {
            enemy: r.enemy_hero.clone(),
            hero: r.name.clone(),
            win_rate: format!("{:.2}%", r.win_rate),
            advantage: format!("{:+.2}", r.advantage),
            games: r.games_played.to_string(),
            personal: if r.personal_stats.games > 0 {
                format!(
                    "{}/{} ({:.1}%)",
                    r.personal_stats.wins, r.personal_stats.games, r.personal_stats.win_rate
                )
            } else {
                "-".to_string()
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    println!("\n{}", "Why".bold().yellow());
    for r in &recommendations.results {
        println!("• {}", r.description);
    }
    println!();
}

pub fn display_item_build(hero_name: &str, build: &ItemBuild) {
    println!(
        "\n{}",
        format!("🧰 Item Timeline for {}", hero_name).bold().cyan()
    );
    println!("{}", "=".repeat(60).cyan());

    match &build.source {
        BuildSource::ProMatches(summary) => println!(
            "{}\n",
            format!(
                "Averaged over {} of {} recent pro matches",
                summary.matches_with_purchases, summary.matches_listed
            )
            .dimmed()
        ),
        BuildSource::Popularity(_) => {
            display_warning("No pro purchase logs available; showing aggregate item popularity");
            println!();
        }
        BuildSource::Unavailable(_) => {
            display_warning("Item data is unavailable right now");
            println!();
        }
    }

    display_phases(&build.phases);
}

fn display_phases(phases: &PhaseBuild) {
    for phase in Phase::ALL {
        println!("{}", phase.label().bold().yellow());
        let entries = phases.phase(phase);
        if entries.is_empty() {
            println!("  {}\n", "(none)".dimmed());
            continue;
        }
        let rows: Vec<ItemRow> = entries
            .iter()
            .map(|e| ItemRow {
                item: e.display_name.clone(),
                time: e.formatted_time.clone(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}\n", table);
    }
}

pub fn display_heroes(catalog: &HeroCatalog) {
    if catalog.is_empty() {
        println!("{}", "No heroes known (hero list unavailable)".yellow());
        return;
    }

    println!("\n{}", format!("📜 {} Heroes", catalog.len()).bold().cyan());
    let rows: Vec<HeroRow> = catalog
        .heroes()
        .map(|h| HeroRow {
            id: h.id,
            name: h.display_name.clone(),
            portrait: h.portrait_url.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_usage(log: &RequestLog) {
    let until_reset = log.time_until_reset();
    println!("\n📊 OpenDota API usage");
    println!("   Daily:  {}/{} requests", log.requests_today, MAX_REQUESTS_PER_DAY);
    println!("   Minute: {}/{} requests", log.requests_this_minute, MAX_REQUESTS_PER_MINUTE);
    println!("   Remaining: {} requests today", log.get_remaining());
    println!(
        "   Reset in: {}h {}m\n",
        until_reset.num_hours(),
        until_reset.num_minutes() % 60
    );
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
