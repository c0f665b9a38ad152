//! Admin CLI for the vitrine spotlight engine: manual rotation, placement
//! status, vote inspection, and development seeding.

use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use vitrine_core::{fitness_score, month_key, PlacementType};
use vitrine_db::PgStore;
use vitrine_engine::{
    eligibility, votes, BusinessStore, MetricsStore, RotationOutcome, RotationScheduler,
    RotationTrigger, SystemClock,
};

#[derive(Debug, Parser)]
#[command(name = "vitrine-cli")]
#[command(about = "Vitrine spotlight administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a rotation pass now.
    Rotate {
        /// Skip the manual-cooldown preflight.
        #[arg(long)]
        force: bool,
    },
    /// Show active placements and due-ness per placement type.
    Status,
    /// Show vote statistics for a month (defaults to the current month).
    Votes { month: Option<String> },
    /// Inspect one business: fitness score and per-type cooldowns.
    Business { id: i64 },
    /// Seed the demo directory (development only).
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let pool = vitrine_db::connect_pool_from_env().await?;
    vitrine_db::run_migrations(&pool).await?;
    let store = PgStore::new(pool.clone());

    match cli.command {
        Commands::Rotate { force } => rotate(store, force).await?,
        Commands::Status => status(&pool, store).await?,
        Commands::Votes { month } => show_votes(&store, month).await?,
        Commands::Business { id } => show_business(&store, id).await?,
        Commands::Seed => {
            let inserted = vitrine_db::seed::seed_demo_directory(&pool).await?;
            println!("seeded {inserted} demo businesses");
        }
    }

    Ok(())
}

async fn rotate(store: PgStore, force: bool) -> anyhow::Result<()> {
    let scheduler = RotationScheduler::new(store, SystemClock);

    if !force {
        let gate = scheduler.can_rotate_manually();
        if !gate.allowed {
            println!(
                "rotation not started: {}",
                gate.reason.unwrap_or_else(|| "not allowed".to_string())
            );
            return Ok(());
        }
    }

    match scheduler.rotate(RotationTrigger::Manual).await? {
        RotationOutcome::Completed(report) => {
            println!("archived {} expired placement(s)", report.archived);
            for result in &report.rotated {
                println!(
                    "{}: committed {} placement(s)",
                    result.placement,
                    result.committed.len()
                );
                for slot in &result.committed {
                    println!(
                        "  #{} business {} (score {:.1})",
                        slot.position, slot.business_id, slot.score
                    );
                }
            }
            for placement in &report.not_due {
                println!("{placement}: not due");
            }
            for (placement, error) in &report.failed {
                println!("{placement}: failed: {error}");
            }
        }
        RotationOutcome::Skipped(reason) => println!("rotation skipped: {reason:?}"),
    }

    Ok(())
}

async fn status(pool: &PgPool, store: PgStore) -> anyhow::Result<()> {
    let scheduler = RotationScheduler::new(store, SystemClock);
    let now = Utc::now();

    for placement in PlacementType::ALL {
        let active = vitrine_db::list_active_spotlights(pool, placement).await?;
        let due = scheduler.should_rotate(placement, now).await?;
        println!(
            "{placement}: {} of {} slot(s) filled{}",
            active.len(),
            placement.slot_count(),
            if due { ", rotation due" } else { "" }
        );
        for row in &active {
            println!(
                "  #{} business {} until {}",
                row.position,
                row.business_id,
                row.end_date.format("%Y-%m-%d %H:%M UTC")
            );
        }
    }

    Ok(())
}

async fn show_votes(store: &PgStore, month: Option<String>) -> anyhow::Result<()> {
    let now = Utc::now();
    let month = month.unwrap_or_else(|| month_key(now));
    let stats = votes::stats_for_month(store, &month, now).await?;

    println!("votes for {}:", stats.month);
    println!(
        "  {} vote(s) from {} voter(s) across {} business(es), {} day(s) left",
        stats.total_votes,
        stats.distinct_voters,
        stats.participating_businesses,
        stats.days_remaining
    );
    for (rank, count) in stats.top_businesses.iter().enumerate() {
        println!(
            "  {}. business {} — {} vote(s)",
            rank + 1,
            count.business_id,
            count.votes
        );
    }

    Ok(())
}

async fn show_business(store: &PgStore, id: i64) -> anyhow::Result<()> {
    let now = Utc::now();
    let business = store.business(id).await?;
    let metrics = store.engagement_metrics(id).await?;
    let score = fitness_score(&business, metrics.as_ref(), now);

    println!("{} ({})", business.name, business.slug);
    println!("  fitness score: {score}");
    if metrics.is_none() {
        println!("  no engagement metrics recorded");
    }
    for placement in PlacementType::ALL {
        match eligibility::cooldown_remaining(store, id, placement, now).await? {
            Some(remaining) => {
                let hours = remaining.num_hours();
                let minutes = remaining.num_minutes() % 60;
                println!("  {placement}: cooling down for {hours}h{minutes:02}m");
            }
            None => println!("  {placement}: outside cooldown"),
        }
    }

    let recent = vitrine_db::list_recent_history(store.pool(), id, 5).await?;
    if !recent.is_empty() {
        println!("  recent features:");
        for row in &recent {
            println!(
                "    {} #{} on {} (score {:.1})",
                row.placement_type,
                row.position,
                row.start_date.format("%Y-%m-%d"),
                row.total_score
            );
        }
    }

    Ok(())
}
