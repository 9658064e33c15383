use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use cosmet_prefilter::Prefilter;
use cosmet_scheduler::{finish_item, refresh_risk_flags, GeneratorConfig, NotificationGenerator};
use cosmet_storage::InventoryStore;
use cosmet_suggest::{ClassifierConfig, HttpClassifier, SuggestError, SuggestionPipeline};
use cosmet_taxonomy::seed_default;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cosmet")]
#[command(about = "Cosmetics inventory toolkit", long_about = None)]
struct Cli {
    /// Path to the sqlite inventory database.
    #[arg(long, default_value = "cosmet.sqlite3", global = true)]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the seeded category tree.
    Taxons,
    /// Suggest leaf categories for a free-text product description.
    Suggest {
        text: String,
        #[arg(long, default_value_t = 1)]
        user: i64,
        #[arg(long)]
        item: Option<i64>,
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },
    /// Record the category the user finally chose for a suggestion.
    Confirm { record_id: i64, taxon_id: i64 },
    /// Generate expiry reminder notifications (idempotent, cron-friendly).
    Notify {
        /// Emit overdue reminders regardless of weekday.
        #[arg(long)]
        every_day: bool,
    },
    /// Mark an item as finished today.
    Finish { item_id: i64 },
    /// Per-bucket expiry summary for one user.
    Stats {
        #[arg(long, default_value_t = 1)]
        user: i64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let now = Utc::now();
    let today = now.date_naive();

    match cli.command {
        Commands::Taxons => {
            let taxonomy = seed_default().context("failed to build the category tree")?;
            for leaf in taxonomy.leaf_candidates() {
                println!("{:>4}  {}", leaf.id, leaf.path);
            }
        }
        Commands::Suggest {
            text,
            user,
            item,
            top_k,
        } => {
            let taxonomy = seed_default().context("failed to build the category tree")?;
            let store = InventoryStore::open(&cli.db)
                .with_context(|| format!("failed to open {}", cli.db.display()))?;
            let classifier = HttpClassifier::new(ClassifierConfig::from_env())
                .context("failed to build the classifier client")?;
            let pipeline = SuggestionPipeline::new(classifier, Prefilter::default(), top_k);

            let leaves = taxonomy.leaf_candidates();
            match pipeline.suggest_category(&leaves, &store, user, item, &text, now) {
                Ok(outcome) => {
                    if outcome.candidates.is_empty() {
                        println!("No matching category.");
                    }
                    for (candidate, record_id) in
                        outcome.candidates.iter().zip(&outcome.record_ids)
                    {
                        println!(
                            "{:>4}  {:.2}  {}  (record {})",
                            candidate.taxon_id, candidate.confidence, candidate.path, record_id
                        );
                    }
                    tracing::debug!(?outcome.report, "suggestion pipeline counters");
                }
                Err(err @ SuggestError::ClassifierTimeout(_)) => {
                    // Retryable: the classifier is slow, not broken.
                    anyhow::bail!("{err} (try again)");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Confirm {
            record_id,
            taxon_id,
        } => {
            let store = InventoryStore::open(&cli.db)
                .with_context(|| format!("failed to open {}", cli.db.display()))?;
            let record = store
                .confirm_suggestion(record_id, taxon_id)
                .context("failed to confirm the suggestion")?;
            println!(
                "record {} confirmed: chosen {} ({})",
                record.record_id,
                taxon_id,
                if record.accepted { "accepted" } else { "overridden" }
            );
        }
        Commands::Notify { every_day } => {
            let store = InventoryStore::open(&cli.db)
                .with_context(|| format!("failed to open {}", cli.db.display()))?;
            let config = if every_day {
                GeneratorConfig {
                    overdue_weekday: None,
                }
            } else {
                GeneratorConfig::default()
            };
            refresh_risk_flags(&store, today, now).context("failed to refresh risk flags")?;
            let report = NotificationGenerator::new(config)
                .run(&store, today, now)
                .context("notification generation failed")?;
            println!(
                "created {} notifications ({} scanned): expired {}, week {}, biweek {}, month {}",
                report.total_created(),
                report.items_scanned,
                report.expired,
                report.week,
                report.biweek,
                report.month
            );
        }
        Commands::Finish { item_id } => {
            let store = InventoryStore::open(&cli.db)
                .with_context(|| format!("failed to open {}", cli.db.display()))?;
            let item = finish_item(&store, item_id, today, today, now)
                .context("failed to finish the item")?;
            println!("item {} ({}) finished on {}", item.item_id, item.name, today);
        }
        Commands::Stats { user } => {
            let store = InventoryStore::open(&cli.db)
                .with_context(|| format!("failed to open {}", cli.db.display()))?;
            let stats = store
                .expiry_stats(user, today)
                .context("failed to compute expiry stats")?;
            println!("expired: {}", stats.expired);
            println!("week:    {}", stats.week);
            println!("biweek:  {}", stats.biweek);
            println!("month:   {}", stats.month);
            println!("safe:    {}", stats.safe);
            println!("unread notifications: {}", store.unread_count(user)?);
        }
    }

    Ok(())
}
