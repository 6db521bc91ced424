use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mealscan_core::categories::category_names;
use mealscan_core::config::{Config, Settings};
use mealscan_core::session::SessionContext;
use mealscan_core::types::MealType;
use mealscan_pipeline::MealPipeline;

mod render;
mod repl;

#[derive(Parser)]
#[command(name = "mealscan", version, about = "Photo-based meal nutrition tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List catalog foods, optionally filtered by category
    Catalog {
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Analyze one image and print the detected foods
    Detect { image: PathBuf },
    /// Calculate one meal and show today's progress
    Calc {
        /// 朝食/昼食/夕食/おやつ or breakfast/lunch/dinner/snack
        #[arg(long)]
        meal: MealType,
        #[arg(required = true)]
        foods: Vec<String>,
        /// Save the meal after calculating it
        #[arg(long)]
        save: bool,
        #[arg(long)]
        user: Option<String>,
    },
    /// Latest saved meal per meal type
    History {
        #[arg(long)]
        user: Option<String>,
    },
    /// Interactive session
    Session {
        #[arg(long)]
        user: Option<String>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).try_init().ok();
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn build_pipeline(settings: &Settings) -> Result<MealPipeline> {
    let base = std::env::current_dir()?;
    let pb = spinner("Loading catalog and models...");
    let pipeline = MealPipeline::from_settings(settings, &base).await;
    pb.finish_and_clear();
    if let mealscan_core::catalog::CatalogSource::Builtin { reason } = pipeline.catalog().source() {
        eprintln!("⚠️  Using the built-in food list ({reason})");
    }
    Ok(pipeline)
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let pipeline = build_pipeline(&settings).await?;
    let user_or_default = |user: Option<String>| user.unwrap_or_else(|| settings.session.user_id.clone());

    match cli.command {
        Command::Catalog { categories } => {
            if categories.is_empty() {
                println!("categories: {}", category_names().join(", "));
                println!("{}", pipeline.catalog().all_identifiers().join("\n"));
            } else {
                println!("{}", pipeline.manual_options(&categories).join("\n"));
            }
        }
        Command::Detect { image } => {
            let bytes = std::fs::read(&image).with_context(|| format!("reading {}", image.display()))?;
            let pb = spinner("Analyzing image...");
            let (_, outcome) = pipeline.detect(SessionContext::new(settings.session.user_id.clone()), &bytes).await;
            pb.finish_and_clear();
            println!("{}", render::detection(&outcome));
        }
        Command::Calc { meal, foods, save, user } => {
            let today = chrono::Utc::now().date_naive();
            let (session, _) = pipeline.restore_day(SessionContext::new(user_or_default(user)), today).await;
            let (session, totals) = pipeline.calculate(session, &foods, meal);
            let Some(totals) = totals else {
                println!("{}", render::NO_CATALOG_FOODS);
                return Ok(());
            };
            println!("{meal}: {}", render::metrics_line(&totals));
            println!("{}", render::report(&pipeline.report(&session)));
            if save {
                let (_, outcome) = pipeline.save(session).await;
                println!("{}", render::save(&outcome));
            }
        }
        Command::History { user } => {
            let session = SessionContext::new(user_or_default(user));
            println!("{}", render::history(&pipeline.history(&session).await));
        }
        Command::Session { user } => repl::run_session(&pipeline, user_or_default(user)).await?,
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    debug!(vision = ?settings.vision.backend, store = ?settings.store.backend, "settings loaded");
    tokio::runtime::Runtime::new()?.block_on(run(cli, settings))
}
