//! `edufad` command-line client.
//!
//! # Responsibility
//! - Load configuration from `.env`, the environment and flag overrides.
//! - Run one read-only use case against the remote service and print JSON.
//! - Optionally write dashboard charts as SVG files.

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use edufad_core::chart::{render_bars, render_line, to_svg, CanvasBounds};
use edufad_core::config::{ENV_BASE_URL, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_TOKEN, ENV_VIEW_BINDINGS};
use edufad_core::service::compare::CompareOptions;
use edufad_core::service::dashboard::{AggregateOptions, DEFAULT_WATCHLIST_MAX_SUPPORT};
use edufad_core::view::ViewBindings;
use edufad_core::{
    init_logging_from_config, AppContext, ClientConfig, HttpAssessmentApi, Support,
};
use log::{error, info};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "edufad")]
#[command(about = "EduFAD assessment client", version)]
struct Cli {
    /// Overrides EDUFAD_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Overrides EDUFAD_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,
    /// Overrides EDUFAD_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Overrides EDUFAD_LOG_DIR.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    /// Overrides EDUFAD_VIEW_BINDINGS.
    #[arg(long, global = true)]
    view_bindings: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the checklist taxonomy.
    Checklist,
    /// Aggregate a subject's dashboard.
    Dashboard {
        #[arg(long)]
        subject: String,
        /// Use the remote dashboard endpoint instead of aggregating locally.
        #[arg(long, default_value_t = false)]
        remote: bool,
        #[arg(long, default_value_t = false)]
        finalized_only: bool,
        #[command(flatten)]
        svg: SvgArgs,
    },
    /// Per-item support deltas between two assessments.
    Compare {
        #[arg(long)]
        a: String,
        #[arg(long)]
        b: String,
        #[arg(long, default_value_t = false)]
        remote: bool,
        #[arg(long, default_value_t = false)]
        allow_deleted: bool,
    },
    /// Subjects whose latest finalized assessment needs support on an item.
    Watchlist {
        #[arg(long)]
        item: String,
        #[arg(long, default_value_t = DEFAULT_WATCHLIST_MAX_SUPPORT)]
        max_support: u8,
    },
    /// Auto-generated summary of one assessment.
    Summary {
        #[arg(long)]
        assessment: String,
    },
}

#[derive(Args)]
struct SvgArgs {
    /// Write `progress.svg` and `categories.svg` into this directory.
    #[arg(long)]
    svg_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 640.0)]
    width: f64,
    #[arg(long, default_value_t = 320.0)]
    height: f64,
    #[arg(long, default_value_t = 32.0)]
    padding: f64,
}

impl Cli {
    fn overrides(&self) -> HashMap<&'static str, String> {
        [
            (ENV_BASE_URL, &self.base_url),
            (ENV_TOKEN, &self.token),
            (ENV_LOG_LEVEL, &self.log_level),
            (ENV_LOG_DIR, &self.log_dir),
            (ENV_VIEW_BINDINGS, &self.view_bindings),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|value| (key, value)))
        .collect()
    }

    fn config(&self) -> CliResult<ClientConfig> {
        let overrides = self.overrides();
        let config = ClientConfig::from_lookup(|key| {
            overrides
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        })?;
        Ok(config)
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_svg(dir: &Path, name: &str, svg: &str) -> CliResult<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, svg)?;
    info!(
        "event=chart_write module=cli status=ok path={}",
        path.display()
    );
    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = cli.config()?;
    init_logging_from_config(&config)?;

    let api = Arc::new(HttpAssessmentApi::from_config(&config)?);
    let ctx = AppContext::bootstrap(api, ViewBindings::for_version(config.view_bindings)).await?;

    match cli.command {
        Commands::Checklist => print_json(ctx.checklist().as_ref()),
        Commands::Dashboard {
            subject,
            remote,
            finalized_only,
            svg,
        } => {
            let dashboards = ctx.dashboard();
            let dashboard = if remote {
                dashboards.remote_subject_dashboard(&subject).await?
            } else {
                dashboards
                    .subject_dashboard(&subject, AggregateOptions { finalized_only })
                    .await?
            };
            if let Some(dir) = &svg.svg_dir {
                let bounds = CanvasBounds::new(svg.width, svg.height, svg.padding)?;
                let line = render_line(&bounds, &dashboard.series)?;
                let bars = render_bars(&bounds, &dashboard.category_snapshot)?;
                write_svg(dir, "progress.svg", &to_svg(&bounds, &line))?;
                write_svg(dir, "categories.svg", &to_svg(&bounds, &bars))?;
            }
            print_json(&dashboard)
        }
        Commands::Compare {
            a,
            b,
            remote,
            allow_deleted,
        } => {
            let compare = ctx.compare();
            let deltas = if remote {
                compare.remote_compare(&a, &b).await?
            } else {
                compare
                    .compare_assessments(&a, &b, CompareOptions { allow_deleted })
                    .await?
            };
            print_json(&deltas)
        }
        Commands::Watchlist { item, max_support } => {
            let rows = ctx
                .dashboard()
                .watchlist(&item, Support::new(max_support)?)
                .await?;
            print_json(&rows)
        }
        Commands::Summary { assessment } => {
            let text = ctx.summary(&assessment).await?;
            println!("{text}");
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={}", err);
            eprintln!("edufad: {err}");
            ExitCode::FAILURE
        }
    }
}
