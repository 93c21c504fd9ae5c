//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs logging
//! - runs the theme pipeline on a tokio runtime
//! - prints reports/plots
//! - writes optional exports

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ThemeArgs};
use crate::error::AppError;
use crate::io::{ThemeExport, write_themes_json};

pub mod pipeline;

/// Entry point for the `herd` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))?;

    match cli.command {
        Command::Themes(args) => runtime.block_on(handle_themes(args, OutputMode::Full)),
        Command::Kpis(args) => runtime.block_on(handle_themes(args, OutputMode::KpisOnly)),
    }
}

/// Logs go to stderr so stdout carries only the report. `RUST_LOG` overrides the level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    KpisOnly,
}

async fn handle_themes(args: ThemeArgs, mode: OutputMode) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    let run = pipeline::run_themes(&args, today).await?;

    match mode {
        OutputMode::Full => {
            print!("{}", crate::report::format_header(run.entity, &run.range, &run.themes));
            for theme in &run.themes {
                print!("{}", crate::report::format_theme(theme));
                if args.no_plot {
                    continue;
                }
                for tab in &theme.tabs {
                    println!("\n[{}]", tab.title);
                    print!("{}", crate::plot::render_tab_plot(tab, args.width, args.height));
                }
            }
        }
        OutputMode::KpisOnly => {
            for theme in run.themes.iter().filter(|t| !t.kpis_data.is_empty()) {
                println!("{}", theme.theme);
                println!("{}", crate::report::format_kpi_table(&theme.kpis_data));
            }
        }
    }

    if let Some(path) = &args.export {
        let export = ThemeExport::new(run.entity, run.range, run.themes);
        write_themes_json(path, &export)?;
        tracing::info!(path = %path.display(), "themes exported");
    }

    Ok(())
}
