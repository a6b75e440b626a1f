mod app;
mod color;
mod config;
mod data;
mod error;
mod report;
mod state;
mod ui;
mod view;

use anyhow::{anyhow, Context, Result};
use app::CohortLensApp;
use clap::Parser;
use config::{AppConfig, Args};
use eframe::egui;
use log::{debug, LevelFilter};
use state::AppState;

fn main() -> Result<()> {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let config = AppConfig::resolve(&args).context("reading configuration")?;
    let palette = config.palette().context("reading palette")?;
    debug!("Configuration: {config:?}");

    if let Some(out) = &args.out {
        return report::write_report(&config, &palette, out);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let state = AppState::new(config, palette);
    eframe::run_native(
        "Cohort Lens – Nationality Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(CohortLensApp::new(state)))),
    )
    .map_err(|e| anyhow!("window error: {e}"))
}
