use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::color::Palette;
use crate::config::AppConfig;
use crate::data::loader::load_from_path;
use crate::data::model::Dataset;
use crate::view::{view_for, ViewModel, ViewSettings};

/// Every tab's view, as written by `--out`.
#[derive(Debug, Serialize)]
pub struct Report {
    pub category_field: String,
    pub min_count: usize,
    pub views: Vec<CohortReport>,
}

#[derive(Debug, Serialize)]
pub struct CohortReport {
    pub cohort: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewModel>,
    /// Set instead of `view` when the cohort could not be shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn build_report(dataset: &Dataset, settings: &ViewSettings, palette: &Palette) -> Report {
    let views = dataset
        .view_names()
        .into_iter()
        .map(|cohort| match view_for(dataset, &cohort, settings, palette) {
            Ok(view) => CohortReport {
                cohort,
                view: Some(view),
                error: None,
            },
            Err(e) => CohortReport {
                cohort,
                view: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Report {
        category_field: settings.category_field.clone(),
        min_count: settings.min_count,
        views,
    }
}

/// Load the configured source and write the report to `out` (a path or
/// `stdout`).
pub fn write_report(config: &AppConfig, palette: &Palette, out: &str) -> Result<()> {
    let dataset = load_from_path(&config.source, &config.cohorts, &config.total_name)
        .with_context(|| format!("loading {}", config.source.display()))?;
    let settings = ViewSettings {
        category_field: config.category_field.clone(),
        min_count: config.min_count.default,
    };
    let report = build_report(&dataset, &settings, palette);
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;

    if out == "stdout" {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{json}").context("writing report to stdout")?;
    } else {
        std::fs::write(out, json).with_context(|| format!("writing report to {out}"))?;
        log::info!("Wrote report for {} views to {out}", report.views.len());
    }
    Ok(())
}
