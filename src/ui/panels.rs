use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::AppState;
use crate::ui::{plot, summary};

const CHART_HEIGHT: f32 = 600.0;

// ---------------------------------------------------------------------------
// Top bar – one tab per cohort plus the combined view
// ---------------------------------------------------------------------------

/// Render the cohort tabs and the load status.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = state.dataset() else {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(format!("Source: {}", state.config.source.display()));
        });
        return;
    };

    let tabs = dataset.view_names();
    let n_cohorts = dataset.cohort_names().len();
    let total_rows = dataset.total().len();
    let active = state.active_cohort.clone();

    ui.horizontal_wrapped(|ui: &mut Ui| {
        for tab in &tabs {
            if ui
                .selectable_label(active.as_deref() == Some(tab.as_str()), tab)
                .clicked()
            {
                state.select_cohort(tab);
            }
        }
    });

    ui.label(
        RichText::new(format!(
            "{n_cohorts} cohorts, {total_rows} people · {}",
            state.config.source.display()
        ))
        .small()
        .weak(),
    );
}

// ---------------------------------------------------------------------------
// Left side panel – threshold filter (combined view only)
// ---------------------------------------------------------------------------

pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let range = state.config.min_count;
    let mut min_count = state.min_count;
    ui.label("Show values with at least this many people:");
    let response = ui.add(egui::Slider::new(&mut min_count, range.min..=range.max));
    if response.changed() {
        state.set_min_count(min_count);
    }

    if let Some(Ok(view)) = &state.current_view {
        ui.add_space(8.0);
        ui.label(format!(
            "{} values, {} people shown",
            view.slices.len(),
            view.total
        ));
    }
}

// ---------------------------------------------------------------------------
// Central panel – chart and summary, or an error in place of the chart
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if let Some(msg) = state.load_error.clone() {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add_space(40.0);
            ui.label(RichText::new(msg).color(Color32::RED));
            if ui.button("Retry").clicked() {
                state.retry_load();
            }
        });
        return;
    }

    let Some(cohort) = state.active_cohort.clone() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Loading…");
        });
        return;
    };

    ui.heading(format!(
        "{} analysis - {cohort}",
        state.config.category_field
    ));
    ui.separator();

    match &state.current_view {
        Some(Ok(view)) if view.is_empty() => {
            ui.label(&view.title);
            ui.label(RichText::new("No records to show.").italics());
        }
        Some(Ok(view)) => {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.strong(&view.title);
                    plot::donut_chart(ui, view, CHART_HEIGHT);
                    ui.add_space(8.0);
                    ui.heading("Summary");
                    summary::summary_table(ui, view, &state.config.category_field);
                });
        }
        Some(Err(e)) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
        }
        None => {}
    }
}
