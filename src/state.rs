use log::{error, warn};
use once_cell::unsync::OnceCell;

use crate::color::Palette;
use crate::config::AppConfig;
use crate::data::loader::load_from_path;
use crate::data::model::Dataset;
use crate::error::ViewError;
use crate::view::{view_for, ViewModel, ViewSettings};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Slice colours shared by every chart.
    pub palette: Palette,

    /// Written at most once, on first successful load; read-only afterwards.
    dataset: OnceCell<Dataset>,

    /// Load failure shown in the UI. Cleared by [`AppState::retry_load`].
    pub load_error: Option<String>,

    /// Tab currently shown (a cohort name or the total).
    pub active_cohort: Option<String>,

    /// Threshold for the combined view.
    pub min_count: usize,

    /// View for the active tab, recomputed on every selection change.
    pub current_view: Option<Result<ViewModel, ViewError>>,
}

impl AppState {
    pub fn new(config: AppConfig, palette: Palette) -> Self {
        let min_count = config.min_count.default;
        Self {
            config,
            palette,
            dataset: OnceCell::new(),
            load_error: None,
            active_cohort: None,
            min_count,
            current_view: None,
        }
    }

    /// State around an already loaded dataset.
    pub fn with_dataset(config: AppConfig, palette: Palette, dataset: Dataset) -> Self {
        let mut state = Self::new(config, palette);
        state.dataset = OnceCell::from(dataset);
        state.select_first();
        state
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.get()
    }

    /// Load the dataset unless it is already loaded or the last attempt
    /// failed.
    pub fn ensure_loaded(&mut self) {
        if self.dataset.get().is_some() || self.load_error.is_some() {
            return;
        }

        let config = &self.config;
        let result = self
            .dataset
            .get_or_try_init(|| load_from_path(&config.source, &config.cohorts, &config.total_name))
            .map(|_| ());

        match result {
            Ok(()) => self.select_first(),
            Err(e) => {
                error!("Failed to load {}: {e}", self.config.source.display());
                self.load_error = Some(format!("Error: {e}"));
            }
        }
    }

    /// Forget the last load failure and try again.
    pub fn retry_load(&mut self) {
        self.load_error = None;
        self.ensure_loaded();
    }

    fn select_first(&mut self) {
        let first = self.dataset().and_then(|ds| ds.view_names().into_iter().next());
        if let Some(name) = first {
            self.select_cohort(&name);
        }
    }

    /// Switch tabs and rebuild the view.
    pub fn select_cohort(&mut self, cohort: &str) {
        self.active_cohort = Some(cohort.to_string());
        self.refresh();
    }

    /// Move the combined view's threshold, clamped to the configured range.
    pub fn set_min_count(&mut self, min_count: usize) {
        let clamped = self.config.min_count.clamp(min_count);
        if clamped != self.min_count {
            self.min_count = clamped;
            if self.is_total_active() {
                self.refresh();
            }
        }
    }

    pub fn is_total_active(&self) -> bool {
        match (self.dataset(), &self.active_cohort) {
            (Some(ds), Some(active)) => ds.is_total(active),
            _ => false,
        }
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            category_field: self.config.category_field.clone(),
            min_count: self.min_count,
        }
    }

    /// Recompute `current_view` for the active tab.
    pub fn refresh(&mut self) {
        let (Some(ds), Some(cohort)) = (self.dataset.get(), self.active_cohort.as_deref()) else {
            self.current_view = None;
            return;
        };
        let view = view_for(ds, cohort, &self.view_settings(), &self.palette);
        if let Err(e) = &view {
            warn!("No view for '{cohort}': {e}");
        }
        self.current_view = Some(view);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::data::aggregate::tests::records;
    use crate::data::model::CohortTable;

    fn config() -> AppConfig {
        AppConfig {
            cohorts: vec!["AMBA 2019".to_string(), "AMBA 2022".to_string()],
            ..AppConfig::default()
        }
    }

    fn state() -> AppState {
        let values = [
            ("AMBA 2019", vec!["AR"; 12]),
            ("AMBA 2022", vec!["BR", "BR", "CL"]),
        ];
        let tables = values
            .iter()
            .map(|(name, vals)| {
                let table = CohortTable::new(vec!["Nationality".to_string()], records(vals));
                (name.to_string(), table)
            })
            .collect();
        AppState::with_dataset(
            config(),
            Palette::default(),
            Dataset::from_cohorts(tables, "TOTAL"),
        )
    }

    fn labels(state: &AppState) -> Vec<String> {
        match &state.current_view {
            Some(Ok(view)) => view.slices.iter().map(|s| s.label.clone()).collect(),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn starts_on_first_cohort() {
        let state = state();
        assert_eq!(state.active_cohort.as_deref(), Some("AMBA 2019"));
        assert_eq!(state.min_count, 10);
        assert_eq!(labels(&state), ["AR"]);
        assert!(!state.is_total_active());
    }

    #[test]
    fn preloaded_dataset_is_never_reloaded() {
        let mut state = state();
        state.config.source = PathBuf::from("/nonexistent/nacio.xlsx");
        state.ensure_loaded();
        assert!(state.load_error.is_none());
        assert_eq!(state.dataset().map(|ds| ds.total().len()), Some(15));
    }

    #[test]
    fn threshold_only_changes_the_total() {
        let mut state = state();
        state.select_cohort("TOTAL");
        assert!(state.is_total_active());
        assert_eq!(labels(&state), ["AR"]);

        state.set_min_count(1);
        assert_eq!(labels(&state), ["AR", "BR", "CL"]);

        state.set_min_count(2);
        assert_eq!(labels(&state), ["AR", "BR"]);

        state.select_cohort("AMBA 2022");
        assert_eq!(labels(&state), ["BR", "CL"]);
    }

    #[test]
    fn threshold_is_clamped_to_range() {
        let mut state = state();
        state.set_min_count(0);
        assert_eq!(state.min_count, 1);
        state.set_min_count(500);
        assert_eq!(state.min_count, 50);
    }

    #[test]
    fn schema_error_is_kept_for_display() {
        let mut state = state();
        state.config.category_field = "Nacionalidad".to_string();
        state.refresh();
        assert!(matches!(
            state.current_view,
            Some(Err(ViewError::Schema(_)))
        ));
    }

    #[test]
    fn failed_load_is_reported_once() {
        let mut state = AppState::new(
            AppConfig {
                source: PathBuf::from("/nonexistent/nacio.xlsx"),
                ..config()
            },
            Palette::default(),
        );
        state.ensure_loaded();
        assert!(state.dataset().is_none());
        assert!(state.load_error.as_deref().unwrap().starts_with("Error:"));
        assert!(state.current_view.is_none());

        // No reload until asked.
        state.config.source = PathBuf::from("/still/missing.xlsx");
        state.ensure_loaded();
        assert!(state.load_error.as_deref().unwrap().contains("nacio.xlsx"));

        state.retry_load();
        assert!(state.load_error.as_deref().unwrap().contains("missing.xlsx"));
    }
}
