use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::color::Palette;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Dashboard of the category distribution (nationality by default) of every
/// cohort in a survey workbook.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) JSON configuration. Command line values override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// (file or directory) The workbook (.xlsx, .xls, .ods) or a directory
    /// holding one <cohort>.csv / .json / .parquet per cohort.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// (comma-separated) Cohorts to load, in tab order. Defaults to the
    /// configured list.
    #[arg(long, value_delimiter = ',')]
    pub cohorts: Option<Vec<String>>,

    /// Name of the column to group on.
    #[arg(long)]
    pub field: Option<String>,

    /// Initial minimum number of people per value in the combined view.
    #[arg(long)]
    pub min_count: Option<usize>,

    /// (file path or 'stdout') Write every cohort's view as JSON to the given
    /// location and exit without opening a window.
    #[arg(short, long)]
    pub out: Option<String>,

    /// If passed as an argument, will turn on verbose logging.
    #[arg(long)]
    pub verbose: bool,
}

// ---------------------------------------------------------------------------
// Configuration file
// ---------------------------------------------------------------------------

const DEFAULT_COHORTS: &[&str] = &[
    "AMBA 2019",
    "AMBA 2022",
    "EMBA 2018 FDS",
    "EMBA JULIO 2018",
    "EMBA FDS 2020",
    "EMBA 3X3 2020",
    "EMBA 3X3 2021",
    "EMBA FDS 2021",
    "EMBA FDS 2022",
    "EMBA 3X3 2022",
];

/// Bounds and starting value of the combined view's threshold slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinCountRange {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

impl Default for MinCountRange {
    fn default() -> Self {
        MinCountRange {
            min: 1,
            max: 50,
            default: 10,
        }
    }
}

impl MinCountRange {
    pub fn clamp(&self, value: usize) -> usize {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Workbook or directory the cohorts are read from.
    pub source: PathBuf,
    /// Cohort (sheet) names in tab order.
    pub cohorts: Vec<String>,
    /// Name of the synthetic view combining all cohorts.
    pub total_name: String,
    pub category_field: String,
    pub min_count: MinCountRange,
    /// `#rrggbb` slice colours; omitted means the built-in palette.
    pub palette: Option<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: PathBuf::from("nacio.xlsx"),
            cohorts: DEFAULT_COHORTS.iter().map(|s| s.to_string()).collect(),
            total_name: "TOTAL".to_string(),
            category_field: "Nationality".to_string(),
            min_count: MinCountRange::default(),
            palette: None,
        }
    }
}

impl AppConfig {
    /// Read a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Config file (if any) overridden by command line values, validated.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(input) = &args.input {
            config.source = input.clone();
        }
        if let Some(cohorts) = &args.cohorts {
            config.cohorts = cohorts.iter().map(|c| c.trim().to_string()).collect();
        }
        if let Some(field) = &args.field {
            config.category_field = field.clone();
        }
        if let Some(min_count) = args.min_count {
            config.min_count.default = min_count;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the slider range and clamp its starting value into it.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let range = &mut self.min_count;
        if range.min == 0 {
            return Err(ConfigError::InvalidRange(
                "the minimum must be at least 1".to_string(),
            ));
        }
        if range.min > range.max {
            return Err(ConfigError::InvalidRange(format!(
                "min {} is greater than max {}",
                range.min, range.max
            )));
        }
        range.default = range.clamp(range.default);
        // Surface bad colours at startup rather than on first render.
        self.palette()?;
        Ok(())
    }

    pub fn palette(&self) -> Result<Palette, ConfigError> {
        match &self.palette {
            Some(hexes) => Palette::from_hex(hexes),
            None => Ok(Palette::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn config_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn defaults_match_the_survey_workbook() {
        let config = AppConfig::resolve(&Args::default()).unwrap();
        assert_eq!(config.source, PathBuf::from("nacio.xlsx"));
        assert_eq!(config.cohorts.len(), 10);
        assert_eq!(config.cohorts[0], "AMBA 2019");
        assert_eq!(config.total_name, "TOTAL");
        assert_eq!(config.min_count, MinCountRange::default());
        assert_eq!(config.palette().unwrap(), Palette::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = config_file(
            r##"{"category_field": "Nacionalidad", "min_count": {"default": 5}, "palette": ["#000000"]}"##,
        );
        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Args::default()
        };
        let config = AppConfig::resolve(&args).unwrap();
        assert_eq!(config.category_field, "Nacionalidad");
        assert_eq!(config.min_count.default, 5);
        assert_eq!(config.min_count.max, 50);
        assert_eq!(config.palette().unwrap().len(), 1);
    }

    #[test]
    fn command_line_overrides_file() {
        let file = config_file(r#"{"source": "a.xlsx", "cohorts": ["X"]}"#);
        let args = Args::parse_from([
            "cohort-lens",
            "--config",
            file.path().to_str().unwrap(),
            "--input",
            "b.xlsx",
            "--cohorts",
            "AMBA 2019, AMBA 2022",
            "--min-count",
            "80",
        ]);
        let config = AppConfig::resolve(&args).unwrap();
        assert_eq!(config.source, PathBuf::from("b.xlsx"));
        assert_eq!(config.cohorts, ["AMBA 2019", "AMBA 2022"]);
        // Clamped into the slider range.
        assert_eq!(config.min_count.default, 50);
    }

    #[test]
    fn invalid_ranges_and_colours_are_rejected() {
        let file = config_file(r#"{"min_count": {"min": 0}}"#);
        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Args::default()
        };
        assert!(matches!(
            AppConfig::resolve(&args),
            Err(ConfigError::InvalidRange(_))
        ));

        let mut config = AppConfig {
            min_count: MinCountRange {
                min: 10,
                max: 5,
                default: 7,
            },
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange(_))));

        let mut config = AppConfig {
            palette: Some(vec!["#zzzzzz".to_string()]),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidColor(_))));
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/cohort-lens.json")),
            ..Args::default()
        };
        assert!(matches!(AppConfig::resolve(&args), Err(ConfigError::Io { .. })));

        let file = config_file("{ not json");
        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Args::default()
        };
        assert!(matches!(AppConfig::resolve(&args), Err(ConfigError::Json { .. })));
    }
}
