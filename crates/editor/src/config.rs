use crate::{interaction::DEFAULT_ACTIVATION_DISTANCE, session::LabelFailurePolicy};
use importer::normalize::ReferencePolicy;
use std::path::PathBuf;
use thiserror::Error;

/// Backend assumed when `TIMETABLE_BACKEND_URL` is unset
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:1420";
/// Directory the CSV tables are read from when `TIMETABLE_CSV_DIR` is unset
pub const DEFAULT_CSV_DIR: &str = "./csvdata";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings of the editor
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub backend_url: String,
    pub csv_dir: PathBuf,
    /// Where imported tables are kept between runs; in memory when `None`
    pub table_dir: Option<PathBuf>,
    pub activation_distance: f64,
    pub label_failure: LabelFailurePolicy,
    pub reference_policy: ReferencePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            csv_dir: PathBuf::from(DEFAULT_CSV_DIR),
            table_dir: None,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            label_failure: LabelFailurePolicy::default(),
            reference_policy: ReferencePolicy::default(),
        }
    }
}

impl EditorConfig {
    /// Reads the configuration from the environment, loading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, which maps a variable name to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("TIMETABLE_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(dir) = lookup("TIMETABLE_CSV_DIR") {
            config.csv_dir = PathBuf::from(dir);
        }
        config.table_dir = lookup("TIMETABLE_TABLE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        if let Some(value) = lookup("TIMETABLE_ACTIVATION_DISTANCE") {
            config.activation_distance = match value.trim().parse::<f64>() {
                Ok(distance) if distance.is_finite() && distance >= 0.0 => distance,
                Ok(_) => {
                    return Err(invalid(
                        "TIMETABLE_ACTIVATION_DISTANCE",
                        value,
                        "must be a non-negative number",
                    ));
                }
                Err(e) => return Err(invalid("TIMETABLE_ACTIVATION_DISTANCE", value, e)),
            };
        }

        if let Some(value) = lookup("TIMETABLE_LABEL_FAILURE") {
            config.label_failure = value
                .trim()
                .parse()
                .map_err(|e| invalid("TIMETABLE_LABEL_FAILURE", value.clone(), e))?;
        }

        if let Some(value) = lookup("TIMETABLE_STRICT_REFERENCES") {
            config.reference_policy = match value.trim() {
                "1" | "true" => ReferencePolicy::Reject,
                "0" | "false" => ReferencePolicy::Propagate,
                _ => {
                    return Err(invalid(
                        "TIMETABLE_STRICT_REFERENCES",
                        value,
                        "expected true or false",
                    ));
                }
            };
        }

        Ok(config)
    }
}

fn invalid(name: &'static str, value: String, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value,
        reason: reason.to_string(),
    }
}
