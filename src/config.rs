use crate::error::{FinancialSheetError, Result};
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CANDIDATE_FILES: [&str; 3] =
    ["Finansiell Data.xlsx", "finansiell_data.xlsx", "data.xlsx"];

/// Category rows at or below this magnitude (tSEK) are treated as noise.
pub const DEFAULT_NOISE_THRESHOLD: f64 = 10.0;

pub const DEFAULT_LABEL_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalyzerConfig {
    #[schemars(
        description = "File names probed in order when no workbook path is given. The first one that exists is loaded."
    )]
    pub candidate_files: Vec<String>,

    #[schemars(
        description = "Detail rows whose total magnitude (tSEK) is at or below this value are left out of category breakdowns."
    )]
    pub noise_threshold: f64,

    #[schemars(description = "Maximum number of characters of a category label in breakdowns.")]
    pub label_width: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            candidate_files: DEFAULT_CANDIDATE_FILES
                .iter()
                .map(|f| f.to_string())
                .collect(),
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            label_width: DEFAULT_LABEL_WIDTH,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.noise_threshold.is_finite() || self.noise_threshold < 0.0 {
            return Err(FinancialSheetError::ConfigError(format!(
                "noise_threshold must be a non-negative number, got {}",
                self.noise_threshold
            )));
        }
        if self.label_width == 0 {
            return Err(FinancialSheetError::ConfigError(
                "label_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the first candidate file that exists in `dir`.
    pub fn discover_workbook(&self, dir: &Path) -> Option<PathBuf> {
        for name in &self.candidate_files {
            let candidate = dir.join(name);
            if candidate.is_file() {
                debug!("Found workbook candidate: {}", candidate.display());
                return Some(candidate);
            }
        }

        warn!(
            "No workbook found in {} (tried {:?})",
            dir.display(),
            self.candidate_files
        );
        None
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(AnalyzerConfig);
        serde_json::to_string_pretty(&schema)
    }
}
