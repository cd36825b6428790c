use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

// Everything that shapes a report run. Loaded from report.toml when present, defaults otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportContext {
    pub team_name: String,

    pub source: String,
    pub sources: BTreeMap<String, PathBuf>,
    pub column_renames: BTreeMap<String, String>,

    pub top_n: usize,
    pub rank_top_games_by_total: bool, // false keeps the first N games in dataset order

    pub bar_width: usize,
    pub primary_color: String,
    pub secondary_color: String,
}

impl Default for ReportContext {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert("nba_vegas".to_string(), PathBuf::from("data/nba_vegas.csv"));

        let mut column_renames = BTreeMap::new();
        column_renames.insert("oppteam".to_string(), "opp_team".to_string());
        column_renames.insert("average_line_ou".to_string(), "avg_ou_line".to_string());

        Self {
            team_name: "L.A. Lakers".to_string(),

            source: "nba_vegas".to_string(),
            sources,
            column_renames,

            top_n: 10,
            rank_top_games_by_total: true,

            bar_width: 40,
            primary_color: "#552583".to_string(),   // Lakers purple
            secondary_color: "#FDB927".to_string(), // Lakers gold
        }
    }
}

impl ReportContext {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ReportError::Config(format!("Failed to parse config: {}", e)))
    }

    // Falls back to defaults when there is no config file, like a fresh checkout would.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReportError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // Resolves a named data source to the file backing it. An unknown name has no data behind
    // it, so it gets the warning page like a missing file.
    pub fn source_path(&self, name: &str) -> Result<&Path> {
        self.sources
            .get(name)
            .map(|p| p.as_path())
            .ok_or_else(|| ReportError::DataUnavailable(format!("unknown data source {}", name)))
    }
}
