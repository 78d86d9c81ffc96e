use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// LearningConfig
// ---------------------------------------------------------------------------

/// Multipliers applied by the feedback layer to a recommendation's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Applied per positive (rating >= 4) matching feedback entry.
    #[serde(default = "default_boost")]
    pub boost: f64,
    /// Applied per negative (rating <= 2) matching feedback entry.
    #[serde(default = "default_penalty")]
    pub penalty: f64,
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,
    #[serde(default = "default_floor")]
    pub floor: f64,
}

fn default_boost() -> f64 {
    1.1
}

fn default_penalty() -> f64 {
    0.9
}

fn default_ceiling() -> f64 {
    1.0
}

fn default_floor() -> f64 {
    0.1
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            boost: default_boost(),
            penalty: default_penalty(),
            ceiling: default_ceiling(),
            floor: default_floor(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoutingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Matches at or below this confidence are dropped.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Other matches above this confidence are listed as alternatives.
    #[serde(default = "default_alternative_threshold")]
    pub alternative_threshold: f64,
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Two contexts are similar when their file counts differ by less than this.
    #[serde(default = "default_similarity_window")]
    pub similarity_window: usize,
    #[serde(default)]
    pub learning: LearningConfig,
}

fn default_min_confidence() -> f64 {
    0.3
}

fn default_alternative_threshold() -> f64 {
    0.2
}

fn default_max_alternatives() -> usize {
    3
}

fn default_max_results() -> usize {
    5
}

fn default_history_limit() -> usize {
    100
}

fn default_similarity_window() -> usize {
    10
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            alternative_threshold: default_alternative_threshold(),
            max_alternatives: default_max_alternatives(),
            max_results: default_max_results(),
            history_limit: default_history_limit(),
            similarity_window: default_similarity_window(),
            learning: LearningConfig::default(),
        }
    }
}

impl RoutingConfig {
    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Load `.router/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: RoutingConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let unit = |name: &str, value: f64, warnings: &mut Vec<ConfigWarning>| {
            if !(0.0..=1.0).contains(&value) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{name} must be between 0 and 1, got {value}"),
                });
            }
        };

        unit("min_confidence", self.min_confidence, &mut warnings);
        unit("alternative_threshold", self.alternative_threshold, &mut warnings);
        unit("learning.ceiling", self.learning.ceiling, &mut warnings);
        unit("learning.floor", self.learning.floor, &mut warnings);

        if self.learning.floor > self.learning.ceiling {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "learning.floor ({}) is above learning.ceiling ({})",
                    self.learning.floor, self.learning.ceiling
                ),
            });
        }

        if self.learning.boost < 1.0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "learning.boost is {} so positive feedback lowers confidence",
                    self.learning.boost
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.learning.penalty) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "learning.penalty is {} so negative feedback does not lower confidence",
                    self.learning.penalty
                ),
            });
        }

        if self.alternative_threshold > self.min_confidence {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "alternative_threshold is above min_confidence; some listed recommendations will have no alternatives".to_string(),
            });
        }

        if self.max_results == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "max_results is 0: no recommendation can ever be returned".to_string(),
            });
        }

        if self.history_limit == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "history_limit is 0: feedback will never influence confidence".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
