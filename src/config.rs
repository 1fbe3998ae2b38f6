//! Scoring configuration
//!
//! Settings that change how results are scored but are not part of the event data itself.
//! Everything has a default, so an empty YAML document is a valid configuration:
//!
//! ```yaml
//! additionalPenaltyUnit: Minutes
//! finishTimeToleranceSecs: 5
//! pointsFormula:
//!   ok: "1000 - (([RESULT].time - [FIRST_RESULT].time) / [FIRST_RESULT].time) * 1000"
//!   notOk: "0"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::scoring::formula::PointsFormula;
use crate::{Result, ScoringError};

/// Seconds of slack allowed between an entered finish time and the one rebuilt from the reader.
pub const DEFAULT_FINISH_TIME_TOLERANCE_SECS: i64 = 5;

/// Unit of `RaceResult::additional_penalty` for time-scored classes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
pub enum PenaltyUnit {
    #[default]
    Minutes,
    Seconds,
}

impl PenaltyUnit {
    /// Convert a penalty in this unit to seconds.
    pub fn to_seconds(self, value: i64) -> i64 {
        match self {
            PenaltyUnit::Minutes => value.saturating_mul(60),
            PenaltyUnit::Seconds => value,
        }
    }
}

/// Options for the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ScoringConfig {
    pub additional_penalty_unit: PenaltyUnit,
    pub finish_time_tolerance_secs: i64,
    /// Formula applied after ranking; results keep their points when unset
    pub points_formula: Option<PointsFormula>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            additional_penalty_unit: PenaltyUnit::default(),
            finish_time_tolerance_secs: DEFAULT_FINISH_TIME_TOLERANCE_SECS,
            points_formula: None,
        }
    }
}

impl ScoringConfig {
    /// Parse a configuration from YAML and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ScoringConfig = serde_yaml_ng::from_str(yaml).map_err(|e| ScoringError::Parse {
            context: "Scoring config YAML deserialization".to_string(),
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ScoringError::file_error(path.to_path_buf(), source))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Loading scoring config from {}", path.display()))?;
        debug!(path = %path.display(), unit = ?config.additional_penalty_unit, "Loaded scoring config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.finish_time_tolerance_secs < 0 {
            return Err(ScoringError::config(format!(
                "finishTimeToleranceSecs must not be negative, got {}",
                self.finish_time_tolerance_secs
            )));
        }
        if let Some(formula) = &self.points_formula {
            formula.check()?;
        }
        Ok(())
    }
}
