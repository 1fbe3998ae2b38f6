//! Competition categories and their scoring rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::policy::{ClassPolicy, RogainingPolicy, SequentialPolicy};

/// How a class is raced and scored.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
pub enum CourseClassType {
    /// Controls are visited in course order; ranked by time
    #[default]
    #[serde(rename = "Not specified")]
    NotSpecified,
    /// Controls are collected in any order within a time budget; ranked by points
    Rogaining,
}

impl CourseClassType {
    /// Matching, penalty and scoring rules for this class type.
    pub fn policy(self) -> &'static dyn ClassPolicy {
        match self {
            CourseClassType::NotSpecified => &SequentialPolicy,
            CourseClassType::Rogaining => &RogainingPolicy,
        }
    }
}

/// Value of a collected rogaining control.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
pub enum PointSystem {
    /// First digit of the control label
    #[serde(rename = "First code")]
    FirstCode,
    /// Last digit of the control label
    #[serde(rename = "Last code")]
    LastCode,
    /// Every control is worth one point
    #[serde(rename = "One point")]
    OnePoint,
    #[default]
    #[serde(rename = "No system")]
    NoSystem,
}

/// A competition category.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct CourseClass {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub class_type: CourseClassType,
    pub point_system: PointSystem,
    /// Minutes per missing control, or points per overtime minute for rogaining
    pub penalty: Option<i64>,
    /// Allowed time in minutes
    pub duration: Option<i64>,
    pub mass_start_time: Option<DateTime<Utc>>,
    pub finish_closing_time: Option<DateTime<Utc>>,
    /// Course variants raced under this class
    pub course_ids: Vec<String>,
}

impl CourseClass {
    pub fn new(id: impl Into<String>, class_type: CourseClassType) -> Self {
        Self { id: id.into(), class_type, ..Default::default() }
    }

    /// Shortcut for `self.class_type.policy()`.
    pub fn policy(&self) -> &'static dyn ClassPolicy {
        self.class_type.policy()
    }

    pub fn is_rogaining(&self) -> bool {
        self.class_type == CourseClassType::Rogaining
    }

    /// Class penalty, treating an explicit zero like an unset value.
    pub fn penalty_value(&self) -> i64 {
        self.penalty.unwrap_or_default()
    }
}
