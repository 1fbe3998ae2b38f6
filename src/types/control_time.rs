//! Punch records and their matched annotations

use serde::{Deserialize, Serialize};

use super::control::READER_CODE;

/// Raw time of a punch that an operator confirmed by hand without a timestamp.
pub const CHECKED_TIME: i64 = -1;

/// Administrative state of a punch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
pub enum ControlTimeStatus {
    /// Confirmed by an operator; the timestamp is not reliable
    Checked,
}

/// Interval from the previous timed control.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct Split {
    /// Split time in seconds
    pub time: i64,
    /// Rank of this split among the class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Gap to the fastest split in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<i64>,
}

impl Split {
    pub fn new(time: i64) -> Self {
        Self { time, position: None, difference: None }
    }
}

/// One punch event, or a course control once matched.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ControlTime {
    /// Punched code
    pub code: u32,
    /// Raw device seconds since start, or [`CHECKED_TIME`]
    pub time: i64,
    /// Time after offset and skip adjustment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_time: Option<i64>,
    /// 1-based course index once matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ControlTimeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<Split>,
    /// Rank of the elapsed time at this control
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Gap to the fastest elapsed time at this control
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<i64>,
}

impl ControlTime {
    /// Create an unmatched punch.
    pub fn new(code: u32, time: i64) -> Self {
        Self { code, time, ..Default::default() }
    }

    /// Create a punch confirmed by an operator.
    pub fn checked(code: u32) -> Self {
        Self { code, time: CHECKED_TIME, status: Some(ControlTimeStatus::Checked), ..Default::default() }
    }

    /// Whether this punch carries no reliable timestamp.
    pub fn is_checked(&self) -> bool {
        self.time == CHECKED_TIME || self.status == Some(ControlTimeStatus::Checked)
    }

    /// Whether this is the finish reader punch.
    pub fn is_reader(&self) -> bool {
        self.code == READER_CODE
    }

    /// Offset-adjusted time, falling back to the raw time of unmatched punches.
    pub fn effective_time(&self) -> i64 {
        self.offset_time.unwrap_or(self.time)
    }

    /// Split time, or zero when the punch has not been matched.
    pub fn split_time(&self) -> i64 {
        self.split.as_ref().map(|split| split.time).unwrap_or_default()
    }

    /// Drop everything the matcher and ranking engine derived.
    pub(crate) fn clear_annotations(&mut self) {
        self.offset_time = None;
        self.number = None;
        self.split = None;
        self.position = None;
        self.difference = None;
    }
}
