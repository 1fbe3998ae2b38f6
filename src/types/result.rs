//! Competitor race records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ControlTime;

/// Lifecycle and eligibility state of a result.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
pub enum ResultStatus {
    Ok,
    /// Did not start
    Dns,
    /// Did not finish
    Dnf,
    /// Disqualified
    Dsq,
    /// Time entered by hand; punches are not re-validated
    Manual,
    #[serde(rename = "No time")]
    NoTime,
    Unknown,
    #[default]
    Registered,
    /// Any status value this crate does not recognise
    #[serde(other)]
    Other,
}

impl ResultStatus {
    /// Sort weight; lower is better.
    pub fn weight(self) -> u8 {
        match self {
            ResultStatus::Ok | ResultStatus::Unknown | ResultStatus::Registered | ResultStatus::Manual => 1,
            ResultStatus::Dsq => 2,
            ResultStatus::Dnf => 3,
            ResultStatus::NoTime => 4,
            ResultStatus::Dns => 5,
            ResultStatus::Other => 6,
        }
    }

    /// Status name used by IOF XML result lists.
    pub fn iof_status(self) -> &'static str {
        match self {
            ResultStatus::Ok => "OK",
            ResultStatus::Dsq => "Disqualified",
            ResultStatus::Dnf => "DidNotFinish",
            ResultStatus::NoTime | ResultStatus::Manual | ResultStatus::Dns => "NotCompeting",
            _ => "Inactive",
        }
    }

    /// Statuses whose elapsed time is always zero.
    pub fn is_untimed(self) -> bool {
        matches!(self, ResultStatus::Dns | ResultStatus::NoTime)
    }
}

/// One competitor's race record.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct RaceResult {
    pub id: String,
    pub name: String,
    pub club: Option<String>,
    pub chip: Option<String>,
    pub class_id: Option<String>,
    pub course_id: Option<String>,
    /// Relay team membership
    pub team_id: Option<String>,
    /// Relay leg number
    pub leg: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub register_time: Option<DateTime<Utc>>,
    pub read_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    /// Punches as read from the chip
    pub control_times: Vec<ControlTime>,
    /// Punches after matching against the course
    pub parsed_control_times: Vec<ControlTime>,
    /// Elapsed seconds including time penalties
    pub time: i64,
    pub points: Option<i64>,
    pub position: Option<u32>,
    /// Seconds behind the class leader
    pub difference: Option<i64>,
    pub status: ResultStatus,
    /// Manual penalty: time for sequential classes, points for rogaining
    pub additional_penalty: Option<i64>,
}

impl RaceResult {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// Reader punch from the raw chip data.
    pub fn reader_punch(&self) -> Option<&ControlTime> {
        self.control_times.iter().find(|punch| punch.is_reader())
    }

    /// Whether the chip holds any real control punches.
    pub fn has_punches(&self) -> bool {
        self.control_times.iter().any(|punch| !punch.is_reader())
    }

    /// Points, counting an unset value as zero.
    pub fn points_value(&self) -> i64 {
        self.points.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iof_status_mapping() {
        assert_eq!(ResultStatus::Ok.iof_status(), "OK");
        assert_eq!(ResultStatus::Dsq.iof_status(), "Disqualified");
        assert_eq!(ResultStatus::Dnf.iof_status(), "DidNotFinish");
        assert_eq!(ResultStatus::NoTime.iof_status(), "NotCompeting");
        assert_eq!(ResultStatus::Manual.iof_status(), "NotCompeting");
        assert_eq!(ResultStatus::Dns.iof_status(), "NotCompeting");
        assert_eq!(ResultStatus::Other.iof_status(), "Inactive");
        assert_eq!(ResultStatus::Registered.iof_status(), "Inactive");
    }

    #[test]
    fn unrecognised_status_deserializes_to_other() {
        let status: ResultStatus = serde_json::from_str(r#""Foo""#).unwrap();
        assert_eq!(status, ResultStatus::Other);
        let status: ResultStatus = serde_json::from_str(r#""No time""#).unwrap();
        assert_eq!(status, ResultStatus::NoTime);
    }

    #[test]
    fn status_weights_order_eligibility() {
        assert_eq!(ResultStatus::Ok.weight(), 1);
        assert_eq!(ResultStatus::Manual.weight(), 1);
        assert!(ResultStatus::Dsq.weight() < ResultStatus::Dnf.weight());
        assert!(ResultStatus::Dnf.weight() < ResultStatus::NoTime.weight());
        assert!(ResultStatus::NoTime.weight() < ResultStatus::Dns.weight());
        assert_eq!(ResultStatus::Other.weight(), 6);
    }
}
