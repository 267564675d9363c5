use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::accounts::users::UserId;
use crate::catalog::PropertyId;
use crate::error::ServiceError;
use crate::store::record_id;

record_id!(VisitId);

/// Wall-clock slot such as `10:30 AM`. Parsing accepts `9:00am`, `09:00 AM`, ...;
/// display is always zero-padded with an upper-case meridiem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let invalid = || ServiceError::validation("Time must be in HH:MM AM/PM format");

        let trimmed = raw.trim();
        if trimmed.len() < 6 || !trimmed.is_char_boundary(trimmed.len() - 2) {
            return Err(invalid());
        }
        let (clock, meridiem) = trimmed.split_at(trimmed.len() - 2);
        let meridiem = meridiem.to_ascii_uppercase();
        if meridiem != "AM" && meridiem != "PM" {
            return Err(invalid());
        }
        // At most one space, between the minutes and the meridiem.
        let clock = clock
            .strip_suffix(|c: char| c.is_whitespace())
            .unwrap_or(clock);

        let (hour, minute) = clock.split_once(':').ok_or_else(invalid)?;
        let well_formed = (1..=2).contains(&hour.len())
            && minute.len() == 2
            && hour.chars().chain(minute.chars()).all(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(invalid());
        }

        let normalized = format!("{hour:0>2}:{minute} {meridiem}");
        NaiveTime::parse_from_str(&normalized, "%I:%M %p")
            .map(Self)
            .map_err(|_| invalid())
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%I:%M %p"))
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeSlot::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Bookable slots offered to visitors: every half hour from 09:00 AM to 10:00 PM.
pub fn master_time_slots() -> Vec<TimeSlot> {
    (9..=22)
        .flat_map(|hour| [0, 30].map(|minute| (hour, minute)))
        .filter(|&(hour, minute)| hour < 22 || minute == 0)
        .filter_map(|(hour, minute)| TimeSlot::from_hm(hour, minute))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl VisitStatus {
    /// Statuses that hold their slot.
    pub const ACTIVE: [VisitStatus; 3] = [Self::Scheduled, Self::Confirmed, Self::Rescheduled];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

/// Which kind of account performed a cancel or reschedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VisitActor {
    User(String),
    Builder(String),
    Admin(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub id: VisitId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub status: VisitStatus,
    pub notes: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<VisitActor>,
    pub cancellation_reason: Option<String>,
    pub rescheduled_at: Option<DateTime<Utc>>,
    pub rescheduled_by: Option<VisitActor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visit {
    /// Whether this visit sits on the given slot.
    pub fn same_slot(&self, property: &PropertyId, date: NaiveDate, time: TimeSlot) -> bool {
        &self.property_id == property && self.date == date && self.time == time
    }

    /// Sort key: date, then time of day.
    pub fn starts_at(&self) -> (NaiveDate, u32) {
        (self.date, self.time.time().num_seconds_from_midnight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_spellings_normalize_to_one_slot() {
        let canonical = TimeSlot::parse("09:00 AM").expect("canonical");
        for raw in ["9:00 AM", "9:00am", "09:00AM", " 9:00 am "] {
            assert_eq!(TimeSlot::parse(raw).expect(raw), canonical, "{raw}");
        }
        assert_eq!(canonical.to_string(), "09:00 AM");
        assert_eq!(TimeSlot::parse("12:30 pm").expect("noon").to_string(), "12:30 PM");
    }

    #[test]
    fn malformed_times_are_rejected() {
        for raw in ["13:00 PM", "00:30 AM", "9:5 AM", "09:60 AM", "0900 AM", "09:00", "nine AM", ""] {
            assert!(TimeSlot::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn only_one_space_before_the_meridiem_is_allowed() {
        assert!(TimeSlot::parse("10:00\tAM").is_ok());
        for raw in ["1 0:0 0 A M", "10:00  AM", "10 :00 AM", "10: 00 AM", "10:00 A M"] {
            assert!(TimeSlot::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn master_slots_cover_the_visiting_day() {
        let slots = master_time_slots();
        assert_eq!(slots.len(), 27);
        assert_eq!(slots.first().map(ToString::to_string).as_deref(), Some("09:00 AM"));
        assert_eq!(slots.last().map(ToString::to_string).as_deref(), Some("10:00 PM"));
    }

    #[test]
    fn only_open_statuses_hold_a_slot() {
        assert!(VisitStatus::Rescheduled.is_active());
        assert!(!VisitStatus::Cancelled.is_active());
        assert!(!VisitStatus::Completed.is_active());
    }
}
