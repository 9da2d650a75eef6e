//! Time schedules for luminosity classifications
//!
//! Each classification carries a set of `HH:MM` ranges during which it is
//! considered active. A range whose start is later than its end wraps past
//! midnight. No validation is enforced on edit; `coverage_gaps` is a
//! read-only advisory check.

use super::Classification;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
    }
}

/// One time-of-day range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeRange {
    /// Parse from "HH:MM" strings, for CLI input
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
        Some(Self { start, end })
    }

    /// Midnight-wrapping containment: `start > end` denotes a range that
    /// crosses midnight, e.g. 20:00-06:00 matches 23:30 and 01:00.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t <= self.end
        } else {
            t >= self.start || t <= self.end
        }
    }
}

/// Schedule for one classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSchedule {
    pub enabled: bool,
    #[serde(default)]
    pub time_ranges: Vec<TimeRange>,
}

/// All schedules, keyed by classification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleSet {
    pub schedules: HashMap<Classification, TimeSchedule>,
}

impl Default for ScheduleSet {
    fn default() -> Self {
        let range = |s, e| TimeRange::parse(s, e).expect("valid default range");
        let mut schedules = HashMap::new();
        schedules.insert(
            Classification::Dark,
            TimeSchedule {
                enabled: true,
                time_ranges: vec![range("20:00", "06:00")],
            },
        );
        schedules.insert(
            Classification::Medium,
            TimeSchedule {
                enabled: true,
                time_ranges: vec![range("06:00", "09:00"), range("17:00", "20:00")],
            },
        );
        schedules.insert(
            Classification::Light,
            TimeSchedule {
                enabled: true,
                time_ranges: vec![range("09:00", "17:00")],
            },
        );
        Self { schedules }
    }
}

impl ScheduleSet {
    pub fn get(&self, classification: Classification) -> Option<&TimeSchedule> {
        self.schedules.get(&classification)
    }

    /// Enable or disable a classification's schedule. Returns false if the
    /// classification has no schedule entry.
    pub fn set_enabled(&mut self, classification: Classification, enabled: bool) -> bool {
        match self.schedules.get_mut(&classification) {
            Some(schedule) => {
                schedule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Replace a classification's time ranges, creating the entry if missing
    pub fn set_time_ranges(&mut self, classification: Classification, ranges: Vec<TimeRange>) {
        self.schedules
            .entry(classification)
            .or_insert_with(|| TimeSchedule {
                enabled: true,
                time_ranges: Vec::new(),
            })
            .time_ranges = ranges;
    }

    /// Classifications active at `t`: every enabled schedule where any range
    /// contains `t`. An empty result means "no restriction"; callers must
    /// not interpret it as "block everything".
    pub fn active_classifications(&self, t: NaiveTime) -> BTreeSet<Classification> {
        self.schedules
            .iter()
            .filter(|(_, schedule)| schedule.enabled)
            .filter(|(_, schedule)| schedule.time_ranges.iter().any(|r| r.contains(t)))
            .map(|(classification, _)| *classification)
            .collect()
    }

    /// Advisory check: minutes of the day not covered by any enabled
    /// schedule, reported as contiguous (start, end) ranges. Mutates nothing.
    pub fn coverage_gaps(&self) -> Vec<(NaiveTime, NaiveTime)> {
        let mut covered = [false; 24 * 60];
        for schedule in self.schedules.values().filter(|s| s.enabled) {
            for (minute, slot) in covered.iter_mut().enumerate() {
                if *slot {
                    continue;
                }
                let t = NaiveTime::from_hms_opt(minute as u32 / 60, minute as u32 % 60, 0)
                    .expect("minute of day in range");
                if schedule.time_ranges.iter().any(|r| r.contains(t)) {
                    *slot = true;
                }
            }
        }

        let minute_time = |minute: usize| {
            NaiveTime::from_hms_opt(minute as u32 / 60, minute as u32 % 60, 0)
                .expect("minute of day in range")
        };

        let mut gaps = Vec::new();
        let mut gap_start: Option<usize> = None;
        for (minute, slot) in covered.iter().enumerate() {
            match (slot, gap_start) {
                (false, None) => gap_start = Some(minute),
                (true, Some(start)) => {
                    gaps.push((minute_time(start), minute_time(minute - 1)));
                    gap_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = gap_start {
            gaps.push((minute_time(start), minute_time(24 * 60 - 1)));
        }
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_range_contains_simple() {
        let range = TimeRange::parse("09:00", "17:00").unwrap();
        assert!(range.contains(at(9, 0)));
        assert!(range.contains(at(12, 30)));
        assert!(range.contains(at(17, 0)));
        assert!(!range.contains(at(8, 59)));
        assert!(!range.contains(at(17, 1)));
    }

    #[test]
    fn test_range_contains_midnight_wrap() {
        let range = TimeRange::parse("20:00", "06:00").unwrap();
        assert!(range.contains(at(23, 30)));
        assert!(range.contains(at(1, 0)));
        assert!(range.contains(at(20, 0)));
        assert!(range.contains(at(6, 0)));
        assert!(!range.contains(at(12, 0)));
    }

    #[test]
    fn test_active_classifications_defaults() {
        let set = ScheduleSet::default();

        let night = set.active_classifications(at(23, 0));
        assert!(night.contains(&Classification::Dark));
        assert!(!night.contains(&Classification::Light));

        let noon = set.active_classifications(at(12, 0));
        assert!(noon.contains(&Classification::Light));
        assert!(!noon.contains(&Classification::Dark));

        // 06:00-09:00 belongs to both the dark wrap end and the medium morning range
        let morning = set.active_classifications(at(6, 0));
        assert!(morning.contains(&Classification::Dark));
        assert!(morning.contains(&Classification::Medium));
    }

    #[test]
    fn test_all_disabled_means_empty_set() {
        let mut set = ScheduleSet::default();
        for classification in Classification::ALL {
            set.set_enabled(classification, false);
        }
        assert!(set.active_classifications(at(12, 0)).is_empty());
    }

    #[test]
    fn test_default_schedules_cover_full_day() {
        assert!(ScheduleSet::default().coverage_gaps().is_empty());
    }

    #[test]
    fn test_coverage_gaps_reports_uncovered_range() {
        let mut set = ScheduleSet::default();
        // Leave only light 09:00-17:00 enabled
        set.set_enabled(Classification::Dark, false);
        set.set_enabled(Classification::Medium, false);

        let gaps = set.coverage_gaps();
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0], (at(0, 0), at(8, 59)));
        assert_eq!(gaps[1], (at(17, 1), at(23, 59)));
    }

    #[test]
    fn test_hhmm_round_trip() {
        let set = ScheduleSet::default();
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("\"20:00\""));
        let back: ScheduleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.get(Classification::Dark).unwrap().time_ranges,
            set.get(Classification::Dark).unwrap().time_ranges
        );
    }
}
