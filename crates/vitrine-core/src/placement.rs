//! Placement types and their scheduling parameters.
//!
//! Each placement type carries its own slot count, cooldown window, active
//! duration, and soft rotation interval. Keeping them on the enum gives the
//! eligibility filter and the rotation scheduler a single source for these
//! numbers.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A category of promotional slot: daily, weekly, or monthly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementType {
    Daily,
    Weekly,
    Monthly,
}

impl PlacementType {
    /// All placement types, in rotation order.
    pub const ALL: [PlacementType; 3] = [
        PlacementType::Daily,
        PlacementType::Weekly,
        PlacementType::Monthly,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PlacementType::Daily => "daily",
            PlacementType::Weekly => "weekly",
            PlacementType::Monthly => "monthly",
        }
    }

    /// Number of concurrently active slots for this placement type.
    #[must_use]
    pub const fn slot_count(self) -> usize {
        match self {
            PlacementType::Daily => 3,
            PlacementType::Weekly => 5,
            PlacementType::Monthly => 1,
        }
    }

    /// Minimum elapsed time since a business's last feature of this type
    /// before it can be selected again.
    #[must_use]
    pub fn cooldown(self) -> Duration {
        match self {
            PlacementType::Daily => Duration::days(1),
            PlacementType::Weekly => Duration::days(7),
            PlacementType::Monthly => Duration::days(30),
        }
    }

    /// Soft interval after which a placement type is due for rotation.
    ///
    /// Deliberately shorter than the placement duration (20h, not 24h, for
    /// daily) so clock drift or scheduler jitter cannot push a rotation into
    /// the next tick.
    #[must_use]
    pub fn due_interval(self) -> Duration {
        match self {
            PlacementType::Daily => Duration::hours(20),
            PlacementType::Weekly => Duration::hours(156),
            PlacementType::Monthly => Duration::days(25),
        }
    }

    /// End timestamp for a placement of this type starting at `start`.
    ///
    /// Monthly placements run one calendar month; the overflow fallback
    /// (year ~262,000) keeps this free of panic paths.
    #[must_use]
    pub fn placement_end(self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            PlacementType::Daily => start + Duration::days(1),
            PlacementType::Weekly => start + Duration::days(7),
            PlacementType::Monthly => start
                .checked_add_months(Months::new(1))
                .unwrap_or(start + Duration::days(30)),
        }
    }
}

impl std::fmt::Display for PlacementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlacementType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(PlacementType::Daily),
            "weekly" => Ok(PlacementType::Weekly),
            "monthly" => Ok(PlacementType::Monthly),
            other => Err(CoreError::InvalidPlacementType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn slot_counts_match_placement_limits() {
        assert_eq!(PlacementType::Daily.slot_count(), 3);
        assert_eq!(PlacementType::Weekly.slot_count(), 5);
        assert_eq!(PlacementType::Monthly.slot_count(), 1);
    }

    #[test]
    fn cooldowns_are_one_seven_thirty_days() {
        assert_eq!(PlacementType::Daily.cooldown(), Duration::days(1));
        assert_eq!(PlacementType::Weekly.cooldown(), Duration::days(7));
        assert_eq!(PlacementType::Monthly.cooldown(), Duration::days(30));
    }

    #[test]
    fn due_intervals_have_slack() {
        assert!(PlacementType::Daily.due_interval() < Duration::days(1));
        assert!(PlacementType::Weekly.due_interval() < Duration::days(7));
        assert!(PlacementType::Monthly.due_interval() < Duration::days(30));
    }

    #[test]
    fn string_round_trip() {
        for placement in PlacementType::ALL {
            let parsed: PlacementType = placement.as_str().parse().unwrap();
            assert_eq!(parsed, placement);
        }
    }

    #[test]
    fn unknown_placement_string_is_rejected() {
        assert!("hourly".parse::<PlacementType>().is_err());
    }

    #[test]
    fn monthly_end_is_one_calendar_month() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let end = PlacementType::Monthly.placement_end(start);
        // Clamped to the last day of February.
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap());
    }

    #[test]
    fn daily_end_is_next_day() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let end = PlacementType::Daily.placement_end(start);
        assert_eq!(end - start, Duration::days(1));
    }
}
