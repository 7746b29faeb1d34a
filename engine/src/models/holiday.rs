use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::types::{EmployeeId, HolidayId};
use crate::validation::rules::validate_holiday_year;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HolidayType {
    UaeOfficial,
    Company,
    Optional,
}

impl HolidayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayType::UaeOfficial => "uae_official",
            HolidayType::Company => "company",
            HolidayType::Optional => "optional",
        }
    }
}

/// Public holiday covering an inclusive date range.
///
/// Multi-day holidays (Eid, National Day) are stored as a single row
/// spanning `start_date..=end_date`. Rows are logically deleted via
/// `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicHoliday {
    pub id: HolidayId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub year: i32,
    pub holiday_type: HolidayType,
    pub is_paid: bool,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateHolidayPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub holiday_type: HolidayType,
    #[serde(default = "default_is_paid")]
    pub is_paid: bool,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(custom(function = "validate_holiday_year"))]
    pub year: i32,
}

fn default_is_paid() -> bool {
    true
}

impl PublicHoliday {
    pub fn new(payload: CreateHolidayPayload, created_by: Option<EmployeeId>) -> Self {
        let now = Utc::now();
        Self {
            id: HolidayId::new(),
            name: payload.name,
            start_date: payload.start_date,
            end_date: payload.end_date,
            year: payload.year,
            holiday_type: payload.holiday_type,
            is_paid: payload.is_paid,
            description: payload.description,
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inclusive containment check.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of holiday days falling inside [start, end], clamped to the
    /// intersection. Zero when the ranges do not intersect.
    pub fn days_within(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let overlap_start = self.start_date.max(start);
        let overlap_end = self.end_date.min(end);
        if overlap_start > overlap_end {
            return 0;
        }
        (overlap_end - overlap_start).num_days() + 1
    }
}

/// Sum of holiday days intersecting [start, end] across a holiday list.
pub fn holiday_days_within(holidays: &[PublicHoliday], start: NaiveDate, end: NaiveDate) -> i64 {
    holidays.iter().map(|h| h.days_within(start, end)).sum()
}

/// Seed rows for the fixed-date UAE official holidays of a year.
/// Moon-sighting holidays (both Eids, Hijri new year, the Prophet's
/// birthday) have no fixed Gregorian date and are entered by HR when
/// announced.
pub fn default_uae_holidays(year: i32) -> Vec<CreateHolidayPayload> {
    let fixed = [
        ("New Year's Day", (1, 1), (1, 1)),
        ("Commemoration Day", (11, 30), (11, 30)),
        ("UAE National Day", (12, 2), (12, 3)),
    ];

    fixed
        .iter()
        .filter_map(|(name, (sm, sd), (em, ed))| {
            let start_date = NaiveDate::from_ymd_opt(year, *sm, *sd)?;
            let end_date = NaiveDate::from_ymd_opt(year, *em, *ed)?;
            debug_assert_eq!(start_date.year(), year);
            Some(CreateHolidayPayload {
                name: (*name).to_string(),
                start_date,
                end_date,
                holiday_type: HolidayType::UaeOfficial,
                is_paid: true,
                description: None,
                year,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn national_day() -> PublicHoliday {
        PublicHoliday::new(
            CreateHolidayPayload {
                name: "UAE National Day".into(),
                start_date: date(2026, 12, 2),
                end_date: date(2026, 12, 3),
                holiday_type: HolidayType::UaeOfficial,
                is_paid: true,
                description: None,
                year: 2026,
            },
            None,
        )
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let holiday = national_day();
        assert!(holiday.contains(date(2026, 12, 2)));
        assert!(holiday.contains(date(2026, 12, 3)));
        assert!(!holiday.contains(date(2026, 12, 4)));
    }

    #[test]
    fn fully_contained_span_counts_every_day() {
        let holiday = national_day();
        assert_eq!(holiday.days_within(date(2026, 12, 1), date(2026, 12, 31)), 2);
    }

    #[test]
    fn partial_overlap_counts_only_intersected_days() {
        let holiday = national_day();
        assert_eq!(holiday.days_within(date(2026, 11, 25), date(2026, 12, 2)), 1);
        assert_eq!(holiday.days_within(date(2026, 12, 3), date(2026, 12, 10)), 1);
        assert_eq!(holiday.days_within(date(2026, 12, 5), date(2026, 12, 10)), 0);
    }

    #[test]
    fn day_sum_spans_multiple_holidays() {
        let new_year = PublicHoliday::new(
            CreateHolidayPayload {
                name: "New Year's Day".into(),
                start_date: date(2026, 1, 1),
                end_date: date(2026, 1, 1),
                holiday_type: HolidayType::UaeOfficial,
                is_paid: true,
                description: None,
                year: 2026,
            },
            None,
        );
        let holidays = vec![new_year, national_day()];
        assert_eq!(
            holiday_days_within(&holidays, date(2026, 1, 1), date(2026, 12, 31)),
            3
        );
    }

    #[test]
    fn default_uae_holidays_cover_the_fixed_dates() {
        let holidays = default_uae_holidays(2026);
        assert_eq!(holidays.len(), 3);
        let national = holidays
            .iter()
            .find(|h| h.name == "UAE National Day")
            .unwrap();
        assert_eq!(national.start_date, date(2026, 12, 2));
        assert_eq!(national.end_date, date(2026, 12, 3));
        assert!(national.is_paid);
    }
}
