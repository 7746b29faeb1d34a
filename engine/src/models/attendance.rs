use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{AttendanceRecordId, EmployeeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        AttendanceStatus::Present
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    Office,
    Wfh,
    Holiday,
    Leave,
}

impl Default for WorkType {
    fn default() -> Self {
        WorkType::Office
    }
}

/// Overtime category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OvertimeType {
    None,
    Regular,
    Night,
    Holiday,
}

impl Default for OvertimeType {
    fn default() -> Self {
        OvertimeType::None
    }
}

/// The fixed set of work locations appearing on attendance records.
///
/// Stored as the display strings the capture surface sends; only some of
/// these have a physical geofence behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum WorkLocation {
    #[sqlx(rename = "Head Office")]
    #[serde(rename = "Head Office")]
    HeadOffice,
    #[sqlx(rename = "KEZAD")]
    #[serde(rename = "KEZAD")]
    Kezad,
    #[sqlx(rename = "Safario")]
    #[serde(rename = "Safario")]
    Safario,
    #[sqlx(rename = "Sites")]
    #[serde(rename = "Sites")]
    Sites,
    #[sqlx(rename = "Meeting")]
    #[serde(rename = "Meeting")]
    Meeting,
    #[sqlx(rename = "Event")]
    #[serde(rename = "Event")]
    Event,
    #[sqlx(rename = "Work From Home")]
    #[serde(rename = "Work From Home")]
    WorkFromHome,
}

impl WorkLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkLocation::HeadOffice => "Head Office",
            WorkLocation::Kezad => "KEZAD",
            WorkLocation::Safario => "Safario",
            WorkLocation::Sites => "Sites",
            WorkLocation::Meeting => "Meeting",
            WorkLocation::Event => "Event",
            WorkLocation::WorkFromHome => "Work From Home",
        }
    }
}

/// Daily attendance record.
///
/// The capture surface owns the row and its clock times; this engine owns
/// the classification fields (overtime category, compliance flags). Rows
/// freeze once the owning month's timesheet leaves draft.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: AttendanceRecordId,
    pub employee_id: EmployeeId,
    pub attendance_date: NaiveDate,
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    pub clock_in_latitude: Option<Decimal>,
    pub clock_in_longitude: Option<Decimal>,
    pub clock_in_address: Option<String>,
    pub clock_out_latitude: Option<Decimal>,
    pub clock_out_longitude: Option<Decimal>,
    pub clock_out_address: Option<String>,
    pub work_location: WorkLocation,
    pub work_type: WorkType,
    pub status: AttendanceStatus,
    pub total_hours: Option<Decimal>,
    pub regular_hours: Option<Decimal>,
    pub overtime_hours: Option<Decimal>,
    pub overtime_type: OvertimeType,
    pub is_night_overtime: bool,
    pub is_holiday_overtime: bool,
    pub overtime_amount: Option<Decimal>,
    pub offset_hours_earned: Option<Decimal>,
    pub food_allowance_eligible: bool,
    pub food_allowance_amount: Option<Decimal>,
    pub is_late: bool,
    pub late_minutes: Option<i32>,
    pub is_early_departure: bool,
    pub early_departure_minutes: Option<i32>,
    pub exceeds_daily_limit: bool,
    pub exceeds_overtime_limit: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn counts_as_present(&self) -> bool {
        matches!(
            self.status,
            AttendanceStatus::Present | AttendanceStatus::Late
        )
    }
}

/// Limits and calendar context needed to classify a day's hours.
#[derive(Debug, Clone)]
pub struct ClassificationLimits {
    /// Regular working hours per day; time beyond this is overtime.
    pub daily_regular_hours: Decimal,
    /// Overtime cap per day; beyond this the compliance flag is raised.
    pub daily_overtime_limit: Decimal,
    /// Local hour (0-23) from which overtime counts as night overtime.
    pub night_overtime_start_hour: u32,
    pub time_zone: Tz,
}

/// Output of the pure hours classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoursClassification {
    pub total_hours: Decimal,
    pub regular_hours: Decimal,
    pub overtime_hours: Decimal,
    pub overtime_type: OvertimeType,
    pub is_night_overtime: bool,
    pub is_holiday_overtime: bool,
    pub exceeds_daily_limit: bool,
    pub exceeds_overtime_limit: bool,
}

/// Split a worked interval into regular/overtime hours and tag the
/// overtime category. Pure; quantized to two fractional digits so repeated
/// classification is reproducible.
pub fn classify_hours(
    clock_in: DateTime<Utc>,
    clock_out: DateTime<Utc>,
    on_holiday: bool,
    limits: &ClassificationLimits,
) -> HoursClassification {
    let minutes = (clock_out - clock_in).num_minutes().max(0);
    let total_hours = (Decimal::from(minutes) / dec!(60)).round_dp(2);

    let regular_hours = total_hours.min(limits.daily_regular_hours);
    let overtime_hours = (total_hours - regular_hours).round_dp(2);

    let ends_at_night = {
        let end_local = clock_out.with_timezone(&limits.time_zone);
        // Past the night threshold, or past midnight into the early hours.
        end_local.hour() >= limits.night_overtime_start_hour || end_local.hour() < 6
    };

    let overtime_type = if overtime_hours.is_zero() {
        OvertimeType::None
    } else if on_holiday {
        OvertimeType::Holiday
    } else if ends_at_night {
        OvertimeType::Night
    } else {
        OvertimeType::Regular
    };

    HoursClassification {
        total_hours,
        regular_hours,
        overtime_hours,
        overtime_type,
        is_night_overtime: matches!(overtime_type, OvertimeType::Night),
        is_holiday_overtime: matches!(overtime_type, OvertimeType::Holiday),
        exceeds_daily_limit: total_hours
            > limits.daily_regular_hours + limits.daily_overtime_limit,
        exceeds_overtime_limit: overtime_hours > limits.daily_overtime_limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn limits() -> ClassificationLimits {
        ClassificationLimits {
            daily_regular_hours: dec!(8),
            daily_overtime_limit: dec!(2),
            night_overtime_start_hour: 22,
            time_zone: chrono_tz::Asia::Dubai,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn eight_hour_day_has_no_overtime() {
        // 09:00-17:00 Dubai time is 05:00-13:00 UTC.
        let c = classify_hours(
            utc(2026, 3, 2, 5, 0),
            utc(2026, 3, 2, 13, 0),
            false,
            &limits(),
        );
        assert_eq!(c.total_hours, dec!(8));
        assert_eq!(c.regular_hours, dec!(8));
        assert_eq!(c.overtime_hours, Decimal::ZERO);
        assert_eq!(c.overtime_type, OvertimeType::None);
        assert!(!c.exceeds_daily_limit);
        assert!(!c.exceeds_overtime_limit);
    }

    #[test]
    fn two_extra_daytime_hours_are_regular_overtime() {
        // 08:00-18:00 Dubai.
        let c = classify_hours(
            utc(2026, 3, 2, 4, 0),
            utc(2026, 3, 2, 14, 0),
            false,
            &limits(),
        );
        assert_eq!(c.overtime_hours, dec!(2));
        assert_eq!(c.overtime_type, OvertimeType::Regular);
        assert!(!c.exceeds_overtime_limit);
        assert!(!c.exceeds_daily_limit);
    }

    #[test]
    fn overtime_past_the_cap_raises_both_flags() {
        // 08:00-19:30 Dubai: 11.5h total, 3.5h overtime.
        let c = classify_hours(
            utc(2026, 3, 2, 4, 0),
            utc(2026, 3, 2, 15, 30),
            false,
            &limits(),
        );
        assert_eq!(c.overtime_hours, dec!(3.5));
        assert!(c.exceeds_overtime_limit);
        assert!(c.exceeds_daily_limit);
    }

    #[test]
    fn late_finish_tags_night_overtime() {
        // 13:00-23:00 Dubai.
        let c = classify_hours(
            utc(2026, 3, 2, 9, 0),
            utc(2026, 3, 2, 19, 0),
            false,
            &limits(),
        );
        assert_eq!(c.overtime_type, OvertimeType::Night);
        assert!(c.is_night_overtime);
        assert!(!c.is_holiday_overtime);
    }

    #[test]
    fn holiday_work_beats_the_night_tag() {
        let c = classify_hours(
            utc(2026, 12, 2, 9, 0),
            utc(2026, 12, 2, 19, 0),
            true,
            &limits(),
        );
        assert_eq!(c.overtime_type, OvertimeType::Holiday);
        assert!(c.is_holiday_overtime);
        assert!(!c.is_night_overtime);
    }

    #[test]
    fn inverted_interval_classifies_as_zero_hours() {
        let c = classify_hours(
            utc(2026, 3, 2, 14, 0),
            utc(2026, 3, 2, 4, 0),
            false,
            &limits(),
        );
        assert_eq!(c.total_hours, Decimal::ZERO);
        assert_eq!(c.overtime_type, OvertimeType::None);
    }

    #[test]
    fn work_location_serde_uses_display_names() {
        let loc: WorkLocation = serde_json::from_str("\"Work From Home\"").unwrap();
        assert!(matches!(loc, WorkLocation::WorkFromHome));
        let v = serde_json::to_value(WorkLocation::HeadOffice).unwrap();
        assert_eq!(v, serde_json::json!("Head Office"));
    }

    #[test]
    fn overtime_type_serde_snake_case() {
        let ot: OvertimeType = serde_json::from_str("\"night\"").unwrap();
        assert!(matches!(ot, OvertimeType::Night));
        let v = serde_json::to_value(OvertimeType::None).unwrap();
        assert_eq!(v, serde_json::json!("none"));
    }
}
