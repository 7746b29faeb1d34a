//! Holiday calendar.
//!
//! Read-only interval store over the `public_holidays` rows, plus the HR
//! maintenance operations (create, logical delete, yearly seeding). Serves
//! two consumers: the leave validator's working-days utility and the
//! timesheet aggregator's holiday-overtime tagging.

use chrono::NaiveDate;
use validator::Validate;

use crate::db::DbPool;
use crate::error::EngineError;
use crate::models::holiday::{
    default_uae_holidays, holiday_days_within, CreateHolidayPayload, PublicHoliday,
};
use crate::repositories::{HolidayRepository, HolidayRepositoryTrait};
use crate::types::{EmployeeId, HolidayId};

pub struct HolidayService<H = HolidayRepository> {
    db: DbPool,
    holidays: H,
}

impl HolidayService {
    pub fn new(db: DbPool) -> Self {
        Self::with_parts(db, HolidayRepository::new())
    }
}

impl<H> HolidayService<H>
where
    H: HolidayRepositoryTrait,
{
    pub fn with_parts(db: DbPool, holidays: H) -> Self {
        Self { db, holidays }
    }

    /// Active holidays intersecting [start, end], ordered by start date.
    pub async fn holidays_in_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PublicHoliday>, EngineError> {
        if end_date < start_date {
            return Err(EngineError::InvalidDateRange);
        }
        self.holidays.find_in_range(&self.db, start_date, end_date).await
    }

    /// The active holiday covering a date, if any.
    pub async fn is_holiday(
        &self,
        date: NaiveDate,
    ) -> Result<Option<PublicHoliday>, EngineError> {
        self.holidays.find_on(&self.db, date).await
    }

    /// Holiday day-count inside [start, end]; multi-day holidays
    /// contribute only their intersected days.
    pub async fn holiday_days_in_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<i64, EngineError> {
        let holidays = self.holidays_in_range(start_date, end_date).await?;
        Ok(holiday_days_within(&holidays, start_date, end_date))
    }

    /// Active holidays of a year.
    pub async fn holidays_for_year(
        &self,
        year: i32,
    ) -> Result<Vec<PublicHoliday>, EngineError> {
        self.holidays.list_for_year(&self.db, year).await
    }

    /// HR entry of a holiday row.
    pub async fn create_holiday(
        &self,
        payload: CreateHolidayPayload,
        created_by: Option<EmployeeId>,
    ) -> Result<PublicHoliday, EngineError> {
        payload.validate()?;
        if payload.end_date < payload.start_date {
            return Err(EngineError::InvalidDateRange);
        }
        let holiday = PublicHoliday::new(payload, created_by);
        self.holidays.insert(&self.db, &holiday).await
    }

    /// Logical delete.
    pub async fn deactivate_holiday(&self, id: HolidayId) -> Result<(), EngineError> {
        let touched = self.holidays.deactivate(&self.db, id).await?;
        if touched == 0 {
            return Err(EngineError::NotFound("public holiday".into()));
        }
        Ok(())
    }

    /// Seed the fixed-date UAE official holidays for a year. Returns the
    /// created rows; moon-sighting holidays are entered by HR separately.
    pub async fn seed_uae_defaults(
        &self,
        year: i32,
        created_by: Option<EmployeeId>,
    ) -> Result<Vec<PublicHoliday>, EngineError> {
        let mut created = Vec::new();
        for payload in default_uae_holidays(year) {
            created.push(self.create_holiday(payload, created_by).await?);
        }
        Ok(created)
    }
}
