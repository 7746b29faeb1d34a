//! Common validation rules shared across request payloads.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use validator::ValidationError;

/// Latitude must be within [-90, 90] degrees.
pub fn validate_latitude(latitude: &Decimal) -> Result<(), ValidationError> {
    if *latitude < dec!(-90) || *latitude > dec!(90) {
        return Err(ValidationError::new("latitude_out_of_range"));
    }
    Ok(())
}

/// Longitude must be within [-180, 180] degrees.
pub fn validate_longitude(longitude: &Decimal) -> Result<(), ValidationError> {
    if *longitude < dec!(-180) || *longitude > dec!(180) {
        return Err(ValidationError::new("longitude_out_of_range"));
    }
    Ok(())
}

/// A geofence radius below one meter would never match anything.
pub fn validate_radius_meters(radius: i32) -> Result<(), ValidationError> {
    if !(1..=100_000).contains(&radius) {
        return Err(ValidationError::new("radius_out_of_range"));
    }
    Ok(())
}

/// Calendar month, 1-12.
pub fn validate_month(month: u32) -> Result<(), ValidationError> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::new("month_out_of_range"));
    }
    Ok(())
}

/// Holiday rows are keyed by year for filtering; keep it plausible.
pub fn validate_holiday_year(year: i32) -> Result<(), ValidationError> {
    if !(2000..=2100).contains(&year) {
        return Err(ValidationError::new("year_out_of_range"));
    }
    Ok(())
}
