use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::types::GeofenceId;
use crate::validation::rules::{validate_latitude, validate_longitude, validate_radius_meters};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Circular GPS zone used to validate clock-in/out locations.
///
/// Referenced by name from attendance capture rather than by foreign key:
/// not every work location has a physical zone (e.g. "Work From Home").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Geofence {
    pub id: GeofenceId,
    pub name: String,
    pub description: Option<String>,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub radius_meters: i32,
    pub address: Option<String>,
    pub is_active: bool,
    /// When false, a point outside the radius is still accepted.
    pub validation_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGeofencePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(custom(function = "validate_latitude"))]
    pub latitude: Decimal,
    #[validate(custom(function = "validate_longitude"))]
    pub longitude: Decimal,
    #[validate(custom(function = "validate_radius_meters"))]
    #[serde(default = "default_radius_meters")]
    pub radius_meters: i32,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub validation_required: bool,
}

fn default_radius_meters() -> i32 {
    100
}

impl Geofence {
    pub fn new(payload: CreateGeofencePayload) -> Self {
        let now = Utc::now();
        Self {
            id: GeofenceId::new(),
            name: payload.name,
            description: payload.description,
            latitude: payload.latitude,
            longitude: payload.longitude,
            radius_meters: payload.radius_meters,
            address: payload.address,
            is_active: true,
            validation_required: payload.validation_required,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.latitude.to_f64().unwrap_or_default(),
            self.longitude.to_f64().unwrap_or_default(),
        )
    }
}

/// Great-circle distance between two GPS points, in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Containment check: a point exactly on the radius is inside.
pub fn is_within_geofence(
    user_lat: f64,
    user_lon: f64,
    fence_lat: f64,
    fence_lon: f64,
    radius_meters: f64,
) -> (bool, f64) {
    let distance = haversine_distance(user_lat, user_lon, fence_lat, fence_lon);
    (distance <= radius_meters, distance)
}

/// Result of validating a GPS point against the configured zones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationCheck {
    pub is_valid: bool,
    pub matched_zone: Option<String>,
    pub nearest_zone: Option<String>,
    pub distance_meters: Option<f64>,
    pub within_radius: bool,
    pub validation_required: bool,
    pub message: String,
}

impl LocationCheck {
    /// Zero active zones: validation is effectively disabled.
    pub fn disabled() -> Self {
        Self {
            is_valid: true,
            matched_zone: None,
            nearest_zone: None,
            distance_meters: None,
            within_radius: false,
            validation_required: false,
            message: "No geofences configured".to_string(),
        }
    }
}
