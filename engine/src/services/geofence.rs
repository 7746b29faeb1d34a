//! Geofence validation at attendance-capture time.
//!
//! The scan itself is pure ([`resolve_location`]); the service wraps it
//! with zone storage. With no active zones configured the feature is
//! effectively disabled and every point validates.

use validator::Validate;

use crate::db::DbPool;
use crate::error::EngineError;
use crate::models::geofence::{
    is_within_geofence, CreateGeofencePayload, Geofence, LocationCheck,
};
use crate::repositories::{GeofenceRepository, GeofenceRepositoryTrait};
use crate::types::GeofenceId;

/// Scan zones (in definition order) for a GPS point.
///
/// With a target zone name: valid when inside the radius, or when the zone
/// does not require validation. Without one: the first containing zone
/// matches; otherwise the nearest zone is reported and the point is
/// invalid.
pub fn resolve_location(
    zones: &[Geofence],
    latitude: f64,
    longitude: f64,
    target_zone: Option<&str>,
) -> LocationCheck {
    if zones.is_empty() {
        return LocationCheck::disabled();
    }

    if let Some(name) = target_zone {
        if let Some(zone) = zones.iter().find(|z| z.name == name) {
            let (center_lat, center_lon) = zone.center();
            let (within, distance) = is_within_geofence(
                latitude,
                longitude,
                center_lat,
                center_lon,
                zone.radius_meters as f64,
            );
            return LocationCheck {
                is_valid: within || !zone.validation_required,
                matched_zone: within.then(|| zone.name.clone()),
                nearest_zone: Some(zone.name.clone()),
                distance_meters: Some(distance),
                within_radius: within,
                validation_required: zone.validation_required,
                message: if within {
                    format!("Within {}", zone.name)
                } else {
                    format!("{:.0}m from {}", distance, zone.name)
                },
            };
        }
        // Unknown target names fall through to the open scan: "Work From
        // Home" and friends have no zone on file.
    }

    let mut nearest: Option<(&Geofence, f64)> = None;
    for zone in zones {
        let (center_lat, center_lon) = zone.center();
        let (within, distance) = is_within_geofence(
            latitude,
            longitude,
            center_lat,
            center_lon,
            zone.radius_meters as f64,
        );
        if within {
            return LocationCheck {
                is_valid: true,
                matched_zone: Some(zone.name.clone()),
                nearest_zone: Some(zone.name.clone()),
                distance_meters: Some(distance),
                within_radius: true,
                validation_required: zone.validation_required,
                message: format!("Location detected: {}", zone.name),
            };
        }
        if nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((zone, distance));
        }
    }

    let (zone, distance) = nearest.expect("zones is non-empty");
    LocationCheck {
        is_valid: false,
        matched_zone: None,
        nearest_zone: Some(zone.name.clone()),
        distance_meters: Some(distance),
        within_radius: false,
        validation_required: zone.validation_required,
        message: format!("Outside all geofences. Nearest: {} ({:.0}m)", zone.name, distance),
    }
}

pub struct GeofenceService<G = GeofenceRepository> {
    db: DbPool,
    geofences: G,
}

impl GeofenceService {
    pub fn new(db: DbPool) -> Self {
        Self::with_parts(db, GeofenceRepository::new())
    }
}

impl<G> GeofenceService<G>
where
    G: GeofenceRepositoryTrait,
{
    pub fn with_parts(db: DbPool, geofences: G) -> Self {
        Self { db, geofences }
    }

    /// Validate a GPS point, optionally against a named zone.
    pub async fn validate_location(
        &self,
        latitude: f64,
        longitude: f64,
        target_zone: Option<&str>,
    ) -> Result<LocationCheck, EngineError> {
        let zones = self.geofences.list_active(&self.db).await?;
        Ok(resolve_location(&zones, latitude, longitude, target_zone))
    }

    /// Create a zone; names are unique.
    pub async fn create_zone(
        &self,
        payload: CreateGeofencePayload,
    ) -> Result<Geofence, EngineError> {
        payload.validate()?;
        let zone = Geofence::new(payload);
        self.geofences.insert(&self.db, &zone).await
    }

    /// Logically delete a zone.
    pub async fn deactivate_zone(&self, id: GeofenceId) -> Result<(), EngineError> {
        let touched = self.geofences.deactivate(&self.db, id).await?;
        if touched == 0 {
            return Err(EngineError::NotFound("geofence".into()));
        }
        Ok(())
    }

    /// All active zones, in definition order.
    pub async fn zones(&self) -> Result<Vec<Geofence>, EngineError> {
        self.geofences.list_active(&self.db).await
    }
}
