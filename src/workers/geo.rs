//! Geolocation worker and geohash encoding.

use crate::error::{WorkerError, WorkerResult};
use crate::permissions::types::AuthorizationStatus;
use crate::platform::SharedLocation;
use crate::platform::types::{Position, PositionEvent};

const ORIGIN: &str = "geo-worker";

/// Cell precision used for every fix produced by the workers here.
pub const GEOHASH_PRECISION: usize = 6;

const BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Standard base-32 geohash of a coordinate pair.
pub fn encode_geohash(latitude: f64, longitude: f64, precision: usize) -> String {
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut bits = 0u8;
    let mut bit_count = 0;
    let mut even_bit = true;

    while hash.len() < precision {
        let (value, range) = if even_bit {
            (longitude, &mut lon_range)
        } else {
            (latitude, &mut lat_range)
        };
        let mid = (range.0 + range.1) / 2.0;
        bits <<= 1;
        if value >= mid {
            bits |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even_bit = !even_bit;
        bit_count += 1;
        if bit_count == 5 {
            hash.push(BASE32[bits as usize] as char);
            bits = 0;
            bit_count = 0;
        }
    }
    hash
}

/// One resolved location: the position and its geohash cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFix {
    pub geohash: String,
    pub position: Position,
}

impl GeoFix {
    pub fn from_position(position: Position) -> Self {
        Self {
            geohash: encode_geohash(position.latitude, position.longitude, GEOHASH_PRECISION),
            position,
        }
    }
}

/// Resolves the device position through a location adapter.
pub struct GeoWorker {
    location: SharedLocation,
}

impl GeoWorker {
    pub fn new(location: SharedLocation) -> Self {
        Self { location }
    }

    /// One-shot fix: authorize, take the first position update, stop.
    pub async fn locate(&self) -> WorkerResult<GeoFix> {
        if self.location.request_authorization() == AuthorizationStatus::Denied {
            return Err(WorkerError::denied(ORIGIN));
        }
        let mut updates = self.location.start_updates();
        let event = updates.recv().await;
        self.location.stop_updates();
        match event {
            Some(PositionEvent::Position(position)) => {
                let fix = GeoFix::from_position(position);
                tracing::debug!(geohash = %fix.geohash, "position fix acquired");
                Ok(fix)
            }
            Some(PositionEvent::Failed(message)) => Err(WorkerError::platform(ORIGIN, message)),
            None => Err(WorkerError::platform(
                ORIGIN,
                "position updates ended without a fix",
            )),
        }
    }

    /// Resolve a street address to a fix without touching the positioning
    /// hardware.
    pub async fn locate_address(&self, address: &str) -> WorkerResult<GeoFix> {
        if address.is_empty() {
            return Err(WorkerError::invalid_parameters(&["address"], ORIGIN));
        }
        let position = self.location.reverse_geocode(address).await?;
        Ok(GeoFix::from_position(position))
    }
}

/// Constant-fix worker for tests and simulators.
pub struct FixedGeoWorker;

impl FixedGeoWorker {
    pub const LATITUDE: f64 = 33.0132075;
    pub const LONGITUDE: f64 = -96.9763461;

    pub async fn locate(&self) -> WorkerResult<GeoFix> {
        Ok(GeoFix::from_position(Position::new(
            Self::LATITUDE,
            Self::LONGITUDE,
        )))
    }
}
