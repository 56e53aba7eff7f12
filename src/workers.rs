//! Capability workers built on the platform adapters.

pub mod cache;
pub mod geo;
pub mod review;

pub use cache::{BlobCacheWorker, CacheChain, CacheWorker, ReauthCacheWorker, SharedCacheWorker};
pub use geo::{encode_geohash, FixedGeoWorker, GeoFix, GeoWorker};
pub use review::{LaunchStats, ReviewPolicy, ReviewWorker};
