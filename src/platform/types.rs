//! Event and value types crossing the platform adapter boundary.

use serde::{Deserialize, Serialize};

use crate::permissions::types::{Capability, Decision};

/// One event in the stream produced by an authorization ask.
///
/// The platform resolves capabilities one at a time and terminates the
/// stream with an aggregate [`AskEvent::Dismissed`] once the dialog goes
/// away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskEvent {
    Resolved(Capability, Decision),
    Dismissed,
}

/// A geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One event in a location update stream.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Position(Position),
    Failed(String),
}
