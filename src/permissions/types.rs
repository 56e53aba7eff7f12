//! Core permission data model.

use serde::{Deserialize, Serialize};

/// A named permission gate on the underlying platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Bluetooth,
    Calendar,
    Camera,
    Contacts,
    Location,
    MediaLibrary,
    Microphone,
    Motion,
    Notification,
    PhotoLibrary,
    Reminders,
    Speech,
    Tracking,
}

impl Capability {
    /// Stable key used for settings persistence.
    pub fn key(self) -> &'static str {
        match self {
            Capability::Bluetooth => "bluetooth",
            Capability::Calendar => "calendar",
            Capability::Camera => "camera",
            Capability::Contacts => "contacts",
            Capability::Location => "location",
            Capability::MediaLibrary => "media_library",
            Capability::Microphone => "microphone",
            Capability::Motion => "motion",
            Capability::Notification => "notification",
            Capability::PhotoLibrary => "photo_library",
            Capability::Reminders => "reminders",
            Capability::Speech => "speech",
            Capability::Tracking => "tracking",
        }
    }

    /// Whether decisions for this capability are written to the persisted
    /// tier. The remaining capabilities are tracked in memory only.
    pub fn persists_decisions(self) -> bool {
        matches!(
            self,
            Capability::Calendar | Capability::Camera | Capability::Location | Capability::Notification
        )
    }
}

/// Urgency of a permission request; controls re-prompt suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Desire {
    WouldLike,
    Want,
    Need,
    Present,
}

/// Cached outcome of a past permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Unknown,
    Allowed,
    Denied,
    Skipped,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Unknown => "unknown",
            Decision::Allowed => "allowed",
            Decision::Denied => "denied",
            Decision::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Decision {
        match value {
            "allowed" => Decision::Allowed,
            "denied" => Decision::Denied,
            "skipped" => Decision::Skipped,
            _ => Decision::Unknown,
        }
    }
}

/// Live authorization state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    Unknown,
    Allowed,
    Denied,
}

impl AuthorizationStatus {
    /// The decision a status maps to when reported to callers.
    pub fn as_decision(self) -> Decision {
        match self {
            AuthorizationStatus::Unknown => Decision::Unknown,
            AuthorizationStatus::Allowed => Decision::Allowed,
            AuthorizationStatus::Denied => Decision::Denied,
        }
    }
}

/// A resolved (capability, decision) pair delivered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGrant {
    pub capability: Capability,
    pub decision: Decision,
}

impl CapabilityGrant {
    pub fn new(capability: Capability, decision: Decision) -> Self {
        Self {
            capability,
            decision,
        }
    }
}
