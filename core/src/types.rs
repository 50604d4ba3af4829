//! Shared primitive types used across the crate.

/// Stable identifier for a municipal team.
pub type TeamId = String;

/// Internal identifier for a report (uuid v4).
pub type ReportId = String;

/// Externally shareable, immutable report identifier.
pub type TrackingId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
