//! Report entity and its lifecycle state machine.
//!
//! A report starts as `reported` and moves forward through triage. The one
//! sanctioned backward edge is the reopen: `resolved -> in-progress`.
//! `closed` is terminal.

use crate::error::{DeskError, DeskResult};
use crate::team::AssignPriority;
use crate::types::{ReportId, TeamId, Timestamp, TrackingId};
use rand::Rng;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 120;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Reported,
    InProgress,
    Resolved,
    Closed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Legal transitions. `reported -> closed` discards a report without
    /// work; `resolved -> in-progress` is the reopen edge.
    pub fn can_transition_to(self, to: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, to),
            (Reported, InProgress)
                | (Reported, Closed)
                | (InProgress, Resolved)
                | (Resolved, Closed)
                | (Resolved, InProgress)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reported" => Ok(Self::Reported),
            "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(DeskError::UnknownEnum {
                kind: "report status",
                value: s.to_string(),
            }),
        }
    }
}

impl ToSql for ReportStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ReportStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: DeskError| FromSqlError::Other(Box::new(e)))
    }
}

/// Severity reported by the citizen, before any triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Assignment priority a dispatch uses when no admin override is given.
    /// `urgent` is reserved for explicit admin escalation.
    pub fn default_priority(self) -> AssignPriority {
        match self {
            Self::Low => AssignPriority::Low,
            Self::Medium => AssignPriority::Medium,
            Self::High => AssignPriority::High,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(DeskError::UnknownEnum {
                kind: "severity",
                value: s.to_string(),
            }),
        }
    }
}

impl ToSql for Severity {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Severity {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: DeskError| FromSqlError::Other(Box::new(e)))
    }
}

/// Kind of entry in a report's append-only update trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateKind {
    StatusChange,
    Assignment,
    Unassignment,
    Comment,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusChange => "status-change",
            Self::Assignment => "assignment",
            Self::Unassignment => "unassignment",
            Self::Comment => "comment",
        }
    }
}

impl FromStr for UpdateKind {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status-change" => Ok(Self::StatusChange),
            "assignment" => Ok(Self::Assignment),
            "unassignment" => Ok(Self::Unassignment),
            "comment" => Ok(Self::Comment),
            _ => Err(DeskError::UnknownEnum {
                kind: "update kind",
                value: s.to_string(),
            }),
        }
    }
}

impl ToSql for UpdateKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for UpdateKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: DeskError| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
}

/// One entry of the append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportUpdate {
    pub kind: UpdateKind,
    pub message: String,
    pub created_by: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub report_id: ReportId,
    pub tracking_id: TrackingId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    pub status: ReportStatus,
    pub location: Option<Location>,
    pub media_url: Option<String>,
    pub reported_by: String,
    pub assigned_to: Option<TeamId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Citizen submission payload. Validated here, before any record is
/// constructed or persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub media_url: Option<String>,
    pub reported_by: String,
}

impl NewReport {
    pub fn validate(&self) -> DeskResult<()> {
        let title_len = self.title.trim().chars().count();
        if !(TITLE_MIN..=TITLE_MAX).contains(&title_len) {
            return Err(DeskError::InvalidSubmission {
                reason: format!("title must be {TITLE_MIN}-{TITLE_MAX} characters"),
            });
        }
        let desc_len = self.description.trim().chars().count();
        if !(DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&desc_len) {
            return Err(DeskError::InvalidSubmission {
                reason: format!("description must be {DESCRIPTION_MIN}-{DESCRIPTION_MAX} characters"),
            });
        }
        if self.category.trim().is_empty() {
            return Err(DeskError::InvalidSubmission {
                reason: "category is required".to_string(),
            });
        }
        if self.reported_by.trim().is_empty() {
            return Err(DeskError::InvalidSubmission {
                reason: "reporter handle is required".to_string(),
            });
        }
        if let Some(location) = &self.location {
            if !(-90.0..=90.0).contains(&location.lat) {
                return Err(DeskError::InvalidSubmission {
                    reason: format!("latitude {} out of range", location.lat),
                });
            }
            if !(-180.0..=180.0).contains(&location.lng) {
                return Err(DeskError::InvalidSubmission {
                    reason: format!("longitude {} out of range", location.lng),
                });
            }
        }
        Ok(())
    }

    /// Consume the submission and mint a full record with fresh ids.
    pub(crate) fn into_record(self, now: Timestamp) -> ReportRecord {
        ReportRecord {
            report_id: uuid::Uuid::new_v4().to_string(),
            tracking_id: new_tracking_id(now),
            title: self.title,
            description: self.description,
            category: self.category,
            severity: self.severity,
            status: ReportStatus::Reported,
            location: self.location,
            media_url: self.media_url,
            reported_by: self.reported_by,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Mint a shareable tracking id: `CIV-YYYYMMDD-XXXXX`.
/// The suffix alphabet omits 0/O/1/I/L so ids survive being read aloud.
pub fn new_tracking_id(now: Timestamp) -> TrackingId {
    const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("CIV-{}-{}", now.format("%Y%m%d"), suffix)
}
