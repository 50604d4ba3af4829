//! Team entity: a municipal work group with finite concurrent-assignment
//! capacity.
//!
//! RULE: `current_load` and the `team_assignment` rows move together, and
//! only through the assignment operations in the store. Everything here is
//! plain data plus pure queries.

use crate::error::DeskError;
use crate::types::{ReportId, TeamId, Timestamp};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Municipal department a team belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Department {
    PublicWorks,
    Utilities,
    ParksRecreation,
    Transportation,
    EmergencyServices,
    Environmental,
    Other,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublicWorks => "public-works",
            Self::Utilities => "utilities",
            Self::ParksRecreation => "parks-recreation",
            Self::Transportation => "transportation",
            Self::EmergencyServices => "emergency-services",
            Self::Environmental => "environmental",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public-works" => Ok(Self::PublicWorks),
            "utilities" => Ok(Self::Utilities),
            "parks-recreation" => Ok(Self::ParksRecreation),
            "transportation" => Ok(Self::Transportation),
            "emergency-services" => Ok(Self::EmergencyServices),
            "environmental" => Ok(Self::Environmental),
            "other" => Ok(Self::Other),
            _ => Err(DeskError::UnknownEnum {
                kind: "department",
                value: s.to_string(),
            }),
        }
    }
}

impl ToSql for Department {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Department {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: DeskError| FromSqlError::Other(Box::new(e)))
    }
}

/// Priority attached to an assignment by the triaging admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl AssignPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for AssignPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignPriority {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(DeskError::UnknownEnum {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

impl ToSql for AssignPriority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for AssignPriority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: DeskError| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: TeamId,
    pub name: String,
    pub department: Department,
    pub specialties: Vec<String>,
    pub capacity: u32,
    pub current_load: u32,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl TeamRecord {
    /// Pure capacity query: active and below capacity. No side effects.
    pub fn can_take_assignment(&self) -> bool {
        self.is_active && self.current_load < self.capacity
    }

    /// Remaining slots. Never negative while the load invariant holds.
    pub fn available_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.current_load)
    }
}

/// One row of a team's committed work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub report_id: ReportId,
    pub team_id: TeamId,
    pub priority: AssignPriority,
    pub assigned_at: Timestamp,
}
