//! Team and availability queries.

use super::DeskStore;
use crate::error::{DeskError, DeskResult};
use crate::team::{AssignmentEntry, TeamRecord};
use rusqlite::{params, OptionalExtension};

fn team_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamRecord> {
    Ok(TeamRecord {
        team_id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        specialties: Vec::new(), // filled in by the caller
        capacity: row.get(3)?,
        current_load: row.get(4)?,
        is_active: row.get::<_, i32>(5)? != 0,
        created_at: row.get(6)?,
    })
}

impl DeskStore {
    pub fn insert_team(&self, team: &TeamRecord) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO team (team_id, name, department, capacity, current_load, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                team.team_id,
                team.name,
                team.department,
                team.capacity,
                team.current_load,
                if team.is_active { 1i32 } else { 0i32 },
                team.created_at,
            ],
        )?;
        for specialty in &team.specialties {
            self.conn.execute(
                "INSERT INTO team_specialty (team_id, specialty) VALUES (?1, ?2)",
                params![team.team_id, specialty],
            )?;
        }
        Ok(())
    }

    fn team_specialties(&self, team_id: &str) -> DeskResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT specialty FROM team_specialty WHERE team_id = ?1 ORDER BY specialty",
        )?;
        let rows = stmt.query_map(params![team_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn fill_specialties(&self, teams: Vec<TeamRecord>) -> DeskResult<Vec<TeamRecord>> {
        teams
            .into_iter()
            .map(|team| {
                let specialties = self.team_specialties(&team.team_id)?;
                Ok(TeamRecord {
                    specialties,
                    ..team
                })
            })
            .collect()
    }

    pub fn get_team(&self, team_id: &str) -> DeskResult<TeamRecord> {
        let team = self
            .conn
            .query_row(
                "SELECT team_id, name, department, capacity, current_load, is_active, created_at
                 FROM team WHERE team_id = ?1",
                params![team_id],
                team_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DeskError::TeamNotFound {
                team_id: team_id.to_string(),
            })?;
        Ok(TeamRecord {
            specialties: self.team_specialties(team_id)?,
            ..team
        })
    }

    pub fn list_teams(&self) -> DeskResult<Vec<TeamRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT team_id, name, department, capacity, current_load, is_active, created_at
             FROM team ORDER BY name",
        )?;
        let teams = stmt
            .query_map([], team_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        self.fill_specialties(teams)
    }

    pub fn set_team_active(&self, team_id: &str, active: bool) -> DeskResult<()> {
        let changed = self.conn.execute(
            "UPDATE team SET is_active = ?1 WHERE team_id = ?2",
            params![if active { 1i32 } else { 0i32 }, team_id],
        )?;
        if changed == 0 {
            return Err(DeskError::TeamNotFound {
                team_id: team_id.to_string(),
            });
        }
        Ok(())
    }

    /// Availability query: active teams with spare capacity covering the
    /// category, least-loaded first, larger teams winning ties.
    pub fn teams_available_for_category(&self, category: &str) -> DeskResult<Vec<TeamRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.team_id, t.name, t.department, t.capacity, t.current_load, t.is_active, t.created_at
             FROM team t
             WHERE t.is_active = 1
               AND t.current_load < t.capacity
               AND EXISTS (SELECT 1 FROM team_specialty s
                           WHERE s.team_id = t.team_id AND s.specialty = ?1)
             ORDER BY t.current_load ASC, t.capacity DESC, t.name ASC",
        )?;
        let teams = stmt
            .query_map(params![category], team_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        self.fill_specialties(teams)
    }

    /// A team's committed work, oldest assignment first.
    pub fn team_assignments(&self, team_id: &str) -> DeskResult<Vec<AssignmentEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT report_id, team_id, priority, assigned_at
             FROM team_assignment WHERE team_id = ?1
             ORDER BY assigned_at ASC, report_id ASC",
        )?;
        let rows = stmt.query_map(params![team_id], |row| {
            Ok(AssignmentEntry {
                report_id: row.get(0)?,
                team_id: row.get(1)?,
                priority: row.get(2)?,
                assigned_at: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn team_assignment_count(&self, team_id: &str) -> DeskResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM team_assignment WHERE team_id = ?1",
                params![team_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// Invariant check: `0 <= current_load <= capacity` and the load counter
    /// matches the assignment rows. A mismatch is surfaced, never patched.
    pub fn verify_team_consistency(&self, team_id: &str) -> DeskResult<()> {
        self.conn
            .query_row(
                "SELECT 1 FROM team WHERE team_id = ?1",
                params![team_id],
                |_| Ok(()),
            )
            .optional()?
            .ok_or_else(|| DeskError::TeamNotFound {
                team_id: team_id.to_string(),
            })?;
        super::assignment::check_team_consistency(&self.conn, team_id)
    }

    // ── Test helpers ───────────────────────────────────────────

    /// Overwrite the load counter directly, bypassing the assignment
    /// operations. Used by desync-detection tests only.
    pub fn force_team_load(&self, team_id: &str, load: i64) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE team SET current_load = ?1 WHERE team_id = ?2",
            params![load, team_id],
        )?;
        Ok(())
    }
}
