//! Roster configuration loaded from the data/ directory.

use crate::team::Department;
use serde::{Deserialize, Serialize};

/// One team as provisioned by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSeed {
    pub team_id: String,
    pub name: String,
    pub department: Department,
    pub specialties: Vec<String>,
    pub capacity: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct RosterFile {
    teams: Vec<TeamSeed>,
}

#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub roster: Vec<TeamSeed>,
}

impl DeskConfig {
    /// Load from the data/ directory.
    /// In tests, use DeskConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/teams/roster.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: RosterFile = serde_json::from_str(&content)?;
        Ok(Self {
            roster: file.teams,
        })
    }

    /// Built-in roster for tests and demo fallback.
    pub fn default_test() -> Self {
        let roster = vec![
            TeamSeed {
                team_id: "road-crew".into(),
                name: "Road Maintenance Crew".into(),
                department: Department::PublicWorks,
                specialties: vec!["pothole".into(), "sidewalk".into(), "signage".into()],
                capacity: 4,
                is_active: true,
            },
            TeamSeed {
                team_id: "streetlight-unit".into(),
                name: "Streetlight Unit".into(),
                department: Department::Utilities,
                specialties: vec!["streetlight".into(), "power-outage".into()],
                capacity: 3,
                is_active: true,
            },
            TeamSeed {
                team_id: "parks-crew".into(),
                name: "Parks & Grounds Crew".into(),
                department: Department::ParksRecreation,
                specialties: vec!["parks".into(), "graffiti".into(), "tree-hazard".into()],
                capacity: 2,
                is_active: true,
            },
            TeamSeed {
                team_id: "water-dept".into(),
                name: "Water & Sewer Department".into(),
                department: Department::Utilities,
                specialties: vec!["water-leak".into(), "sewer".into()],
                capacity: 5,
                is_active: true,
            },
        ];
        Self { roster }
    }
}
