//! desk-runner: headless triage runner for CivicDesk.
//!
//! Usage:
//!   desk-runner --db desk.db --data-dir ./data --reports 6
//!   desk-runner --ipc-mode

use anyhow::Result;
use civicdesk_core::{
    config::DeskConfig,
    desk::TriageDesk,
    event::DeskEvent,
    report::{Location, NewReport, ReportRecord, ReportStatus, Severity},
    store::DeskStore,
    team::{AssignPriority, TeamRecord},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::Receiver;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Submit {
        report: NewReport,
    },
    Assign {
        report_id: String,
        team_id: String,
        priority: AssignPriority,
    },
    Unassign {
        report_id: String,
        team_id: String,
    },
    SetStatus {
        report_id: String,
        status: ReportStatus,
        note: Option<String>,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    teams: Vec<TeamRecord>,
    queued: Vec<ReportRecord>,
    in_progress: i64,
    resolved: i64,
    closed: i64,
}

const SAMPLE_REPORTS: &[(&str, &str, &str, Severity)] = &[
    (
        "Pothole on Maple Ave",
        "Deep pothole near the crosswalk at Maple and 3rd, already damaging tires.",
        "pothole",
        Severity::High,
    ),
    (
        "Streetlight out at Harbor Park",
        "The streetlight at the Harbor Park entrance has been dark for a week.",
        "streetlight",
        Severity::Medium,
    ),
    (
        "Graffiti on the band shell",
        "Fresh graffiti across the north face of the Riverside band shell.",
        "graffiti",
        Severity::Low,
    ),
    (
        "Water pooling on 5th Street",
        "Water has been seeping up through the pavement on 5th for two days.",
        "water-leak",
        Severity::High,
    ),
    (
        "Broken swing at Riverside playground",
        "One of the swings has a snapped chain and sharp edges at seat height.",
        "parks",
        Severity::Medium,
    ),
    (
        "Leaning stop sign on Birch Rd",
        "The stop sign at Birch and Willow leans far enough to be hard to see.",
        "signage",
        Severity::Medium,
    ),
];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let demo_reports = parse_arg(&args, "--reports", 6usize);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!(
            "CivicDesk — desk-runner ({})",
            chrono::Utc::now().format("%Y-%m-%d %H:%M")
        );
        println!("  db:       {db}");
        println!("  data_dir: {data_dir}");
        println!("  reports:  {demo_reports}");
        println!();
    }

    let store = if db == ":memory:" {
        DeskStore::in_memory()?
    } else {
        DeskStore::open(db)?
    };
    store.migrate()?;

    let mut desk = TriageDesk::new(store);
    let notifications = desk.subscribe();

    if desk.store().list_teams()?.is_empty() {
        let config = DeskConfig::load(data_dir).unwrap_or_else(|e| {
            log::warn!("{e}; falling back to built-in roster");
            DeskConfig::default_test()
        });
        desk.provision_roster(&config.roster)?;
    }

    if ipc_mode {
        run_ipc_loop(&mut desk)?;
    } else {
        run_demo(&mut desk, demo_reports)?;
        print_notifications(&notifications);
        print_summary(&desk)?;
    }

    Ok(())
}

fn run_demo(desk: &mut TriageDesk, count: usize) -> Result<()> {
    let mut dispatched: Vec<(String, String)> = Vec::new();

    for i in 0..count {
        let (title, description, category, severity) = SAMPLE_REPORTS[i % SAMPLE_REPORTS.len()];
        let report = desk.submit_report(NewReport {
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            severity,
            location: Some(Location {
                lat: 44.98 + (i as f64) * 0.004,
                lng: -93.26 - (i as f64) * 0.003,
                address: None,
            }),
            media_url: None,
            reported_by: format!("citizen-{:03}", i + 1),
        })?;

        match desk.dispatch(&report.report_id, "desk-admin")? {
            Some(team_id) => {
                println!("  {} [{category}] -> {team_id}", report.tracking_id);
                dispatched.push((report.report_id, team_id));
            }
            None => {
                println!("  {} [{category}] -> queued (no capacity)", report.tracking_id);
            }
        }
    }

    // Walk one report through the full lifecycle, reopen included.
    if let Some((report_id, team_id)) = dispatched.first() {
        desk.change_status(report_id, ReportStatus::Resolved, "desk-admin", Some("crew confirmed the fix"))?;
        desk.change_status(report_id, ReportStatus::InProgress, "desk-admin", Some("issue recurred, reopening"))?;
        desk.change_status(report_id, ReportStatus::Resolved, "desk-admin", None)?;
        desk.unassign(report_id, team_id, "desk-admin")?;
        desk.change_status(report_id, ReportStatus::Closed, "desk-admin", None)?;
    }

    Ok(())
}

fn print_notifications(notifications: &Receiver<DeskEvent>) {
    println!();
    println!("=== NOTIFICATIONS ===");
    while let Ok(event) = notifications.try_recv() {
        match serde_json::to_string(&event) {
            Ok(json) => println!("  {json}"),
            Err(e) => log::warn!("could not render event: {e}"),
        }
    }
}

fn print_summary(desk: &TriageDesk) -> Result<()> {
    let teams = desk.store().list_teams()?;
    let queued = desk.store().queued_reports()?;

    println!();
    println!("=== TEAM LOAD ===");
    for team in &teams {
        println!(
            "  {:<18} {}/{} {:<9} [{}]",
            team.team_id,
            team.current_load,
            team.capacity,
            if team.is_active { "active" } else { "inactive" },
            team.specialties.join(", "),
        );
    }

    println!();
    println!("=== REPORTS ===");
    println!("  total:       {}", desk.store().report_count()?);
    println!("  reported:    {}", desk.store().status_count(ReportStatus::Reported)?);
    println!("  in-progress: {}", desk.store().status_count(ReportStatus::InProgress)?);
    println!("  resolved:    {}", desk.store().status_count(ReportStatus::Resolved)?);
    println!("  closed:      {}", desk.store().status_count(ReportStatus::Closed)?);
    println!("  queued:      {}", queued.len());
    Ok(())
}

fn run_ipc_loop(desk: &mut TriageDesk) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let outcome = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Ok(()),
            IpcCommand::Submit { report } => desk.submit_report(report).map(|_| ()),
            IpcCommand::Assign {
                report_id,
                team_id,
                priority,
            } => desk.assign(&report_id, &team_id, priority, "admin-ui"),
            IpcCommand::Unassign { report_id, team_id } => {
                desk.unassign(&report_id, &team_id, "admin-ui")
            }
            IpcCommand::SetStatus {
                report_id,
                status,
                note,
            } => desk.change_status(&report_id, status, "admin-ui", note.as_deref()),
        };

        if let Err(e) = outcome {
            let err_json = serde_json::json!({ "error": e.to_string() });
            writeln!(stdout, "{}", err_json)?;
            stdout.flush()?;
            continue;
        }

        let state = build_ui_state(desk)?;
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(desk: &TriageDesk) -> Result<UiState> {
    Ok(UiState {
        teams: desk.store().list_teams()?,
        queued: desk.store().queued_reports()?,
        in_progress: desk.store().status_count(ReportStatus::InProgress)?,
        resolved: desk.store().status_count(ReportStatus::Resolved)?,
        closed: desk.store().status_count(ReportStatus::Closed)?,
    })
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
