use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod backend;
mod config;
mod db;
mod error;
mod flows;
mod metrics;
mod models;
mod report;
mod store;
#[cfg(test)]
mod test_support;

use backend::AcademicBackend;
use config::AppConfig;
use db::PgBackend;
use flows::{
    ActivityFlow, AgendaFlow, AttendanceFlow, ClassFlow, ExamFlow, NoteFlow, SemesterFlow,
};
use metrics::DashboardSummary;
use models::{ActivityStatus, AgendaKind, AttendanceStatus, EntityKind, NoteTag};
use store::{AppState, Store, SubmitOutcome};

#[derive(Parser)]
#[command(name = "academic-dashboard")]
#[command(about = "Personal tracker for semesters, classes, grades and attendance", long_about = None)]
struct Cli {
    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a small sample semester
    Seed,
    /// Print the dashboard headline numbers
    Summary,
    /// Generate a markdown dashboard report
    Report {
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
    /// Dump loaded collections and summary as JSON
    Snapshot {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Register a semester
    AddSemester {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        focus: String,
    },
    /// Register a class in the selected semester
    AddClass {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        teacher: String,
        #[arg(long)]
        day: String,
        #[arg(long)]
        time: String,
        /// Semester to attach to; defaults to the first loaded semester
        #[arg(long)]
        semester: Option<Uuid>,
    },
    /// Record a comment, question or review point for a class
    AddNote {
        #[arg(long = "class")]
        class_id: Uuid,
        #[arg(long)]
        detail: String,
        #[arg(long, default_value = "")]
        topic: String,
        #[arg(long, value_enum, default_value_t = NoteTag::Comment)]
        tag: NoteTag,
    },
    /// Add an activity or assignment
    AddActivity {
        #[arg(long = "class")]
        class_id: Uuid,
        #[arg(long)]
        title: String,
        /// Due date as YYYY-MM-DD
        #[arg(long, default_value = "")]
        due_date: String,
        #[arg(long, value_enum, default_value_t = ActivityStatus::Planned)]
        status: ActivityStatus,
    },
    /// Schedule an agenda entry
    AddAgenda {
        #[arg(long)]
        title: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Time as HH:MM
        #[arg(long, default_value = "")]
        time: String,
        #[arg(long = "class")]
        class_id: Option<Uuid>,
        #[arg(long, value_enum, default_value_t = AgendaKind::ClassSession)]
        kind: AgendaKind,
    },
    /// Record an exam grade
    AddExam {
        #[arg(long = "class")]
        class_id: Uuid,
        #[arg(long)]
        exam: String,
        #[arg(long, default_value = "")]
        grade: String,
        #[arg(long, default_value = "10")]
        max: String,
    },
    /// Record attendance for a class session
    AddAttendance {
        #[arg(long = "class")]
        class_id: Uuid,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long, value_enum, default_value_t = AttendanceStatus::Present)]
        status: AttendanceStatus,
    },
}

#[derive(Serialize)]
struct Snapshot<'a> {
    #[serde(flatten)]
    state: &'a AppState,
    summary: DashboardSummary,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Store> {
    let backend = PgBackend::connect(config)?;
    load_store(Box::new(backend)).await
}

/// Loads the dashboard. Missing configuration is fatal; other load errors were
/// already logged by the store and leave the resolved collections usable.
async fn load_store(backend: Box<dyn AcademicBackend>) -> anyhow::Result<Store> {
    let configured = backend.is_configured();
    let mut store = Store::new(backend);
    store.load().await;

    if !configured {
        if let Some(error) = &store.state().error {
            anyhow::bail!(error.clone());
        }
    }

    Ok(store)
}

fn finish<R>(
    kind: EntityKind,
    outcome: SubmitOutcome<R>,
    id: impl Fn(&R) -> Uuid,
) -> anyhow::Result<()> {
    match outcome {
        SubmitOutcome::Created(record) => {
            println!("Created {kind} {}.", id(&record));
            Ok(())
        }
        SubmitOutcome::Skipped => {
            anyhow::bail!("{kind} not created: required fields are missing")
        }
        SubmitOutcome::Failed(message) => anyhow::bail!("failed to create {kind}: {message}"),
    }
}

fn print_summary(summary: &DashboardSummary) {
    println!(
        "Active semester: {}",
        summary.active_semester.as_deref().unwrap_or("-")
    );
    println!("Classes: {}", summary.class_count);
    println!("Activities: {}", summary.activity_count);
    println!("Attendance rate: {}%", summary.attendance_rate);
    println!("Average grade: {:.1}", summary.average_grade);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::InitDb => {
            let backend = PgBackend::connect(&config)?;
            db::init_db(backend.pool()?)
                .await
                .context("failed to apply migrations")?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let backend = PgBackend::connect(&config)?;
            db::seed(backend.pool()?)
                .await
                .context("failed to insert seed data")?;
            println!("Seed data inserted.");
        }
        Commands::Summary => {
            let store = open_store(&config).await?;
            print_summary(&store.state().summary());
        }
        Commands::Report { out } => {
            let store = open_store(&config).await?;
            let report = report::build_report(store.state());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Snapshot { out } => {
            let store = open_store(&config).await?;
            let snapshot = Snapshot {
                state: store.state(),
                summary: store.state().summary(),
            };
            let json = serde_json::to_string_pretty(&snapshot)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Snapshot written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::AddSemester { name, focus } => {
            let mut store = open_store(&config).await?;
            store.edit_draft::<SemesterFlow>(|draft| {
                draft.name = name;
                draft.focus = focus;
            });
            let outcome = store.submit::<SemesterFlow>().await;
            finish(EntityKind::Semester, outcome, |record| record.id)?;
        }
        Commands::AddClass {
            title,
            teacher,
            day,
            time,
            semester,
        } => {
            let mut store = open_store(&config).await?;
            if let Some(id) = semester {
                store.select_semester(id);
            }
            store.edit_draft::<ClassFlow>(|draft| {
                draft.title = title;
                draft.teacher = teacher;
                draft.day = day;
                draft.time = time;
            });
            let outcome = store.submit::<ClassFlow>().await;
            finish(EntityKind::Class, outcome, |record| record.id)?;
        }
        Commands::AddNote {
            class_id,
            detail,
            topic,
            tag,
        } => {
            let mut store = open_store(&config).await?;
            store.edit_draft::<NoteFlow>(|draft| {
                draft.class_id = Some(class_id);
                draft.detail = detail;
                draft.topic = topic;
                draft.tag = tag;
            });
            let outcome = store.submit::<NoteFlow>().await;
            finish(EntityKind::Note, outcome, |record| record.id)?;
        }
        Commands::AddActivity {
            class_id,
            title,
            due_date,
            status,
        } => {
            let mut store = open_store(&config).await?;
            store.edit_draft::<ActivityFlow>(|draft| {
                draft.class_id = Some(class_id);
                draft.title = title;
                draft.due_date = due_date;
                draft.status = status;
            });
            let outcome = store.submit::<ActivityFlow>().await;
            finish(EntityKind::Activity, outcome, |record| record.id)?;
        }
        Commands::AddAgenda {
            title,
            date,
            time,
            class_id,
            kind,
        } => {
            let mut store = open_store(&config).await?;
            store.edit_draft::<AgendaFlow>(|draft| {
                draft.title = title;
                draft.date = date;
                draft.time = time;
                draft.class_id = class_id;
                draft.kind = kind;
            });
            let outcome = store.submit::<AgendaFlow>().await;
            finish(EntityKind::AgendaItem, outcome, |record| record.id)?;
        }
        Commands::AddExam {
            class_id,
            exam,
            grade,
            max,
        } => {
            let mut store = open_store(&config).await?;
            store.edit_draft::<ExamFlow>(|draft| {
                draft.class_id = Some(class_id);
                draft.exam = exam;
                draft.grade = grade;
                draft.max = max;
            });
            let outcome = store.submit::<ExamFlow>().await;
            finish(EntityKind::Exam, outcome, |record| record.id)?;
        }
        Commands::AddAttendance {
            class_id,
            date,
            status,
        } => {
            let mut store = open_store(&config).await?;
            store.edit_draft::<AttendanceFlow>(|draft| {
                draft.class_id = Some(class_id);
                draft.date = date;
                draft.status = status;
            });
            let outcome = store.submit::<AttendanceFlow>().await;
            finish(EntityKind::Attendance, outcome, |record| record.id)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_enum_flags_in_kebab_case() {
        let cli = Cli::parse_from([
            "academic-dashboard",
            "add-activity",
            "--class",
            "6f1c2a4e-8d0b-4c51-9a7e-2b3d4c5e6f70",
            "--title",
            "Essay",
            "--status",
            "in-progress",
        ]);
        match cli.command {
            Commands::AddActivity { status, due_date, .. } => {
                assert_eq!(status, ActivityStatus::InProgress);
                assert!(due_date.is_empty());
            }
            _ => panic!("expected add-activity"),
        }
    }

    #[test]
    fn finish_reports_skipped_and_failed_submits() {
        let skipped: SubmitOutcome<()> = SubmitOutcome::Skipped;
        let err = finish(EntityKind::Semester, skipped, |_| Uuid::nil()).unwrap_err();
        assert!(err.to_string().contains("required fields"));

        let failed: SubmitOutcome<()> = SubmitOutcome::Failed("duplicate key".to_string());
        let err = finish(EntityKind::Note, failed, |_| Uuid::nil()).unwrap_err();
        assert_eq!(err.to_string(), "failed to create note: duplicate key");
    }

    #[tokio::test]
    async fn load_errors_leave_the_store_usable() {
        let first = test_support::semester("2026.1");
        let backend = test_support::FakeBackend::configured()
            .with_semesters(vec![first])
            .failing_fetch(EntityKind::Note, "relation \"notes\" does not exist");
        let store = load_store(Box::new(backend)).await.unwrap();

        assert_eq!(store.state().semesters.len(), 1);
        assert_eq!(
            store.state().error.as_deref(),
            Some("relation \"notes\" does not exist")
        );
    }

    #[tokio::test]
    async fn open_store_fails_fast_without_configuration() {
        let config = AppConfig {
            database_url: None,
            max_connections: 5,
        };
        let err = open_store(&config).await.err().unwrap();
        assert_eq!(err.to_string(), error::NOT_CONFIGURED);
    }
}
