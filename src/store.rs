//! Application state and its single update channel.
//!
//! Every change goes through [`Store::dispatch`], which replaces the whole
//! [`AppState`] with the result of [`reduce`]. Backend calls happen in the
//! store's async operations; only their outcomes are dispatched.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::AcademicBackend;
use crate::error::NOT_CONFIGURED;
use crate::flows::{
    merge, ActivityDraft, ActivityFlow, AgendaDraft, AgendaFlow, AttendanceDraft, AttendanceFlow,
    ClassDraft, ClassFlow, CreateFlow, Drafts, ExamDraft, ExamFlow, NoteDraft, NoteFlow,
    SemesterDraft, SemesterFlow,
};
use crate::metrics::{self, DashboardSummary};
use crate::models::{Activity, AgendaItem, Attendance, Class, Exam, Note, Semester};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AppState {
    pub loading: bool,
    pub error: Option<String>,
    pub selected_semester_id: Option<Uuid>,
    pub semesters: Vec<Semester>,
    pub classes: Vec<Class>,
    pub notes: Vec<Note>,
    pub activities: Vec<Activity>,
    pub agenda: Vec<AgendaItem>,
    pub exams: Vec<Exam>,
    pub attendance: Vec<Attendance>,
    #[serde(skip)]
    pub drafts: Drafts,
}

impl AppState {
    /// Selected semester, if the selection refers to a loaded one.
    pub fn active_semester(&self) -> Option<&Semester> {
        let selected = self.selected_semester_id?;
        self.semesters.iter().find(|semester| semester.id == selected)
    }

    pub fn classes_by_semester(&self) -> HashMap<Uuid, Vec<&Class>> {
        metrics::classes_by_semester(&self.classes)
    }

    pub fn active_semester_classes(&self) -> Vec<&Class> {
        metrics::active_semester_classes(&self.classes, self.selected_semester_id)
    }

    pub fn attendance_rate(&self) -> u32 {
        metrics::attendance_rate(&self.attendance)
    }

    pub fn average_grade(&self) -> f64 {
        metrics::average_grade(&self.exams)
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            active_semester: self.active_semester().map(|semester| semester.name.clone()),
            class_count: self.active_semester_classes().len(),
            activity_count: self.activities.len(),
            attendance_rate: self.attendance_rate(),
            average_grade: self.average_grade(),
        }
    }
}

/// Outcome of the initial parallel load, one slot per collection.
#[derive(Debug)]
pub struct LoadBatch {
    pub semesters: Result<Vec<Semester>, String>,
    pub classes: Result<Vec<Class>, String>,
    pub notes: Result<Vec<Note>, String>,
    pub activities: Result<Vec<Activity>, String>,
    pub agenda: Result<Vec<AgendaItem>, String>,
    pub exams: Result<Vec<Exam>, String>,
    pub attendance: Result<Vec<Attendance>, String>,
}

#[derive(Debug, Clone)]
pub enum DraftEdit {
    Semester(SemesterDraft),
    Class(ClassDraft),
    Note(NoteDraft),
    Activity(ActivityDraft),
    Agenda(AgendaDraft),
    Exam(ExamDraft),
    Attendance(AttendanceDraft),
}

/// A backend-confirmed record ready to be merged.
#[derive(Debug, Clone)]
pub enum Created {
    Semester(Semester),
    Class(Class),
    Note(Note),
    Activity(Activity),
    AgendaItem(AgendaItem),
    Exam(Exam),
    Attendance(Attendance),
}

#[derive(Debug)]
pub enum Action {
    LoadStarted,
    LoadFinished(Box<LoadBatch>),
    /// Startup stopped before contacting the backend.
    LoadAborted(String),
    SemesterSelected(Uuid),
    DraftEdited(DraftEdit),
    RecordCreated(Created),
    RequestFailed(String),
}

pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();

    match action {
        Action::LoadStarted => {
            next.loading = true;
        }
        Action::LoadFinished(batch) => apply_batch(&mut next, *batch),
        Action::LoadAborted(message) => {
            next.loading = false;
            next.error = Some(message);
        }
        Action::SemesterSelected(id) => {
            next.selected_semester_id = Some(id);
        }
        Action::DraftEdited(edit) => match edit {
            DraftEdit::Semester(draft) => next.drafts.semester = draft,
            DraftEdit::Class(draft) => next.drafts.class = draft,
            DraftEdit::Note(draft) => next.drafts.note = draft,
            DraftEdit::Activity(draft) => next.drafts.activity = draft,
            DraftEdit::Agenda(draft) => next.drafts.agenda = draft,
            DraftEdit::Exam(draft) => next.drafts.exam = draft,
            DraftEdit::Attendance(draft) => next.drafts.attendance = draft,
        },
        Action::RecordCreated(created) => match created {
            Created::Semester(record) => merge::<SemesterFlow>(&mut next, record),
            Created::Class(record) => merge::<ClassFlow>(&mut next, record),
            Created::Note(record) => merge::<NoteFlow>(&mut next, record),
            Created::Activity(record) => merge::<ActivityFlow>(&mut next, record),
            Created::AgendaItem(record) => merge::<AgendaFlow>(&mut next, record),
            Created::Exam(record) => merge::<ExamFlow>(&mut next, record),
            Created::Attendance(record) => merge::<AttendanceFlow>(&mut next, record),
        },
        Action::RequestFailed(message) => {
            next.error = Some(message);
        }
    }

    next
}

/// Resolved collections are applied even when a sibling fetch failed; the
/// first failure in entity order becomes the error message.
fn apply_batch(state: &mut AppState, batch: LoadBatch) {
    let mut first_error = None;
    let first_semester = batch
        .semesters
        .as_ref()
        .ok()
        .and_then(|rows| rows.first())
        .map(|semester| semester.id);

    apply(&mut state.semesters, batch.semesters, &mut first_error);
    apply(&mut state.classes, batch.classes, &mut first_error);
    apply(&mut state.notes, batch.notes, &mut first_error);
    apply(&mut state.activities, batch.activities, &mut first_error);
    apply(&mut state.agenda, batch.agenda, &mut first_error);
    apply(&mut state.exams, batch.exams, &mut first_error);
    apply(&mut state.attendance, batch.attendance, &mut first_error);

    if state.selected_semester_id.is_none() {
        state.selected_semester_id = first_semester;
    }
    if let Some(message) = first_error {
        state.error = Some(message);
    }
    state.loading = false;
}

fn apply<T>(slot: &mut Vec<T>, result: Result<Vec<T>, String>, first_error: &mut Option<String>) {
    match result {
        Ok(rows) => *slot = rows,
        Err(message) => {
            first_error.get_or_insert(message);
        }
    }
}

/// Result of driving one create-flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<R> {
    /// Validation failed; nothing was sent and state is unchanged.
    Skipped,
    Created(R),
    /// The backend refused the insert; the draft is preserved.
    Failed(String),
}

pub struct Store {
    state: AppState,
    backend: Box<dyn AcademicBackend>,
}

impl Store {
    pub fn new(backend: Box<dyn AcademicBackend>) -> Self {
        Self {
            state: AppState {
                loading: true,
                ..AppState::default()
            },
            backend,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state = reduce(&self.state, action);
    }

    /// Fans out all seven fetches and applies them in one transition.
    pub async fn load(&mut self) {
        if !self.backend.is_configured() {
            warn!("backend not configured; skipping initial load");
            self.dispatch(Action::LoadAborted(NOT_CONFIGURED.to_string()));
            return;
        }

        self.dispatch(Action::LoadStarted);

        let backend = self.backend.as_ref();
        let (semesters, classes, notes, activities, agenda, exams, attendance) = futures::join!(
            backend.fetch_semesters(),
            backend.fetch_classes(),
            backend.fetch_notes(),
            backend.fetch_activities(),
            backend.fetch_agenda_items(),
            backend.fetch_exams(),
            backend.fetch_attendance(),
        );

        let batch = LoadBatch {
            semesters: semesters.map_err(|err| err.to_string()),
            classes: classes.map_err(|err| err.to_string()),
            notes: notes.map_err(|err| err.to_string()),
            activities: activities.map_err(|err| err.to_string()),
            agenda: agenda.map_err(|err| err.to_string()),
            exams: exams.map_err(|err| err.to_string()),
            attendance: attendance.map_err(|err| err.to_string()),
        };

        self.dispatch(Action::LoadFinished(Box::new(batch)));

        let state = &self.state;
        match &state.error {
            Some(error) => warn!(%error, "dashboard load finished with errors"),
            None => info!(
                semesters = state.semesters.len(),
                classes = state.classes.len(),
                notes = state.notes.len(),
                activities = state.activities.len(),
                agenda = state.agenda.len(),
                exams = state.exams.len(),
                attendance = state.attendance.len(),
                "dashboard loaded"
            ),
        }
    }

    pub fn select_semester(&mut self, id: Uuid) {
        self.dispatch(Action::SemesterSelected(id));
    }

    pub fn edit_draft<F: CreateFlow>(&mut self, edit: impl FnOnce(&mut F::Draft)) {
        let mut draft = F::draft(&self.state).clone();
        edit(&mut draft);
        self.dispatch(Action::DraftEdited(F::edited(draft)));
    }

    pub async fn submit<F: CreateFlow>(&mut self) -> SubmitOutcome<F::Record> {
        let Some(input) = F::validate(&self.state) else {
            debug!(entity = %F::KIND, "submit skipped: required fields missing");
            return SubmitOutcome::Skipped;
        };

        match F::insert(self.backend.as_ref(), input).await {
            Ok(record) => {
                info!(entity = %F::KIND, table = F::KIND.table(), "record created");
                self.dispatch(Action::RecordCreated(F::created(record.clone())));
                SubmitOutcome::Created(record)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(entity = %F::KIND, error = %message, "submit failed");
                self.dispatch(Action::RequestFailed(message.clone()));
                SubmitOutcome::Failed(message)
            }
        }
    }
}
