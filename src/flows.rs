//! Create-flows: one draft, one validation rule and one insert per entity.
//!
//! A submit validates the draft synchronously, forwards the trimmed input to
//! the backend, then merges the returned record in canonical order and resets
//! the draft. A rejected insert leaves the draft untouched so it can be retried.

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::backend::AcademicBackend;
use crate::error::DataError;
use crate::models::{
    Activity, ActivityStatus, AgendaItem, AgendaKind, Attendance, AttendanceStatus, Class,
    EntityKind, Exam, NewActivity, NewAgendaItem, NewAttendance, NewClass, NewExam, NewNote,
    NewSemester, Note, NoteTag, Semester,
};
use crate::store::{AppState, Created, DraftEdit};

const DEFAULT_EXAM_MAX: f64 = 10.0;

/// Where a confirmed record lands in its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOrder {
    /// Newest first (creation-descending collections).
    Prepend,
    /// Oldest first (creation- or date-ascending collections).
    Append,
}

pub trait CreateFlow {
    type Draft: Clone + Default + PartialEq + std::fmt::Debug;
    type Input: std::fmt::Debug + Send;
    type Record: Clone + std::fmt::Debug;

    const KIND: EntityKind;
    const ORDER: MergeOrder;

    fn draft(state: &AppState) -> &Self::Draft;
    fn draft_mut(state: &mut AppState) -> &mut Self::Draft;
    fn collection_mut(state: &mut AppState) -> &mut Vec<Self::Record>;

    /// Returns `None` when a required field is blank or a required relation is missing.
    fn validate(state: &AppState) -> Option<Self::Input>;

    fn insert(
        backend: &dyn AcademicBackend,
        input: Self::Input,
    ) -> BoxFuture<'_, Result<Self::Record, DataError>>;

    fn created(record: Self::Record) -> Created;
    fn edited(draft: Self::Draft) -> DraftEdit;

    fn after_merge(_state: &mut AppState, _record: &Self::Record) {}
}

/// Applies a confirmed record: merge in canonical order, then reset the draft.
pub fn merge<F: CreateFlow>(state: &mut AppState, record: F::Record) {
    F::after_merge(state, &record);
    let collection = F::collection_mut(state);
    match F::ORDER {
        MergeOrder::Prepend => collection.insert(0, record),
        MergeOrder::Append => collection.push(record),
    }
    *F::draft_mut(state) = F::Draft::default();
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_number(value: &str, fallback: f64) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemesterDraft {
    pub name: String,
    pub focus: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDraft {
    pub title: String,
    pub teacher: String,
    pub day: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub class_id: Option<Uuid>,
    pub topic: String,
    pub detail: String,
    pub tag: NoteTag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityDraft {
    pub class_id: Option<Uuid>,
    pub title: String,
    pub due_date: String,
    pub status: ActivityStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgendaDraft {
    pub kind: AgendaKind,
    pub title: String,
    pub date: String,
    pub time: String,
    pub class_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamDraft {
    pub class_id: Option<Uuid>,
    pub exam: String,
    pub grade: String,
    pub max: String,
}

impl Default for ExamDraft {
    fn default() -> Self {
        Self {
            class_id: None,
            exam: String::new(),
            grade: String::new(),
            max: "10".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceDraft {
    pub class_id: Option<Uuid>,
    pub date: String,
    pub status: AttendanceStatus,
}

/// All pending drafts, one per create-flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drafts {
    pub semester: SemesterDraft,
    pub class: ClassDraft,
    pub note: NoteDraft,
    pub activity: ActivityDraft,
    pub agenda: AgendaDraft,
    pub exam: ExamDraft,
    pub attendance: AttendanceDraft,
}

pub struct SemesterFlow;
pub struct ClassFlow;
pub struct NoteFlow;
pub struct ActivityFlow;
pub struct AgendaFlow;
pub struct ExamFlow;
pub struct AttendanceFlow;

impl CreateFlow for SemesterFlow {
    type Draft = SemesterDraft;
    type Input = NewSemester;
    type Record = Semester;

    const KIND: EntityKind = EntityKind::Semester;
    const ORDER: MergeOrder = MergeOrder::Append;

    fn draft(state: &AppState) -> &Self::Draft {
        &state.drafts.semester
    }

    fn draft_mut(state: &mut AppState) -> &mut Self::Draft {
        &mut state.drafts.semester
    }

    fn collection_mut(state: &mut AppState) -> &mut Vec<Self::Record> {
        &mut state.semesters
    }

    fn validate(state: &AppState) -> Option<Self::Input> {
        let draft = &state.drafts.semester;
        Some(NewSemester {
            name: non_blank(&draft.name)?,
            focus: draft.focus.trim().to_string(),
        })
    }

    fn insert(
        backend: &dyn AcademicBackend,
        input: Self::Input,
    ) -> BoxFuture<'_, Result<Self::Record, DataError>> {
        backend.add_semester(input)
    }

    fn created(record: Self::Record) -> Created {
        Created::Semester(record)
    }

    fn edited(draft: Self::Draft) -> DraftEdit {
        DraftEdit::Semester(draft)
    }

    /// The first semester ever created becomes the selection.
    fn after_merge(state: &mut AppState, record: &Self::Record) {
        if state.selected_semester_id.is_none() {
            state.selected_semester_id = Some(record.id);
        }
    }
}

impl CreateFlow for ClassFlow {
    type Draft = ClassDraft;
    type Input = NewClass;
    type Record = Class;

    const KIND: EntityKind = EntityKind::Class;
    const ORDER: MergeOrder = MergeOrder::Append;

    fn draft(state: &AppState) -> &Self::Draft {
        &state.drafts.class
    }

    fn draft_mut(state: &mut AppState) -> &mut Self::Draft {
        &mut state.drafts.class
    }

    fn collection_mut(state: &mut AppState) -> &mut Vec<Self::Record> {
        &mut state.classes
    }

    fn validate(state: &AppState) -> Option<Self::Input> {
        let semester = state.active_semester()?;
        let draft = &state.drafts.class;
        let title = non_blank(&draft.title)?;
        let day = non_blank(&draft.day)?;
        let time = non_blank(&draft.time)?;

        Some(NewClass {
            semester_id: semester.id,
            title,
            teacher: draft.teacher.trim().to_string(),
            schedule: format!("{day} {time}"),
        })
    }

    fn insert(
        backend: &dyn AcademicBackend,
        input: Self::Input,
    ) -> BoxFuture<'_, Result<Self::Record, DataError>> {
        backend.add_class(input)
    }

    fn created(record: Self::Record) -> Created {
        Created::Class(record)
    }

    fn edited(draft: Self::Draft) -> DraftEdit {
        DraftEdit::Class(draft)
    }
}

impl CreateFlow for NoteFlow {
    type Draft = NoteDraft;
    type Input = NewNote;
    type Record = Note;

    const KIND: EntityKind = EntityKind::Note;
    const ORDER: MergeOrder = MergeOrder::Prepend;

    fn draft(state: &AppState) -> &Self::Draft {
        &state.drafts.note
    }

    fn draft_mut(state: &mut AppState) -> &mut Self::Draft {
        &mut state.drafts.note
    }

    fn collection_mut(state: &mut AppState) -> &mut Vec<Self::Record> {
        &mut state.notes
    }

    fn validate(state: &AppState) -> Option<Self::Input> {
        let draft = &state.drafts.note;
        Some(NewNote {
            class_id: draft.class_id?,
            topic: draft.topic.trim().to_string(),
            detail: non_blank(&draft.detail)?,
            tag: draft.tag,
        })
    }

    fn insert(
        backend: &dyn AcademicBackend,
        input: Self::Input,
    ) -> BoxFuture<'_, Result<Self::Record, DataError>> {
        backend.add_note(input)
    }

    fn created(record: Self::Record) -> Created {
        Created::Note(record)
    }

    fn edited(draft: Self::Draft) -> DraftEdit {
        DraftEdit::Note(draft)
    }
}

impl CreateFlow for ActivityFlow {
    type Draft = ActivityDraft;
    type Input = NewActivity;
    type Record = Activity;

    const KIND: EntityKind = EntityKind::Activity;
    const ORDER: MergeOrder = MergeOrder::Prepend;

    fn draft(state: &AppState) -> &Self::Draft {
        &state.drafts.activity
    }

    fn draft_mut(state: &mut AppState) -> &mut Self::Draft {
        &mut state.drafts.activity
    }

    fn collection_mut(state: &mut AppState) -> &mut Vec<Self::Record> {
        &mut state.activities
    }

    fn validate(state: &AppState) -> Option<Self::Input> {
        let draft = &state.drafts.activity;
        Some(NewActivity {
            class_id: draft.class_id?,
            title: non_blank(&draft.title)?,
            due_date: non_blank(&draft.due_date),
            status: draft.status,
        })
    }

    fn insert(
        backend: &dyn AcademicBackend,
        input: Self::Input,
    ) -> BoxFuture<'_, Result<Self::Record, DataError>> {
        backend.add_activity(input)
    }

    fn created(record: Self::Record) -> Created {
        Created::Activity(record)
    }

    fn edited(draft: Self::Draft) -> DraftEdit {
        DraftEdit::Activity(draft)
    }
}

impl CreateFlow for AgendaFlow {
    type Draft = AgendaDraft;
    type Input = NewAgendaItem;
    type Record = AgendaItem;

    const KIND: EntityKind = EntityKind::AgendaItem;
    const ORDER: MergeOrder = MergeOrder::Append;

    fn draft(state: &AppState) -> &Self::Draft {
        &state.drafts.agenda
    }

    fn draft_mut(state: &mut AppState) -> &mut Self::Draft {
        &mut state.drafts.agenda
    }

    fn collection_mut(state: &mut AppState) -> &mut Vec<Self::Record> {
        &mut state.agenda
    }

    // Class association is optional here, unlike every other child entity.
    fn validate(state: &AppState) -> Option<Self::Input> {
        let draft = &state.drafts.agenda;
        Some(NewAgendaItem {
            class_id: draft.class_id,
            kind: draft.kind,
            title: non_blank(&draft.title)?,
            date: non_blank(&draft.date)?,
            time: non_blank(&draft.time),
        })
    }

    fn insert(
        backend: &dyn AcademicBackend,
        input: Self::Input,
    ) -> BoxFuture<'_, Result<Self::Record, DataError>> {
        backend.add_agenda_item(input)
    }

    fn created(record: Self::Record) -> Created {
        Created::AgendaItem(record)
    }

    fn edited(draft: Self::Draft) -> DraftEdit {
        DraftEdit::Agenda(draft)
    }
}

impl CreateFlow for ExamFlow {
    type Draft = ExamDraft;
    type Input = NewExam;
    type Record = Exam;

    const KIND: EntityKind = EntityKind::Exam;
    const ORDER: MergeOrder = MergeOrder::Prepend;

    fn draft(state: &AppState) -> &Self::Draft {
        &state.drafts.exam
    }

    fn draft_mut(state: &mut AppState) -> &mut Self::Draft {
        &mut state.drafts.exam
    }

    fn collection_mut(state: &mut AppState) -> &mut Vec<Self::Record> {
        &mut state.exams
    }

    fn validate(state: &AppState) -> Option<Self::Input> {
        let draft = &state.drafts.exam;
        Some(NewExam {
            class_id: draft.class_id?,
            exam: non_blank(&draft.exam)?,
            grade: parse_number(&draft.grade, 0.0),
            max: parse_number(&draft.max, DEFAULT_EXAM_MAX),
        })
    }

    fn insert(
        backend: &dyn AcademicBackend,
        input: Self::Input,
    ) -> BoxFuture<'_, Result<Self::Record, DataError>> {
        backend.add_exam(input)
    }

    fn created(record: Self::Record) -> Created {
        Created::Exam(record)
    }

    fn edited(draft: Self::Draft) -> DraftEdit {
        DraftEdit::Exam(draft)
    }
}

impl CreateFlow for AttendanceFlow {
    type Draft = AttendanceDraft;
    type Input = NewAttendance;
    type Record = Attendance;

    const KIND: EntityKind = EntityKind::Attendance;
    const ORDER: MergeOrder = MergeOrder::Prepend;

    fn draft(state: &AppState) -> &Self::Draft {
        &state.drafts.attendance
    }

    fn draft_mut(state: &mut AppState) -> &mut Self::Draft {
        &mut state.drafts.attendance
    }

    fn collection_mut(state: &mut AppState) -> &mut Vec<Self::Record> {
        &mut state.attendance
    }

    fn validate(state: &AppState) -> Option<Self::Input> {
        let draft = &state.drafts.attendance;
        Some(NewAttendance {
            class_id: draft.class_id?,
            date: non_blank(&draft.date)?,
            status: draft.status,
        })
    }

    fn insert(
        backend: &dyn AcademicBackend,
        input: Self::Input,
    ) -> BoxFuture<'_, Result<Self::Record, DataError>> {
        backend.add_attendance(input)
    }

    fn created(record: Self::Record) -> Created {
        Created::Attendance(record)
    }

    fn edited(draft: Self::Draft) -> DraftEdit {
        DraftEdit::Attendance(draft)
    }
}
