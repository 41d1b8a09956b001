use async_trait::async_trait;

use crate::error::DataError;
use crate::models::{
    Activity, AgendaItem, Attendance, Class, Exam, NewActivity, NewAgendaItem, NewAttendance,
    NewClass, NewExam, NewNote, NewSemester, Note, Semester,
};

/// Fetch/add pair per entity against the remote tables.
///
/// Implementations hold no collection state between calls. Every method is a
/// single round trip and fails with [`DataError::Configuration`] before any I/O
/// when [`AcademicBackend::is_configured`] is false.
#[async_trait]
pub trait AcademicBackend: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn fetch_semesters(&self) -> Result<Vec<Semester>, DataError>;
    async fn fetch_classes(&self) -> Result<Vec<Class>, DataError>;
    async fn fetch_notes(&self) -> Result<Vec<Note>, DataError>;
    async fn fetch_activities(&self) -> Result<Vec<Activity>, DataError>;
    async fn fetch_agenda_items(&self) -> Result<Vec<AgendaItem>, DataError>;
    async fn fetch_exams(&self) -> Result<Vec<Exam>, DataError>;
    async fn fetch_attendance(&self) -> Result<Vec<Attendance>, DataError>;

    async fn add_semester(&self, input: NewSemester) -> Result<Semester, DataError>;
    async fn add_class(&self, input: NewClass) -> Result<Class, DataError>;
    async fn add_note(&self, input: NewNote) -> Result<Note, DataError>;
    async fn add_activity(&self, input: NewActivity) -> Result<Activity, DataError>;
    async fn add_agenda_item(&self, input: NewAgendaItem) -> Result<AgendaItem, DataError>;
    async fn add_exam(&self, input: NewExam) -> Result<Exam, DataError>;
    async fn add_attendance(&self, input: NewAttendance) -> Result<Attendance, DataError>;
}
