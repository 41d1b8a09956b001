use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::backend::AcademicBackend;
use crate::error::DataError;
use crate::models::{
    Activity, ActivityStatus, AgendaItem, AgendaKind, Attendance, AttendanceStatus, Class,
    ClassRef, EntityKind, Exam, NewActivity, NewAgendaItem, NewAttendance, NewClass, NewExam,
    NewNote, NewSemester, Note, NoteTag, Semester,
};

pub(crate) fn semester(name: &str) -> Semester {
    Semester {
        id: Uuid::new_v4(),
        name: name.to_string(),
        focus: String::new(),
        created_at: Utc::now(),
    }
}

pub(crate) fn class(semester_id: Uuid, title: &str) -> Class {
    Class {
        id: Uuid::new_v4(),
        semester_id,
        title: title.to_string(),
        teacher: "Dr. Ramos".to_string(),
        schedule: "Mon 08:00".to_string(),
        created_at: Utc::now(),
    }
}

fn class_ref(class: &Class) -> Option<ClassRef> {
    Some(ClassRef {
        id: class.id,
        title: class.title.clone(),
    })
}

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

pub(crate) fn note(class: &Class, detail: &str) -> Note {
    Note {
        id: Uuid::new_v4(),
        topic: String::new(),
        detail: detail.to_string(),
        tag: NoteTag::Comment,
        created_at: Utc::now(),
        class: class_ref(class),
    }
}

pub(crate) fn activity(class: &Class, title: &str) -> Activity {
    Activity {
        id: Uuid::new_v4(),
        title: title.to_string(),
        due_date: None,
        status: ActivityStatus::Planned,
        created_at: Utc::now(),
        class: class_ref(class),
    }
}

pub(crate) fn agenda_item(title: &str, date: &str) -> AgendaItem {
    AgendaItem {
        id: Uuid::new_v4(),
        kind: AgendaKind::Study,
        title: title.to_string(),
        date: day(date),
        time: None,
        created_at: Utc::now(),
        class: None,
    }
}

pub(crate) fn exam(class: &Class, label: &str, grade: f64) -> Exam {
    Exam {
        id: Uuid::new_v4(),
        exam: label.to_string(),
        grade: Some(grade),
        max: Some(10.0),
        created_at: Utc::now(),
        class: class_ref(class),
    }
}

pub(crate) fn attendance(class: &Class, date: &str, status: AttendanceStatus) -> Attendance {
    Attendance {
        id: Uuid::new_v4(),
        date: day(date),
        status,
        created_at: Utc::now(),
        class: class_ref(class),
    }
}

/// In-memory backend with canned rows and injectable failures.
#[derive(Default)]
pub(crate) struct FakeBackend {
    configured: bool,
    semesters: Vec<Semester>,
    classes: Vec<Class>,
    notes: Vec<Note>,
    activities: Vec<Activity>,
    agenda: Vec<AgendaItem>,
    exams: Vec<Exam>,
    attendance: Vec<Attendance>,
    failing_fetch: Option<(EntityKind, String)>,
    rejecting_inserts: Option<String>,
    fetches: Arc<AtomicUsize>,
    inserts: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub(crate) fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub(crate) fn unconfigured() -> Self {
        Self::default()
    }

    pub(crate) fn with_semesters(mut self, semesters: Vec<Semester>) -> Self {
        self.semesters = semesters;
        self
    }

    pub(crate) fn with_classes(mut self, classes: Vec<Class>) -> Self {
        self.classes = classes;
        self
    }

    pub(crate) fn with_notes(mut self, notes: Vec<Note>) -> Self {
        self.notes = notes;
        self
    }

    pub(crate) fn with_activities(mut self, activities: Vec<Activity>) -> Self {
        self.activities = activities;
        self
    }

    pub(crate) fn with_agenda(mut self, agenda: Vec<AgendaItem>) -> Self {
        self.agenda = agenda;
        self
    }

    pub(crate) fn with_exams(mut self, exams: Vec<Exam>) -> Self {
        self.exams = exams;
        self
    }

    pub(crate) fn with_attendance(mut self, attendance: Vec<Attendance>) -> Self {
        self.attendance = attendance;
        self
    }

    pub(crate) fn failing_fetch(mut self, kind: EntityKind, message: &str) -> Self {
        self.failing_fetch = Some((kind, message.to_string()));
        self
    }

    pub(crate) fn rejecting_inserts(mut self, message: &str) -> Self {
        self.rejecting_inserts = Some(message.to_string());
        self
    }

    pub(crate) fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }

    /// Counts insert attempts, including rejected ones.
    pub(crate) fn insert_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.inserts)
    }

    fn fetch<T: Clone>(&self, kind: EntityKind, rows: &[T]) -> Result<Vec<T>, DataError> {
        if !self.configured {
            return Err(DataError::not_configured());
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.failing_fetch {
            Some((failing, message)) if *failing == kind => Err(DataError::Backend(message.clone())),
            _ => Ok(rows.to_vec()),
        }
    }

    fn accept_insert(&self) -> Result<(), DataError> {
        if !self.configured {
            return Err(DataError::not_configured());
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        match &self.rejecting_inserts {
            Some(message) => Err(DataError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn class_ref(&self, id: Option<Uuid>) -> Option<ClassRef> {
        let id = id?;
        let title = self
            .classes
            .iter()
            .find(|class| class.id == id)
            .map(|class| class.title.clone())
            .unwrap_or_default();
        Some(ClassRef { id, title })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| DataError::Backend(format!("invalid input syntax for type date: \"{value}\"")))
}

fn parse_time(value: Option<&str>) -> Result<Option<NaiveTime>, DataError> {
    value
        .map(|raw| {
            NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| {
                DataError::Backend(format!("invalid input syntax for type time: \"{raw}\""))
            })
        })
        .transpose()
}

#[async_trait]
impl AcademicBackend for FakeBackend {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_semesters(&self) -> Result<Vec<Semester>, DataError> {
        self.fetch(EntityKind::Semester, &self.semesters)
    }

    async fn fetch_classes(&self) -> Result<Vec<Class>, DataError> {
        self.fetch(EntityKind::Class, &self.classes)
    }

    async fn fetch_notes(&self) -> Result<Vec<Note>, DataError> {
        self.fetch(EntityKind::Note, &self.notes)
    }

    async fn fetch_activities(&self) -> Result<Vec<Activity>, DataError> {
        self.fetch(EntityKind::Activity, &self.activities)
    }

    async fn fetch_agenda_items(&self) -> Result<Vec<AgendaItem>, DataError> {
        self.fetch(EntityKind::AgendaItem, &self.agenda)
    }

    async fn fetch_exams(&self) -> Result<Vec<Exam>, DataError> {
        self.fetch(EntityKind::Exam, &self.exams)
    }

    async fn fetch_attendance(&self) -> Result<Vec<Attendance>, DataError> {
        self.fetch(EntityKind::Attendance, &self.attendance)
    }

    async fn add_semester(&self, input: NewSemester) -> Result<Semester, DataError> {
        self.accept_insert()?;
        Ok(Semester {
            id: Uuid::new_v4(),
            name: input.name,
            focus: input.focus,
            created_at: Utc::now(),
        })
    }

    async fn add_class(&self, input: NewClass) -> Result<Class, DataError> {
        self.accept_insert()?;
        Ok(Class {
            id: Uuid::new_v4(),
            semester_id: input.semester_id,
            title: input.title,
            teacher: input.teacher,
            schedule: input.schedule,
            created_at: Utc::now(),
        })
    }

    async fn add_note(&self, input: NewNote) -> Result<Note, DataError> {
        self.accept_insert()?;
        Ok(Note {
            id: Uuid::new_v4(),
            topic: input.topic,
            detail: input.detail,
            tag: input.tag,
            created_at: Utc::now(),
            class: self.class_ref(Some(input.class_id)),
        })
    }

    async fn add_activity(&self, input: NewActivity) -> Result<Activity, DataError> {
        self.accept_insert()?;
        Ok(Activity {
            id: Uuid::new_v4(),
            title: input.title,
            due_date: input.due_date.as_deref().map(parse_date).transpose()?,
            status: input.status,
            created_at: Utc::now(),
            class: self.class_ref(Some(input.class_id)),
        })
    }

    async fn add_agenda_item(&self, input: NewAgendaItem) -> Result<AgendaItem, DataError> {
        self.accept_insert()?;
        Ok(AgendaItem {
            id: Uuid::new_v4(),
            kind: input.kind,
            title: input.title,
            date: parse_date(&input.date)?,
            time: parse_time(input.time.as_deref())?,
            created_at: Utc::now(),
            class: self.class_ref(input.class_id),
        })
    }

    async fn add_exam(&self, input: NewExam) -> Result<Exam, DataError> {
        self.accept_insert()?;
        Ok(Exam {
            id: Uuid::new_v4(),
            exam: input.exam,
            grade: Some(input.grade),
            max: Some(input.max),
            created_at: Utc::now(),
            class: self.class_ref(Some(input.class_id)),
        })
    }

    async fn add_attendance(&self, input: NewAttendance) -> Result<Attendance, DataError> {
        self.accept_insert()?;
        Ok(Attendance {
            id: Uuid::new_v4(),
            date: parse_date(&input.date)?,
            status: input.status,
            created_at: Utc::now(),
            class: self.class_ref(Some(input.class_id)),
        })
    }
}
