use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DataError;

/// Closed set of values persisted as kebab-case text.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DataError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(DataError::Backend(format!(
                        "unexpected {} value `{other}`",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

text_enum! {
    NoteTag {
        Comment => "comment",
        Question => "question",
        Review => "review",
    }
}

text_enum! {
    ActivityStatus {
        Planned => "planned",
        InProgress => "in-progress",
        Done => "done",
    }
}

text_enum! {
    /// Kind of agenda entry, stored in the `type` column.
    AgendaKind {
        ClassSession => "class-session",
        Exam => "exam",
        Submission => "submission",
        Study => "study",
    }
}

text_enum! {
    AttendanceStatus {
        Present => "present",
        Absent => "absent",
        Excused => "excused",
    }
}

impl Default for NoteTag {
    fn default() -> Self {
        Self::Comment
    }
}

impl Default for ActivityStatus {
    fn default() -> Self {
        Self::Planned
    }
}

impl Default for AgendaKind {
    fn default() -> Self {
        Self::ClassSession
    }
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        Self::Present
    }
}

/// The seven persisted record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Semester,
    Class,
    Note,
    Activity,
    AgendaItem,
    Exam,
    Attendance,
}

impl EntityKind {
    /// Backend table holding rows of this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::Semester => "semesters",
            Self::Class => "classes",
            Self::Note => "notes",
            Self::Activity => "activities",
            Self::AgendaItem => "agenda_items",
            Self::Exam => "exams",
            Self::Attendance => "attendance",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Semester => "semester",
            Self::Class => "class",
            Self::Note => "note",
            Self::Activity => "activity",
            Self::AgendaItem => "agenda item",
            Self::Exam => "exam",
            Self::Attendance => "attendance",
        };
        f.write_str(label)
    }
}

/// Parent class fields joined into child records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassRef {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Semester {
    pub id: Uuid,
    pub name: String,
    pub focus: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub id: Uuid,
    pub semester_id: Uuid,
    pub title: String,
    pub teacher: String,
    /// Day and time, e.g. `Mon 08:00`.
    pub schedule: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub id: Uuid,
    pub topic: String,
    pub detail: String,
    pub tag: NoteTag,
    pub created_at: DateTime<Utc>,
    pub class: Option<ClassRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub status: ActivityStatus,
    pub created_at: DateTime<Utc>,
    pub class: Option<ClassRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgendaItem {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AgendaKind,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub class: Option<ClassRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exam {
    pub id: Uuid,
    /// Assessment label, e.g. `Midterm`.
    pub exam: String,
    pub grade: Option<f64>,
    pub max: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub class: Option<ClassRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attendance {
    pub id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    pub class: Option<ClassRef>,
}

/// Validated insert payloads, one per entity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSemester {
    pub name: String,
    pub focus: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClass {
    pub semester_id: Uuid,
    pub title: String,
    pub teacher: String,
    pub schedule: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub class_id: Uuid,
    pub topic: String,
    pub detail: String,
    pub tag: NoteTag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub class_id: Uuid,
    pub title: String,
    /// `YYYY-MM-DD`, parsed by the backend.
    pub due_date: Option<String>,
    pub status: ActivityStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAgendaItem {
    pub class_id: Option<Uuid>,
    pub kind: AgendaKind,
    pub title: String,
    pub date: String,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExam {
    pub class_id: Uuid,
    pub exam: String,
    pub grade: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub class_id: Uuid,
    pub date: String,
    pub status: AttendanceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_text_matches_storage_format() {
        assert_eq!(ActivityStatus::InProgress.as_str(), "in-progress");
        assert_eq!(AgendaKind::ClassSession.to_string(), "class-session");
        assert_eq!(
            "excused".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Excused
        );
        for tag in [NoteTag::Comment, NoteTag::Question, NoteTag::Review] {
            assert_eq!(tag.as_str().parse::<NoteTag>().unwrap(), tag);
        }
    }

    #[test]
    fn unknown_text_is_a_backend_error() {
        let err = "Presenca".parse::<AttendanceStatus>().unwrap_err();
        assert!(matches!(err, DataError::Backend(_)));
        assert!(err.to_string().contains("Presenca"));
    }

    #[test]
    fn defaults_match_fresh_drafts() {
        assert_eq!(NoteTag::default(), NoteTag::Comment);
        assert_eq!(ActivityStatus::default(), ActivityStatus::Planned);
        assert_eq!(AgendaKind::default(), AgendaKind::ClassSession);
        assert_eq!(AttendanceStatus::default(), AttendanceStatus::Present);
    }

    #[test]
    fn agenda_kind_serializes_under_type_key() {
        let item = AgendaItem {
            id: Uuid::new_v4(),
            kind: AgendaKind::Exam,
            title: "Calculus midterm".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
            time: None,
            created_at: Utc::now(),
            class: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "exam");
    }
}
