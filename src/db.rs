use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::backend::AcademicBackend;
use crate::config::AppConfig;
use crate::error::DataError;
use crate::models::{
    Activity, AgendaItem, Attendance, Class, ClassRef, Exam, NewActivity, NewAgendaItem,
    NewAttendance, NewClass, NewExam, NewNote, NewSemester, Note, Semester,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed data access. Holds no pool when credentials are absent.
pub struct PgBackend {
    pool: Option<PgPool>,
}

impl PgBackend {
    /// Builds a lazy pool; no connection is opened until the first request.
    pub fn connect(config: &AppConfig) -> Result<Self, DataError> {
        if !config.has_backend() {
            debug!("DATABASE_URL not set; backend disabled");
        }
        let pool = match &config.database_url {
            Some(url) => Some(
                PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect_lazy(url)
                    .map_err(|err| {
                        DataError::Configuration(format!("invalid DATABASE_URL: {err}"))
                    })?,
            ),
            None => None,
        };

        Ok(Self { pool })
    }

    pub fn pool(&self) -> Result<&PgPool, DataError> {
        self.pool.as_ref().ok_or_else(DataError::not_configured)
    }
}

#[async_trait]
impl AcademicBackend for PgBackend {
    fn is_configured(&self) -> bool {
        self.pool.is_some()
    }

    async fn fetch_semesters(&self) -> Result<Vec<Semester>, DataError> {
        fetch_semesters(self.pool()?).await
    }

    async fn fetch_classes(&self) -> Result<Vec<Class>, DataError> {
        fetch_classes(self.pool()?).await
    }

    async fn fetch_notes(&self) -> Result<Vec<Note>, DataError> {
        fetch_notes(self.pool()?).await
    }

    async fn fetch_activities(&self) -> Result<Vec<Activity>, DataError> {
        fetch_activities(self.pool()?).await
    }

    async fn fetch_agenda_items(&self) -> Result<Vec<AgendaItem>, DataError> {
        fetch_agenda_items(self.pool()?).await
    }

    async fn fetch_exams(&self) -> Result<Vec<Exam>, DataError> {
        fetch_exams(self.pool()?).await
    }

    async fn fetch_attendance(&self) -> Result<Vec<Attendance>, DataError> {
        fetch_attendance(self.pool()?).await
    }

    async fn add_semester(&self, input: NewSemester) -> Result<Semester, DataError> {
        add_semester(self.pool()?, &input).await
    }

    async fn add_class(&self, input: NewClass) -> Result<Class, DataError> {
        add_class(self.pool()?, &input).await
    }

    async fn add_note(&self, input: NewNote) -> Result<Note, DataError> {
        add_note(self.pool()?, &input).await
    }

    async fn add_activity(&self, input: NewActivity) -> Result<Activity, DataError> {
        add_activity(self.pool()?, &input).await
    }

    async fn add_agenda_item(&self, input: NewAgendaItem) -> Result<AgendaItem, DataError> {
        add_agenda_item(self.pool()?, &input).await
    }

    async fn add_exam(&self, input: NewExam) -> Result<Exam, DataError> {
        add_exam(self.pool()?, &input).await
    }

    async fn add_attendance(&self, input: NewAttendance) -> Result<Attendance, DataError> {
        add_attendance(self.pool()?, &input).await
    }
}

fn parse_text<T>(row: &PgRow, column: &str) -> Result<T, DataError>
where
    T: FromStr<Err = DataError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
}

fn class_ref(row: &PgRow) -> Result<Option<ClassRef>, DataError> {
    let id: Option<Uuid> = row.try_get("class_id")?;
    let title: Option<String> = row.try_get("class_title")?;
    Ok(id.map(|id| ClassRef {
        id,
        title: title.unwrap_or_default(),
    }))
}

fn semester_from_row(row: &PgRow) -> Result<Semester, DataError> {
    Ok(Semester {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        focus: row.try_get("focus")?,
        created_at: row.try_get("created_at")?,
    })
}

fn class_from_row(row: &PgRow) -> Result<Class, DataError> {
    Ok(Class {
        id: row.try_get("id")?,
        semester_id: row.try_get("semester_id")?,
        title: row.try_get("title")?,
        teacher: row.try_get("teacher")?,
        schedule: row.try_get("schedule")?,
        created_at: row.try_get("created_at")?,
    })
}

fn note_from_row(row: &PgRow) -> Result<Note, DataError> {
    Ok(Note {
        id: row.try_get("id")?,
        topic: row.try_get("topic")?,
        detail: row.try_get("detail")?,
        tag: parse_text(row, "tag")?,
        created_at: row.try_get("created_at")?,
        class: class_ref(row)?,
    })
}

fn activity_from_row(row: &PgRow) -> Result<Activity, DataError> {
    Ok(Activity {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        due_date: row.try_get("due_date")?,
        status: parse_text(row, "status")?,
        created_at: row.try_get("created_at")?,
        class: class_ref(row)?,
    })
}

fn agenda_item_from_row(row: &PgRow) -> Result<AgendaItem, DataError> {
    Ok(AgendaItem {
        id: row.try_get("id")?,
        kind: parse_text(row, "type")?,
        title: row.try_get("title")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        created_at: row.try_get("created_at")?,
        class: class_ref(row)?,
    })
}

fn exam_from_row(row: &PgRow) -> Result<Exam, DataError> {
    Ok(Exam {
        id: row.try_get("id")?,
        exam: row.try_get("exam")?,
        grade: row.try_get("grade")?,
        max: row.try_get("max")?,
        created_at: row.try_get("created_at")?,
        class: class_ref(row)?,
    })
}

fn attendance_from_row(row: &PgRow) -> Result<Attendance, DataError> {
    Ok(Attendance {
        id: row.try_get("id")?,
        date: row.try_get("date")?,
        status: parse_text(row, "status")?,
        created_at: row.try_get("created_at")?,
        class: class_ref(row)?,
    })
}

fn map_rows<T>(
    table: &str,
    rows: Vec<PgRow>,
    map: fn(&PgRow) -> Result<T, DataError>,
) -> Result<Vec<T>, DataError> {
    let records = rows.iter().map(map).collect::<Result<Vec<_>, _>>()?;
    debug!(table, rows = records.len(), "fetched rows");
    Ok(records)
}

pub async fn fetch_semesters(pool: &PgPool) -> Result<Vec<Semester>, DataError> {
    let rows = sqlx::query(
        "SELECT id, name, focus, created_at FROM semesters ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    map_rows("semesters", rows, semester_from_row)
}

pub async fn fetch_classes(pool: &PgPool) -> Result<Vec<Class>, DataError> {
    let rows = sqlx::query(
        "SELECT id, semester_id, title, teacher, schedule, created_at \
         FROM classes ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    map_rows("classes", rows, class_from_row)
}

pub async fn fetch_notes(pool: &PgPool) -> Result<Vec<Note>, DataError> {
    let rows = sqlx::query(
        r#"
        SELECT n.id, n.topic, n.detail, n.tag, n.created_at,
               c.id AS class_id, c.title AS class_title
        FROM notes n
        LEFT JOIN classes c ON c.id = n.class_id
        ORDER BY n.created_at DESC, n.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    map_rows("notes", rows, note_from_row)
}

pub async fn fetch_activities(pool: &PgPool) -> Result<Vec<Activity>, DataError> {
    let rows = sqlx::query(
        r#"
        SELECT a.id, a.title, a.due_date, a.status, a.created_at,
               c.id AS class_id, c.title AS class_title
        FROM activities a
        LEFT JOIN classes c ON c.id = a.class_id
        ORDER BY a.created_at DESC, a.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    map_rows("activities", rows, activity_from_row)
}

pub async fn fetch_agenda_items(pool: &PgPool) -> Result<Vec<AgendaItem>, DataError> {
    let rows = sqlx::query(
        r#"
        SELECT g.id, g."type", g.title, g.date, g.time, g.created_at,
               c.id AS class_id, c.title AS class_title
        FROM agenda_items g
        LEFT JOIN classes c ON c.id = g.class_id
        ORDER BY g.date ASC, g.created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    map_rows("agenda_items", rows, agenda_item_from_row)
}

pub async fn fetch_exams(pool: &PgPool) -> Result<Vec<Exam>, DataError> {
    let rows = sqlx::query(
        r#"
        SELECT e.id, e.exam, e.grade, e.max, e.created_at,
               c.id AS class_id, c.title AS class_title
        FROM exams e
        LEFT JOIN classes c ON c.id = e.class_id
        ORDER BY e.created_at DESC, e.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    map_rows("exams", rows, exam_from_row)
}

pub async fn fetch_attendance(pool: &PgPool) -> Result<Vec<Attendance>, DataError> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.date, t.status, t.created_at,
               c.id AS class_id, c.title AS class_title
        FROM attendance t
        LEFT JOIN classes c ON c.id = t.class_id
        ORDER BY t.created_at DESC, t.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    map_rows("attendance", rows, attendance_from_row)
}

pub async fn add_semester(pool: &PgPool, input: &NewSemester) -> Result<Semester, DataError> {
    let row = sqlx::query(
        r#"
        INSERT INTO semesters (name, focus)
        VALUES ($1, $2)
        RETURNING id, name, focus, created_at
        "#,
    )
    .bind(&input.name)
    .bind(&input.focus)
    .fetch_one(pool)
    .await?;

    debug!(table = "semesters", "inserted row");
    semester_from_row(&row)
}

pub async fn add_class(pool: &PgPool, input: &NewClass) -> Result<Class, DataError> {
    let row = sqlx::query(
        r#"
        INSERT INTO classes (semester_id, title, teacher, schedule)
        VALUES ($1, $2, $3, $4)
        RETURNING id, semester_id, title, teacher, schedule, created_at
        "#,
    )
    .bind(input.semester_id)
    .bind(&input.title)
    .bind(&input.teacher)
    .bind(&input.schedule)
    .fetch_one(pool)
    .await?;

    debug!(table = "classes", "inserted row");
    class_from_row(&row)
}

pub async fn add_note(pool: &PgPool, input: &NewNote) -> Result<Note, DataError> {
    let row = sqlx::query(
        r#"
        WITH inserted AS (
            INSERT INTO notes (class_id, topic, detail, tag)
            VALUES ($1, $2, $3, $4)
            RETURNING id, class_id, topic, detail, tag, created_at
        )
        SELECT i.id, i.topic, i.detail, i.tag, i.created_at,
               c.id AS class_id, c.title AS class_title
        FROM inserted i
        LEFT JOIN classes c ON c.id = i.class_id
        "#,
    )
    .bind(input.class_id)
    .bind(&input.topic)
    .bind(&input.detail)
    .bind(input.tag.as_str())
    .fetch_one(pool)
    .await?;

    debug!(table = "notes", "inserted row");
    note_from_row(&row)
}

pub async fn add_activity(pool: &PgPool, input: &NewActivity) -> Result<Activity, DataError> {
    let row = sqlx::query(
        r#"
        WITH inserted AS (
            INSERT INTO activities (class_id, title, due_date, status)
            VALUES ($1, $2, $3::date, $4)
            RETURNING id, class_id, title, due_date, status, created_at
        )
        SELECT i.id, i.title, i.due_date, i.status, i.created_at,
               c.id AS class_id, c.title AS class_title
        FROM inserted i
        LEFT JOIN classes c ON c.id = i.class_id
        "#,
    )
    .bind(input.class_id)
    .bind(&input.title)
    .bind(input.due_date.as_deref())
    .bind(input.status.as_str())
    .fetch_one(pool)
    .await?;

    debug!(table = "activities", "inserted row");
    activity_from_row(&row)
}

pub async fn add_agenda_item(
    pool: &PgPool,
    input: &NewAgendaItem,
) -> Result<AgendaItem, DataError> {
    let row = sqlx::query(
        r#"
        WITH inserted AS (
            INSERT INTO agenda_items (class_id, "type", title, date, time)
            VALUES ($1, $2, $3, $4::date, $5::time)
            RETURNING id, class_id, "type", title, date, time, created_at
        )
        SELECT i.id, i."type", i.title, i.date, i.time, i.created_at,
               c.id AS class_id, c.title AS class_title
        FROM inserted i
        LEFT JOIN classes c ON c.id = i.class_id
        "#,
    )
    .bind(input.class_id)
    .bind(input.kind.as_str())
    .bind(&input.title)
    .bind(&input.date)
    .bind(input.time.as_deref())
    .fetch_one(pool)
    .await?;

    debug!(table = "agenda_items", "inserted row");
    agenda_item_from_row(&row)
}

pub async fn add_exam(pool: &PgPool, input: &NewExam) -> Result<Exam, DataError> {
    let row = sqlx::query(
        r#"
        WITH inserted AS (
            INSERT INTO exams (class_id, exam, grade, max)
            VALUES ($1, $2, $3, $4)
            RETURNING id, class_id, exam, grade, max, created_at
        )
        SELECT i.id, i.exam, i.grade, i.max, i.created_at,
               c.id AS class_id, c.title AS class_title
        FROM inserted i
        LEFT JOIN classes c ON c.id = i.class_id
        "#,
    )
    .bind(input.class_id)
    .bind(&input.exam)
    .bind(input.grade)
    .bind(input.max)
    .fetch_one(pool)
    .await?;

    debug!(table = "exams", "inserted row");
    exam_from_row(&row)
}

pub async fn add_attendance(
    pool: &PgPool,
    input: &NewAttendance,
) -> Result<Attendance, DataError> {
    let row = sqlx::query(
        r#"
        WITH inserted AS (
            INSERT INTO attendance (class_id, date, status)
            VALUES ($1, $2::date, $3)
            RETURNING id, class_id, date, status, created_at
        )
        SELECT i.id, i.date, i.status, i.created_at,
               c.id AS class_id, c.title AS class_title
        FROM inserted i
        LEFT JOIN classes c ON c.id = i.class_id
        "#,
    )
    .bind(input.class_id)
    .bind(&input.date)
    .bind(input.status.as_str())
    .fetch_one(pool)
    .await?;

    debug!(table = "attendance", "inserted row");
    attendance_from_row(&row)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let semester_id = Uuid::parse_str("6f1c2a4e-8d0b-4c51-9a7e-2b3d4c5e6f70")?;
    sqlx::query(
        r#"
        INSERT INTO semesters (id, name, focus)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(semester_id)
    .bind("2026.1")
    .bind("Linear algebra and data structures")
    .execute(pool)
    .await?;

    let classes = vec![
        (
            Uuid::parse_str("a1b2c3d4-0001-4e5f-8a9b-0c1d2e3f4a01")?,
            "Linear Algebra",
            "Dr. Ramos",
            "Mon 08:00",
        ),
        (
            Uuid::parse_str("a1b2c3d4-0002-4e5f-8a9b-0c1d2e3f4a02")?,
            "Data Structures",
            "Prof. Okafor",
            "Wed 10:00",
        ),
    ];

    for (id, title, teacher, schedule) in classes.iter().copied() {
        sqlx::query(
            r#"
            INSERT INTO classes (id, semester_id, title, teacher, schedule)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(semester_id)
        .bind(title)
        .bind(teacher)
        .bind(schedule)
        .execute(pool)
        .await?;
    }

    let algebra = classes[0].0;
    let structures = classes[1].0;

    sqlx::query(
        r#"
        INSERT INTO notes (id, class_id, topic, detail, tag)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str("b2c3d4e5-0001-4f60-9b0c-1d2e3f4a5b01")?)
    .bind(algebra)
    .bind("Eigenvalues")
    .bind("Ask how the characteristic polynomial relates to the trace")
    .bind("question")
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO activities (id, class_id, title, due_date, status)
        VALUES ($1, $2, $3, $4::date, $5)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str("c3d4e5f6-0001-4071-8c1d-2e3f4a5b6c01")?)
    .bind(structures)
    .bind("Hash table assignment")
    .bind("2026-03-20")
    .bind("in-progress")
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO agenda_items (id, class_id, "type", title, date, time)
        VALUES ($1, $2, $3, $4::date, $5::time)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str("d4e5f6a7-0001-4182-9d2e-3f4a5b6c7d01")?)
    .bind(algebra)
    .bind("exam")
    .bind("Linear Algebra midterm")
    .bind("2026-04-08")
    .bind("08:00")
    .execute(pool)
    .await?;

    let exams = vec![
        ("e5f6a7b8-0001-4293-8e3f-4a5b6c7d8e01", algebra, "Quiz 1", 8.5),
        ("e5f6a7b8-0002-4293-8e3f-4a5b6c7d8e02", structures, "Lab 1", 9.0),
    ];

    for (id, class_id, exam, grade) in exams {
        sqlx::query(
            r#"
            INSERT INTO exams (id, class_id, exam, grade, max)
            VALUES ($1, $2, $3, $4, 10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(class_id)
        .bind(exam)
        .bind(grade)
        .execute(pool)
        .await?;
    }

    let attendance = vec![
        ("f6a7b8c9-0001-43a4-9f4a-5b6c7d8e9f01", algebra, "2026-03-02", "present"),
        ("f6a7b8c9-0002-43a4-9f4a-5b6c7d8e9f02", structures, "2026-03-04", "present"),
        ("f6a7b8c9-0003-43a4-9f4a-5b6c7d8e9f03", algebra, "2026-03-09", "absent"),
    ];

    for (id, class_id, date, status) in attendance {
        sqlx::query(
            r#"
            INSERT INTO attendance (id, class_id, date, status)
            VALUES ($1, $2, $3::date, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(class_id)
        .bind(date)
        .bind(status)
        .execute(pool)
        .await?;
    }

    Ok(())
}
