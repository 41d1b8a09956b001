use std::fmt::Write;

use crate::store::AppState;

const SECTION_LIMIT: usize = 10;

fn write_overflow(output: &mut String, total: usize) {
    if total > SECTION_LIMIT {
        let _ = writeln!(output, "- ... and {} more", total - SECTION_LIMIT);
    }
}

pub fn build_report(state: &AppState) -> String {
    let summary = state.summary();
    let groups = state.classes_by_semester();
    let mut output = String::new();

    let _ = writeln!(output, "# Academic Dashboard");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- Active semester: {}",
        summary.active_semester.as_deref().unwrap_or("-")
    );
    let _ = writeln!(output, "- Classes: {}", summary.class_count);
    let _ = writeln!(output, "- Activities: {}", summary.activity_count);
    let _ = writeln!(output, "- Attendance rate: {}%", summary.attendance_rate);
    let _ = writeln!(output, "- Average grade: {:.1}", summary.average_grade);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Semesters");
    if state.semesters.is_empty() {
        let _ = writeln!(output, "No semesters registered yet.");
    } else {
        for semester in &state.semesters {
            let count = groups.get(&semester.id).map_or(0, Vec::len);
            let focus = if semester.focus.is_empty() {
                "No focus set"
            } else {
                semester.focus.as_str()
            };
            let marker = if Some(semester.id) == state.selected_semester_id {
                " (active)"
            } else {
                ""
            };
            let _ = writeln!(
                output,
                "- {}{}: {} ({} classes)",
                semester.name, marker, focus, count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Classes This Semester");
    let active = state.active_semester_classes();
    if active.is_empty() {
        let _ = writeln!(output, "No classes for the active semester.");
    } else {
        for class in active {
            let _ = writeln!(
                output,
                "- {} with {} ({})",
                class.title, class.teacher, class.schedule
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Notes");
    if state.notes.is_empty() {
        let _ = writeln!(output, "No notes recorded.");
    } else {
        for note in state.notes.iter().take(SECTION_LIMIT) {
            let topic = if note.topic.is_empty() {
                "Note"
            } else {
                note.topic.as_str()
            };
            let _ = writeln!(output, "- [{}] {}: {}", note.tag, topic, note.detail);
        }
        write_overflow(&mut output, state.notes.len());
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Activities");
    if state.activities.is_empty() {
        let _ = writeln!(output, "No activities recorded.");
    } else {
        for activity in state.activities.iter().take(SECTION_LIMIT) {
            let class = activity
                .class
                .as_ref()
                .map_or("No class", |class| class.title.as_str());
            let due = activity
                .due_date
                .map(|date| format!(", due {date}"))
                .unwrap_or_default();
            let _ = writeln!(
                output,
                "- {} ({}{}): {}",
                activity.title, class, due, activity.status
            );
        }
        write_overflow(&mut output, state.activities.len());
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Agenda");
    if state.agenda.is_empty() {
        let _ = writeln!(output, "Nothing scheduled.");
    } else {
        for item in state.agenda.iter().take(SECTION_LIMIT) {
            let mut line = format!("- {} [{}] {}", item.date, item.kind, item.title);
            if let Some(time) = item.time {
                let _ = write!(line, " at {}", time.format("%H:%M"));
            }
            if let Some(class) = &item.class {
                let _ = write!(line, " - {}", class.title);
            }
            let _ = writeln!(output, "{line}");
        }
        write_overflow(&mut output, state.agenda.len());
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Exams");
    if state.exams.is_empty() {
        let _ = writeln!(output, "No grades recorded.");
    } else {
        for exam in state.exams.iter().take(SECTION_LIMIT) {
            let class = exam
                .class
                .as_ref()
                .map_or("No class", |class| class.title.as_str());
            let _ = writeln!(
                output,
                "- {}: {} {}/{}",
                class,
                exam.exam,
                exam.grade.unwrap_or(0.0),
                exam.max.unwrap_or(10.0)
            );
        }
        write_overflow(&mut output, state.exams.len());
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");
    if state.attendance.is_empty() {
        let _ = writeln!(output, "No attendance recorded.");
    } else {
        for record in state.attendance.iter().take(SECTION_LIMIT) {
            let class = record
                .class
                .as_ref()
                .map_or("No class", |class| class.title.as_str());
            let _ = writeln!(output, "- {} on {}: {}", class, record.date, record.status);
        }
        write_overflow(&mut output, state.attendance.len());
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, ActivityStatus, AttendanceStatus, ClassRef};
    use crate::test_support::{attendance, class, note, semester};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn empty_dashboard_renders_placeholders() {
        let report = build_report(&AppState::default());
        assert!(report.contains("- Active semester: -"));
        assert!(report.contains("- Attendance rate: 0%"));
        assert!(report.contains("- Average grade: 0.0"));
        assert!(report.contains("No semesters registered yet."));
        assert!(report.contains("Nothing scheduled."));
    }

    #[test]
    fn lists_active_semester_and_its_classes() {
        let first = semester("2026.1");
        let other = semester("2025.2");
        let algebra = class(first.id, "Algebra");
        let history = class(other.id, "History");
        let state = AppState {
            selected_semester_id: Some(first.id),
            semesters: vec![first.clone(), other],
            classes: vec![algebra.clone(), history],
            activities: vec![Activity {
                id: Uuid::new_v4(),
                title: "Problem set 3".to_string(),
                due_date: None,
                status: ActivityStatus::Done,
                created_at: Utc::now(),
                class: Some(ClassRef {
                    id: algebra.id,
                    title: algebra.title.clone(),
                }),
            }],
            ..AppState::default()
        };

        let report = build_report(&state);
        assert!(report.contains("- Active semester: 2026.1"));
        assert!(report.contains("- 2026.1 (active): No focus set (1 classes)"));
        assert!(report.contains("- Algebra with Dr. Ramos (Mon 08:00)"));
        assert!(!report.contains("- History with"));
        assert!(report.contains("- Problem set 3 (Algebra): done"));
    }

    #[test]
    fn long_sections_note_the_hidden_entries() {
        let first = semester("2026.1");
        let algebra = class(first.id, "Algebra");
        let state = AppState {
            notes: (0..12)
                .map(|n| note(&algebra, &format!("point {n}")))
                .collect(),
            attendance: vec![attendance(&algebra, "2026-03-02", AttendanceStatus::Present)],
            ..AppState::default()
        };

        let report = build_report(&state);
        assert!(report.contains("- [comment] Note: point 9"));
        assert!(!report.contains("point 10"));
        assert!(report.contains("- ... and 2 more"));
        assert_eq!(report.matches("more").count(), 1);
    }
}
