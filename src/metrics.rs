use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Attendance, AttendanceStatus, Class, Exam};

/// Percentage of `present` records, rounded to the nearest integer. Empty is 0.
pub fn attendance_rate(records: &[Attendance]) -> u32 {
    if records.is_empty() {
        return 0;
    }

    let present = records
        .iter()
        .filter(|record| record.status == AttendanceStatus::Present)
        .count();

    ((present as f64 / records.len() as f64) * 100.0).round() as u32
}

/// Mean grade with one decimal place. Missing grades count as 0; empty is 0.
pub fn average_grade(exams: &[Exam]) -> f64 {
    if exams.is_empty() {
        return 0.0;
    }

    let sum: f64 = exams
        .iter()
        .map(|exam| exam.grade.filter(|grade| grade.is_finite()).unwrap_or(0.0))
        .sum();

    round_one_decimal(sum / exams.len() as f64)
}

/// Half-way cases round away from zero on the scaled binary value, so a mean
/// stored as 0.1499... still lands on 0.2.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Groups classes by semester, keeping collection order inside each group.
pub fn classes_by_semester(classes: &[Class]) -> HashMap<Uuid, Vec<&Class>> {
    let mut groups: HashMap<Uuid, Vec<&Class>> = HashMap::new();
    for class in classes {
        groups.entry(class.semester_id).or_default().push(class);
    }
    groups
}

pub fn active_semester_classes(classes: &[Class], selected: Option<Uuid>) -> Vec<&Class> {
    let Some(selected) = selected else {
        return Vec::new();
    };

    classes_by_semester(classes)
        .remove(&selected)
        .unwrap_or_default()
}

/// Headline numbers shown at the top of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub active_semester: Option<String>,
    pub class_count: usize,
    pub activity_count: usize,
    pub attendance_rate: u32,
    pub average_grade: f64,
}
