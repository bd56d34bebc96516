use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of a department's course listing, observed in a given academic year.
///
/// Identity is `(code, department_id)`; the same code can appear under several
/// departments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub code: String,
    pub department_id: i64,
    pub name: String,
    pub credit: f64,
    pub ects: f64,
    pub is_mandatory: bool,
    pub theory: i32,
    pub practice: i32,
    pub lab: i32,
    pub semester: String,
    pub link_id: String,
    pub unit_id: String,
    pub year: i32,
    pub is_removed: bool,
}

impl Course {
    /// Both link identifiers are needed to request the syllabus page.
    pub fn has_syllabus_link(&self) -> bool {
        !self.link_id.is_empty() && !self.unit_id.is_empty()
    }
}

/// Syllabus ("izlence") data, keyed by course code alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseDetail {
    pub code: String,
    pub name: String,
    pub instructor: String,
    pub language: String,
    pub aim: String,
    pub content: String,
    pub resources: String,
    pub outcomes: Vec<String>,
}

impl CourseDetail {
    /// A detail is only worth storing when it carries an aim, a content
    /// section or at least one learning outcome.
    pub fn is_valid(&self) -> bool {
        !self.aim.is_empty() || !self.content.is_empty() || !self.outcomes.is_empty()
    }
}

/// Course row joined with its syllabus, as served by the query API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetailResponse {
    pub base_info: Course,
    /// Course name as printed on the syllabus page.
    pub syllabus_name: String,
    pub instructor: String,
    pub language: String,
    pub aim: String,
    pub content: String,
    pub resources: String,
    pub outcomes: Vec<String>,
}

impl CourseDetailResponse {
    pub fn new(base_info: Course, detail: CourseDetail) -> Self {
        Self {
            base_info,
            syllabus_name: detail.name,
            instructor: detail.instructor,
            language: detail.language,
            aim: detail.aim,
            content: detail.content,
            resources: detail.resources,
            outcomes: detail.outcomes,
        }
    }
}
