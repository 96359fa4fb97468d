//! Course and class records as they appear in the output document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Classes of a course keyed by class id, in the order the site listed them.
pub type ClassMap = IndexMap<String, Class>;

/// One time slot block of a class: a weekday and the consecutive slots it takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 0 is Monday.
    pub weekday: u8,
    pub slots: Vec<String>,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub labels: Vec<String>,
    pub capacity: Option<u32>,
    pub enrolled: Option<u32>,
    pub special: Option<u32>,
    pub waiting: Option<u32>,
    pub schedule: Vec<ScheduleEntry>,
    pub professors: Vec<String>,
}

/// The course-level columns repeated on every row of that course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
    pub name: String,
    pub class_hours: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub class_hours: Option<u32>,
    pub classes: ClassMap,
}

/// A single parsed result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offering {
    pub course_id: String,
    pub course: CourseFields,
    pub class_id: String,
    pub class: Class,
}
