//! The crawl result: semester → campus → course → class.
//!
//! Every level upserts. A course's own fields are overwritten by the last row
//! that mentions it, a class is replaced as a whole, and map positions are
//! fixed by first insertion, so merging the same rows again is a no-op.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cagr::models::{Campus, Class, ClassMap, Course, CourseFields, Offering, Semester};

/// Courses of one (semester, campus) pair keyed by course id, in site order.
pub type CourseMap = IndexMap<String, Course>;

/// The slice of the result owned by a single pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition {
    courses: CourseMap,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one class and the fields of the course it belongs to.
    pub fn merge(
        &mut self,
        course_id: String,
        fields: CourseFields,
        class_id: String,
        class: Class,
    ) {
        let course = self
            .courses
            .entry(course_id)
            .or_insert_with(|| Course {
                name: String::new(),
                class_hours: None,
                classes: ClassMap::new(),
            });
        course.name = fields.name;
        course.class_hours = fields.class_hours;
        course.classes.insert(class_id, class);
    }

    pub fn merge_offering(&mut self, offering: Offering) {
        self.merge(
            offering.course_id,
            offering.course,
            offering.class_id,
            offering.class,
        );
    }

    /// Merge a parsed page in row order. Returns the number of rows merged.
    pub fn merge_page(&mut self, offerings: impl IntoIterator<Item = Offering>) -> usize {
        let mut rows = 0;
        for offering in offerings {
            self.merge_offering(offering);
            rows += 1;
        }
        rows
    }

    /// Upsert every course and class of `other` into this partition.
    pub fn absorb(&mut self, other: Partition) {
        for (course_id, incoming) in other.courses {
            match self.courses.get_mut(&course_id) {
                Some(course) => {
                    course.name = incoming.name;
                    course.class_hours = incoming.class_hours;
                    course.classes.extend(incoming.classes);
                }
                None => {
                    self.courses.insert(course_id, incoming);
                }
            }
        }
    }

    pub fn courses(&self) -> &CourseMap {
        &self.courses
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.get(course_id)
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn class_count(&self) -> usize {
        self.courses.values().map(|course| course.classes.len()).sum()
    }
}

/// The full output document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offerings(BTreeMap<Semester, BTreeMap<Campus, Partition>>);

impl Offerings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pipeline's partition. Partitions for distinct keys commute; a
    /// repeated key is upserted into the existing partition.
    pub fn insert_partition(&mut self, semester: Semester, campus: Campus, partition: Partition) {
        self.0
            .entry(semester)
            .or_default()
            .entry(campus)
            .or_default()
            .absorb(partition);
    }

    pub fn partition(&self, semester: &Semester, campus: Campus) -> Option<&Partition> {
        self.0.get(semester).and_then(|campuses| campuses.get(&campus))
    }

    pub fn semesters(&self) -> impl Iterator<Item = &Semester> {
        self.0.keys()
    }

    pub fn partition_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn class_count(&self) -> usize {
        self.0
            .values()
            .flat_map(BTreeMap::values)
            .map(Partition::class_count)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
