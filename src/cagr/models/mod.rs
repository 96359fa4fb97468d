pub mod campus;
pub mod offering;
pub mod semester;

pub use campus::Campus;
pub use offering::{Class, ClassMap, Course, CourseFields, Offering, ScheduleEntry};
pub use semester::Semester;

/// One page of search results, exactly as the server returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based position in the pagination sequence.
    pub index: u32,
    pub body: String,
}
