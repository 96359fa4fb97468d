//! In-memory crawl results.

pub mod offerings;

pub use offerings::{CourseMap, Offerings, Partition};
