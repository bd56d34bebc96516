pub mod catalog;
pub mod course;

pub use catalog::{Department, Faculty};
pub use course::{Course, CourseDetail, CourseDetailResponse};
