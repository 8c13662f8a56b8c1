pub mod attendance;
pub mod core;
pub mod exams;
pub mod exports;
pub mod payments;
pub mod students;
