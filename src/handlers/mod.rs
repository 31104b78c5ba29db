pub mod assistant;
pub mod session;
pub mod students;
pub mod teachers;
