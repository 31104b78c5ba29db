//! In-memory data layer. Everything here resets when the process exits.
//!
//! Layout:
//! - `models.rs`: portal records and derived statistics
//! - `seed.rs`: demo students, attendance and teachers
//! - `students.rs` / `teachers.rs`: the two directory stores
//! - `knowledge.rs`: the assistant's fixed Q&A table
//! - `conversations.rs`: assistant transcripts, feedback and settings

pub mod conversations;
pub mod knowledge;
pub mod models;
pub mod seed;
pub mod students;
pub mod teachers;

pub use conversations::ConversationLog;
pub use knowledge::KnowledgeBase;
pub use students::StudentStore;
pub use teachers::TeacherStore;
