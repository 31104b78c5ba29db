pub mod assistant;
pub mod chat;
pub mod completion;
pub mod portal;
