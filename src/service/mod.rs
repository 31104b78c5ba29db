pub mod assistant_actor;
pub mod attendance;
pub mod chat;
pub mod classifier;
pub mod directory_actor;
