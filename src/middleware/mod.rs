pub mod auth;
pub mod chat_request;
pub mod json_body;
