pub mod completion_api;
pub mod llm_client;
