use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post, put},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

use crate::api::llm_client::LlmClient;
use crate::config::{BasicConfig, Config};
use crate::db::{ConversationLog, KnowledgeBase, StudentStore, TeacherStore};
use crate::error::CampusError;
use crate::handlers::{assistant, session, students, teachers};
use crate::service::assistant_actor::{self, AssistantHandle};
use crate::service::chat::ChatOrchestrator;
use crate::service::directory_actor::{self, DirectoryHandle};

#[derive(Clone)]
pub struct CampusState {
    pub directory: DirectoryHandle,
    pub assistant: AssistantHandle,
    pub knowledge: Arc<KnowledgeBase>,
    pub chat: Arc<ChatOrchestrator>,
    pub insecure_cookie: bool,
    key: Key,
    body_limit: usize,
}

impl CampusState {
    pub fn new(
        directory: DirectoryHandle,
        assistant: AssistantHandle,
        knowledge: Arc<KnowledgeBase>,
        llm: LlmClient,
        basic: &BasicConfig,
    ) -> Result<Self, CampusError> {
        let chat = ChatOrchestrator::new(knowledge.clone(), llm, assistant.clone());
        Ok(Self {
            directory,
            assistant,
            knowledge,
            chat: Arc::new(chat),
            insecure_cookie: basic.insecure_cookie,
            key: cookie_key(basic.cookie_secret.as_deref())?,
            body_limit: basic.body_limit,
        })
    }

    /// Seeded stores, both actors and the LLM client, all from one config.
    pub async fn from_config(cfg: &Config) -> Result<Self, CampusError> {
        let directory = directory_actor::spawn(StudentStore::seeded(), TeacherStore::seeded()).await?;
        let assistant = assistant_actor::spawn(ConversationLog::seeded(chrono::Utc::now())).await?;
        let knowledge = Arc::new(KnowledgeBase::seeded());
        let llm = LlmClient::new(&cfg.llm)?;
        Self::new(directory, assistant, knowledge, llm, &cfg.basic)
    }
}

impl FromRef<CampusState> for Key {
    fn from_ref(state: &CampusState) -> Self {
        state.key.clone()
    }
}

/// Cookie encryption key: derived from the configured secret, or random for this process.
fn cookie_key(secret: Option<&str>) -> Result<Key, CampusError> {
    match secret {
        Some(secret) => Key::try_from(secret.as_bytes()).map_err(|_| {
            CampusError::Config("basic.cookie_secret must be at least 64 bytes".to_string())
        }),
        None => Ok(Key::generate()),
    }
}

pub fn campus_router(state: CampusState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/healthz", get(session::healthz))
        .route("/api/logout", post(session::logout))
        // students
        .route("/api/students", get(students::list))
        .route("/api/students/login", post(students::login))
        .route("/api/students/register", post(students::register))
        .route("/api/students/search", get(students::search))
        .route("/api/students/class", get(students::by_class))
        .route("/api/students/me", get(students::dashboard))
        .route("/api/students/roll/{roll_no}", get(students::by_roll_no))
        .route(
            "/api/students/{id}",
            get(students::get).patch(students::update),
        )
        .route("/api/students/{id}/attendance", get(students::attendance))
        .route("/api/students/{id}/stats", get(students::stats))
        .route("/api/attendance", post(students::mark_attendance))
        .route("/api/attendance/stats", get(students::all_stats))
        .route("/api/database/stats", get(students::database_stats))
        // teachers
        .route("/api/teachers", get(teachers::list))
        .route("/api/teachers/login", post(teachers::login))
        .route("/api/teachers/register", post(teachers::register))
        .route("/api/teachers/verify", post(teachers::verify))
        .route("/api/teachers/search", get(teachers::search))
        .route("/api/teachers/stats", get(teachers::stats))
        .route("/api/teachers/departments", get(teachers::departments))
        .route("/api/teachers/subjects", get(teachers::subjects))
        .route("/api/teachers/me", get(teachers::dashboard))
        .route(
            "/api/teachers/department/{department}",
            get(teachers::by_department),
        )
        .route("/api/teachers/subject/{subject}", get(teachers::by_subject))
        .route(
            "/api/teachers/employee/{employee_id}",
            get(teachers::by_employee_id),
        )
        .route(
            "/api/teachers/{id}",
            get(teachers::get).patch(teachers::update),
        )
        // assistant
        .route("/api/chat", post(assistant::chat_handler))
        .route("/api/assistant/knowledge", get(assistant::knowledge))
        .route("/api/assistant/feedback", post(assistant::feedback))
        .route("/api/assistant/stats", get(assistant::statistics))
        .route("/api/assistant/history/{session_id}", get(assistant::history))
        .route("/api/assistant/topics", get(assistant::topics))
        .route("/api/assistant/analytics", get(assistant::analytics))
        .route("/api/assistant/settings", get(assistant::settings))
        .route(
            "/api/assistant/settings/{key}",
            put(assistant::update_setting),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_cookie_secret_is_rejected() {
        assert!(matches!(
            cookie_key(Some("too short")),
            Err(CampusError::Config(_))
        ));
        assert!(cookie_key(Some(&"x".repeat(64))).is_ok());
        assert!(cookie_key(None).is_ok());
    }
}
