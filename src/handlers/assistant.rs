use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use std::convert::Infallible;

use crate::db::conversations::{
    AssistantSetting, AssistantStatistics, Conversation, DailyAnalytics, Feedback, NewFeedback,
    PopularTopic,
};
use crate::db::knowledge::ScoredEntry;
use crate::error::CampusError;
use crate::middleware::auth::TeacherSession;
use crate::middleware::chat_request::ChatPreprocess;
use crate::middleware::json_body::JsonBody;
use crate::router::CampusState;
use crate::service::chat::{ChatReply, FALLBACK_TEXT};
use crate::types::assistant::{
    DEFAULT_ANALYTICS_DAYS, DEFAULT_KNOWLEDGE_LIMIT, DEFAULT_STATS_DAYS, DEFAULT_TOPIC_LIMIT,
    DaysQuery, KnowledgeQuery, LimitQuery, SettingValue,
};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Streams the model's answer as plain text, or the canned answer when the model is unreachable.
pub async fn chat_handler(
    State(state): State<CampusState>,
    chat: ChatPreprocess,
) -> Response {
    let reply = match chat {
        ChatPreprocess::Parsed(req) => state.chat.respond(req).await,
        ChatPreprocess::Unreadable => ChatReply::Fallback,
    };
    match reply {
        ChatReply::Stream(chunks) => (
            [(header::CONTENT_TYPE, TEXT_PLAIN)],
            Body::from_stream(chunks.map(Ok::<_, Infallible>)),
        )
            .into_response(),
        ChatReply::Fallback => ([(header::CONTENT_TYPE, TEXT_PLAIN)], FALLBACK_TEXT).into_response(),
    }
}

pub async fn knowledge(
    State(state): State<CampusState>,
    Query(query): Query<KnowledgeQuery>,
) -> Json<Vec<ScoredEntry>> {
    let limit = query.limit.unwrap_or(DEFAULT_KNOWLEDGE_LIMIT);
    Json(state.knowledge.search(&query.q, query.user_type, limit))
}

pub async fn feedback(
    State(state): State<CampusState>,
    JsonBody(feedback): JsonBody<NewFeedback>,
) -> Result<(StatusCode, Json<Feedback>), CampusError> {
    let recorded = state.assistant.record_feedback(feedback).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

pub async fn statistics(
    State(state): State<CampusState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<AssistantStatistics>, CampusError> {
    let days = query.days.unwrap_or(DEFAULT_STATS_DAYS);
    Ok(Json(state.assistant.statistics(days).await?))
}

pub async fn history(
    State(state): State<CampusState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Conversation>>, CampusError> {
    Ok(Json(state.assistant.history(session_id).await?))
}

pub async fn topics(
    State(state): State<CampusState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<PopularTopic>>, CampusError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOPIC_LIMIT);
    Ok(Json(state.assistant.popular_topics(limit).await?))
}

pub async fn analytics(
    State(state): State<CampusState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<DailyAnalytics>>, CampusError> {
    let days = query.days.unwrap_or(DEFAULT_ANALYTICS_DAYS);
    Ok(Json(state.assistant.analytics(days).await?))
}

pub async fn settings(
    State(state): State<CampusState>,
) -> Result<Json<Vec<AssistantSetting>>, CampusError> {
    Ok(Json(state.assistant.settings().await?))
}

pub async fn update_setting(
    State(state): State<CampusState>,
    TeacherSession(_): TeacherSession,
    Path(key): Path<String>,
    JsonBody(body): JsonBody<SettingValue>,
) -> Result<Json<AssistantSetting>, CampusError> {
    state
        .assistant
        .update_setting(key.clone(), body.value)
        .await?
        .map(Json)
        .ok_or_else(|| CampusError::NotFound(format!("Setting {key}")))
}
