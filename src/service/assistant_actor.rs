use crate::db::ConversationLog;
use crate::db::conversations::{
    AssistantSetting, AssistantStatistics, Conversation, DailyAnalytics, Feedback,
    NewConversation, NewFeedback, PopularTopic,
};
use crate::error::CampusError;

use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::{info, warn};

#[derive(Debug)]
pub enum AssistantMessage {
    /// Append a chat message; fire-and-forget.
    LogMessage(NewConversation),
    /// Count one mention of a topic under its category; fire-and-forget.
    TouchTopic(String, String),

    RecordFeedback(NewFeedback, RpcReplyPort<Result<Feedback, CampusError>>),
    Statistics(u32, RpcReplyPort<AssistantStatistics>),
    History(String, RpcReplyPort<Vec<Conversation>>),
    Analytics(u32, RpcReplyPort<Vec<DailyAnalytics>>),
    PopularTopics(usize, RpcReplyPort<Vec<PopularTopic>>),
    Settings(RpcReplyPort<Vec<AssistantSetting>>),
    UpdateSetting(
        String,
        String,
        RpcReplyPort<Result<Option<AssistantSetting>, CampusError>>,
    ),
}

/// Handle for the actor that owns the conversation log.
#[derive(Clone)]
pub struct AssistantHandle {
    actor: ActorRef<AssistantMessage>,
}

impl AssistantHandle {
    pub fn log_message(&self, message: NewConversation) {
        if let Err(e) = ractor::cast!(self.actor, AssistantMessage::LogMessage(message)) {
            warn!(error = %e, "failed to log assistant message");
        }
    }

    pub fn touch_topic(&self, topic: impl Into<String>, category: impl Into<String>) {
        if let Err(e) = ractor::cast!(
            self.actor,
            AssistantMessage::TouchTopic(topic.into(), category.into())
        ) {
            warn!(error = %e, "failed to record assistant topic");
        }
    }

    pub async fn record_feedback(&self, feedback: NewFeedback) -> Result<Feedback, CampusError> {
        ractor::call!(self.actor, AssistantMessage::RecordFeedback, feedback)
            .map_err(|e| CampusError::RactorError(format!("RecordFeedback RPC failed: {e}")))?
    }

    pub async fn statistics(&self, days: u32) -> Result<AssistantStatistics, CampusError> {
        ractor::call!(self.actor, AssistantMessage::Statistics, days)
            .map_err(|e| CampusError::RactorError(format!("Statistics RPC failed: {e}")))
    }

    pub async fn history(
        &self,
        session_id: impl Into<String>,
    ) -> Result<Vec<Conversation>, CampusError> {
        ractor::call!(self.actor, AssistantMessage::History, session_id.into())
            .map_err(|e| CampusError::RactorError(format!("History RPC failed: {e}")))
    }

    pub async fn analytics(&self, days: u32) -> Result<Vec<DailyAnalytics>, CampusError> {
        ractor::call!(self.actor, AssistantMessage::Analytics, days)
            .map_err(|e| CampusError::RactorError(format!("Analytics RPC failed: {e}")))
    }

    pub async fn popular_topics(&self, limit: usize) -> Result<Vec<PopularTopic>, CampusError> {
        ractor::call!(self.actor, AssistantMessage::PopularTopics, limit)
            .map_err(|e| CampusError::RactorError(format!("PopularTopics RPC failed: {e}")))
    }

    pub async fn settings(&self) -> Result<Vec<AssistantSetting>, CampusError> {
        ractor::call!(self.actor, AssistantMessage::Settings)
            .map_err(|e| CampusError::RactorError(format!("Settings RPC failed: {e}")))
    }

    pub async fn update_setting(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<AssistantSetting>, CampusError> {
        ractor::call!(
            self.actor,
            AssistantMessage::UpdateSetting,
            key.into(),
            value.into()
        )
        .map_err(|e| CampusError::RactorError(format!("UpdateSetting RPC failed: {e}")))?
    }
}

struct AssistantActor;

#[ractor::async_trait]
impl Actor for AssistantActor {
    type Msg = AssistantMessage;
    type State = ConversationLog;
    type Arguments = ConversationLog;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        log: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("AssistantActor started");
        Ok(log)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        log: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let now = Utc::now();
        match message {
            AssistantMessage::LogMessage(message) => {
                log.log_message(message, now);
            }
            AssistantMessage::TouchTopic(topic, category) => {
                log.touch_topic(&topic, &category, now);
            }
            AssistantMessage::RecordFeedback(feedback, rp) => {
                let _ = rp.send(log.record_feedback(feedback, now));
            }
            AssistantMessage::Statistics(days, rp) => {
                let _ = rp.send(log.statistics(days, now));
            }
            AssistantMessage::History(session_id, rp) => {
                let _ = rp.send(log.history(&session_id));
            }
            AssistantMessage::Analytics(days, rp) => {
                let _ = rp.send(log.analytics(days, now));
            }
            AssistantMessage::PopularTopics(limit, rp) => {
                let _ = rp.send(log.popular_topics(limit));
            }
            AssistantMessage::Settings(rp) => {
                let _ = rp.send(log.settings());
            }
            AssistantMessage::UpdateSetting(key, value, rp) => {
                let _ = rp.send(log.update_setting(&key, value));
            }
        }
        Ok(())
    }
}

pub async fn spawn(log: ConversationLog) -> Result<AssistantHandle, CampusError> {
    let (actor, _jh) = Actor::spawn(None, AssistantActor, log)
        .await
        .map_err(|e| CampusError::RactorError(format!("failed to spawn AssistantActor: {e}")))?;
    Ok(AssistantHandle { actor })
}

pub async fn spawn_seeded() -> Result<AssistantHandle, CampusError> {
    spawn(ConversationLog::seeded(Utc::now())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::conversations::MessageRole;
    use crate::db::models::UserType;

    #[tokio::test]
    async fn casts_are_applied_before_later_calls() {
        let handle = spawn_seeded().await.unwrap();
        handle.log_message(NewConversation {
            session_id: "session_test".to_string(),
            user_type: UserType::Guest,
            user_id: None,
            user_name: None,
            role: MessageRole::User,
            content: "where is my report".to_string(),
            response_time_ms: None,
            tokens_used: None,
            model_used: None,
        });
        handle.touch_topic("where is my report", "reports");

        let history = handle.history("session_test").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].model_used, "gpt-4o");

        let topics = handle.popular_topics(10).await.unwrap();
        assert!(topics.iter().any(|t| t.category == "reports"));

        let stats = handle.statistics(30).await.unwrap();
        assert_eq!(stats.total_conversations, 2);
        assert_eq!(stats.total_messages, 3);
    }

    #[tokio::test]
    async fn unknown_setting_is_none() {
        let handle = spawn_seeded().await.unwrap();
        assert!(
            handle
                .update_setting("no_such_key", "1")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(handle.settings().await.unwrap().len(), 5);
    }
}
