//! Assistant bookkeeping: chat transcripts, feedback, topics, analytics and settings.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use super::models::UserType;
use crate::error::CampusError;

pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i64,
    pub session_id: String,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    pub model_used: String,
}

#[derive(Debug, Clone)]
pub struct NewConversation {
    pub session_id: String,
    pub user_type: UserType,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub role: MessageRole,
    pub content: String,
    pub response_time_ms: Option<u64>,
    pub tokens_used: Option<u64>,
    pub model_used: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    pub session_id: String,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_helpful: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Feedback as submitted by the chat widget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    #[serde(default)]
    pub conversation_id: Option<i64>,
    pub session_id: String,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub rating: u8,
    #[serde(default)]
    pub feedback_text: Option<String>,
    #[serde(default)]
    pub was_helpful: Option<bool>,
    #[serde(default)]
    pub issue_resolved: Option<bool>,
    #[serde(default)]
    pub feedback_category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopularTopic {
    pub id: i64,
    pub topic: String,
    pub category: String,
    pub mention_count: u32,
    pub last_mentioned: DateTime<Utc>,
    pub trending_score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalytics {
    pub id: i64,
    pub date: NaiveDate,
    pub total_conversations: u32,
    pub total_messages: u32,
    pub unique_users: u32,
    pub student_interactions: u32,
    pub teacher_interactions: u32,
    pub guest_interactions: u32,
    pub avg_response_time_ms: u64,
    pub total_tokens_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_common_topic: Option<String>,
    pub satisfaction_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    String,
    Number,
    Boolean,
    Json,
}

impl SettingKind {
    fn accepts(self, value: &str) -> bool {
        match self {
            SettingKind::String => true,
            SettingKind::Number => value.trim().parse::<f64>().is_ok(),
            SettingKind::Boolean => value.trim().parse::<bool>().is_ok(),
            SettingKind::Json => serde_json::from_str::<serde_json::Value>(value).is_ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantSetting {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub kind: SettingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantStatistics {
    /// Distinct sessions in the window.
    pub total_conversations: usize,
    pub total_messages: usize,
    pub avg_response_time: f64,
    pub user_satisfaction: f64,
    pub top_category: String,
    pub daily_average: f64,
}

#[derive(Debug, Default)]
pub struct ConversationLog {
    conversations: Vec<Conversation>,
    feedback: Vec<Feedback>,
    topics: Vec<PopularTopic>,
    analytics: Vec<DailyAnalytics>,
    settings: Vec<AssistantSetting>,
}

impl ConversationLog {
    /// Sample history and settings; timestamps are relative to `now`.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let day = Duration::days(1);
        let sample = |id, role, content: &str, at, response_time_ms, tokens_used| Conversation {
            id,
            session_id: "session_001".to_string(),
            user_type: UserType::Student,
            user_id: Some(1),
            user_name: Some("Alice Johnson".to_string()),
            role,
            content: content.to_string(),
            timestamp: at,
            response_time_ms,
            tokens_used,
            model_used: DEFAULT_MODEL.to_string(),
        };
        let conversations = vec![
            sample(
                1,
                MessageRole::User,
                "How do I mark my attendance?",
                now - day,
                None,
                None,
            ),
            sample(
                2,
                MessageRole::Assistant,
                "To mark your attendance, log in to your student portal and click the 'Mark Attendance' button...",
                now - day + Duration::seconds(2),
                Some(1200),
                Some(85),
            ),
        ];

        let analytics = vec![DailyAnalytics {
            id: 1,
            date: now.date_naive(),
            total_conversations: 12,
            total_messages: 28,
            unique_users: 8,
            student_interactions: 7,
            teacher_interactions: 4,
            guest_interactions: 1,
            avg_response_time_ms: 1150,
            total_tokens_used: 2340,
            most_common_topic: Some("attendance".to_string()),
            satisfaction_score: 4.6,
        }];

        let topics = vec![
            PopularTopic {
                id: 1,
                topic: "mark attendance".to_string(),
                category: "attendance".to_string(),
                mention_count: 15,
                last_mentioned: now,
                trending_score: 8.5,
                created_at: now - Duration::days(7),
            },
            PopularTopic {
                id: 2,
                topic: "forgot password".to_string(),
                category: "login".to_string(),
                mention_count: 12,
                last_mentioned: now - Duration::hours(1),
                trending_score: 7.2,
                created_at: now - Duration::days(5),
            },
        ];

        let setting = |id, key: &str, value: &str, kind, description: &str| AssistantSetting {
            id,
            key: key.to_string(),
            value: value.to_string(),
            kind,
            description: Some(description.to_string()),
            is_active: true,
        };
        let settings = vec![
            setting(
                1,
                "max_response_length",
                "500",
                SettingKind::Number,
                "Maximum number of tokens for AI responses",
            ),
            setting(
                2,
                "response_temperature",
                "0.7",
                SettingKind::Number,
                "AI response creativity level (0-1)",
            ),
            setting(
                3,
                "enable_analytics",
                "true",
                SettingKind::Boolean,
                "Enable conversation analytics tracking",
            ),
            setting(
                4,
                "enable_feedback",
                "true",
                SettingKind::Boolean,
                "Enable user feedback collection",
            ),
            setting(
                5,
                "default_model",
                DEFAULT_MODEL,
                SettingKind::String,
                "Default AI model to use",
            ),
        ];

        info!(
            conversations = conversations.len(),
            topics = topics.len(),
            settings = settings.len(),
            "conversation log initialized"
        );
        Self {
            conversations,
            feedback: Vec::new(),
            topics,
            analytics,
            settings,
        }
    }

    fn setting_value(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|s| s.is_active && s.key == key)
            .map(|s| s.value.as_str())
    }

    /// Boolean settings default to on when missing or unparsable.
    fn enabled(&self, key: &str) -> bool {
        self.setting_value(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(true)
    }

    /// Appends one chat message; a message without a model is attributed to the `default_model` setting.
    pub fn log_message(&mut self, message: NewConversation, now: DateTime<Utc>) -> i64 {
        let id = self.conversations.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let model_used = message.model_used.unwrap_or_else(|| {
            self.setting_value("default_model")
                .unwrap_or(DEFAULT_MODEL)
                .to_string()
        });
        debug!(
            id,
            session_id = %message.session_id,
            role = ?message.role,
            user_type = message.user_type.as_str(),
            "assistant message logged"
        );
        self.conversations.push(Conversation {
            id,
            session_id: message.session_id,
            user_type: message.user_type,
            user_id: message.user_id,
            user_name: message.user_name,
            role: message.role,
            content: message.content,
            timestamp: now,
            response_time_ms: message.response_time_ms,
            tokens_used: message.tokens_used,
            model_used,
        });
        id
    }

    pub fn record_feedback(
        &mut self,
        feedback: NewFeedback,
        now: DateTime<Utc>,
    ) -> Result<Feedback, CampusError> {
        if !self.enabled("enable_feedback") {
            return Err(CampusError::Validation(
                "Feedback collection is disabled".to_string(),
            ));
        }
        if !(1..=5).contains(&feedback.rating) {
            return Err(CampusError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        let record = Feedback {
            id: self.feedback.iter().map(|f| f.id).max().unwrap_or(0) + 1,
            conversation_id: feedback.conversation_id,
            session_id: feedback.session_id,
            user_type: feedback.user_type,
            user_id: feedback.user_id,
            rating: feedback.rating,
            feedback_text: feedback.feedback_text,
            was_helpful: feedback.was_helpful,
            issue_resolved: feedback.issue_resolved,
            feedback_category: feedback.feedback_category,
            created_at: now,
        };
        info!(
            rating = record.rating,
            user_type = record.user_type.as_str(),
            "assistant feedback recorded"
        );
        self.feedback.push(record.clone());
        Ok(record)
    }

    /// Bumps a (topic, category) pair, creating it on first mention. No-op while analytics are disabled.
    pub fn touch_topic(&mut self, topic: &str, category: &str, now: DateTime<Utc>) {
        if !self.enabled("enable_analytics") {
            return;
        }
        if let Some(existing) = self
            .topics
            .iter_mut()
            .find(|t| t.topic == topic && t.category == category)
        {
            existing.mention_count += 1;
            existing.last_mentioned = now;
            existing.trending_score = f64::from(existing.mention_count) * 0.1 + 1.0;
            debug!(topic, category, mentions = existing.mention_count, "topic mentioned");
            return;
        }
        let id = self.topics.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.topics.push(PopularTopic {
            id,
            topic: topic.to_string(),
            category: category.to_string(),
            mention_count: 1,
            last_mentioned: now,
            trending_score: 1.0,
            created_at: now,
        });
        debug!(topic, category, "new topic");
    }

    pub fn statistics(&self, days: u32, now: DateTime<Utc>) -> AssistantStatistics {
        let days = days.max(1);
        let cutoff = now - Duration::days(i64::from(days));
        let recent: Vec<&Conversation> = self
            .conversations
            .iter()
            .filter(|c| c.timestamp >= cutoff)
            .collect();

        let sessions: HashSet<&str> = recent.iter().map(|c| c.session_id.as_str()).collect();

        let response_times: Vec<u64> = recent
            .iter()
            .filter(|c| c.role == MessageRole::Assistant)
            .map(|c| c.response_time_ms.unwrap_or(0))
            .collect();
        let avg_response_time = mean(response_times.iter().map(|&ms| ms as f64));

        let avg_rating = mean(
            self.feedback
                .iter()
                .filter(|f| f.created_at >= cutoff)
                .map(|f| f64::from(f.rating)),
        );

        AssistantStatistics {
            total_conversations: sessions.len(),
            total_messages: recent.len(),
            avg_response_time,
            user_satisfaction: round2(avg_rating),
            top_category: self
                .ranked_topics()
                .first()
                .map(|t| t.category.clone())
                .unwrap_or_else(|| "general".to_string()),
            daily_average: round2(sessions.len() as f64 / f64::from(days)),
        }
    }

    /// Oldest message first.
    pub fn history(&self, session_id: &str) -> Vec<Conversation> {
        let mut history: Vec<Conversation> = self
            .conversations
            .iter()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect();
        history.sort_by_key(|c| c.timestamp);
        history
    }

    /// Snapshots dated within the last `days` days, newest first.
    pub fn analytics(&self, days: u32, now: DateTime<Utc>) -> Vec<DailyAnalytics> {
        let cutoff = (now - Duration::days(i64::from(days))).date_naive();
        let mut recent: Vec<DailyAnalytics> = self
            .analytics
            .iter()
            .filter(|a| a.date >= cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent
    }

    fn ranked_topics(&self) -> Vec<&PopularTopic> {
        let mut ranked: Vec<&PopularTopic> = self.topics.iter().collect();
        ranked.sort_by(|a, b| b.trending_score.total_cmp(&a.trending_score));
        ranked
    }

    pub fn popular_topics(&self, limit: usize) -> Vec<PopularTopic> {
        self.ranked_topics()
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn settings(&self) -> Vec<AssistantSetting> {
        self.settings.iter().filter(|s| s.is_active).cloned().collect()
    }

    /// `Ok(None)` for an unknown key; the value must parse as the setting's kind.
    pub fn update_setting(
        &mut self,
        key: &str,
        value: String,
    ) -> Result<Option<AssistantSetting>, CampusError> {
        let Some(setting) = self.settings.iter_mut().find(|s| s.key == key) else {
            return Ok(None);
        };
        if !setting.kind.accepts(&value) {
            return Err(CampusError::Validation(format!(
                "Setting {key} expects a {} value",
                serde_json::to_value(setting.kind)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default()
            )));
        }
        setting.value = value;
        info!(key, value = %setting.value, "assistant setting updated");
        Ok(Some(setting.clone()))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, n), v| (sum + v, n + 1));
    if count == 0 { 0.0 } else { sum / f64::from(count) }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
