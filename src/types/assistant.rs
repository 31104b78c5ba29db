use serde::Deserialize;

use crate::db::models::UserType;

pub const DEFAULT_KNOWLEDGE_LIMIT: usize = 5;
pub const DEFAULT_STATS_DAYS: u32 = 30;
pub const DEFAULT_ANALYTICS_DAYS: u32 = 7;
pub const DEFAULT_TOPIC_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeQuery {
    #[serde(default)]
    pub q: String,
    pub user_type: Option<UserType>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingValue {
    pub value: String,
}
