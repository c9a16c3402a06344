use crate::access::{AccessSummary, ReasonCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 开始学习前的检查结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct LearnCheckResponse {
    pub can_start: bool,
    #[schema(value_type = String, example = "NO_FREE_LEFT")]
    pub reason: ReasonCode,
    pub free_sessions_used_today: i64,
    pub pro_until: Option<DateTime<Utc>>,
}

impl From<&AccessSummary> for LearnCheckResponse {
    fn from(s: &AccessSummary) -> Self {
        Self {
            can_start: s.can_start,
            reason: s.reason.clone(),
            free_sessions_used_today: s.free_sessions_used_today,
            pro_until: s.pro_until,
        }
    }
}
