use chrono::{DateTime, Datelike, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const LEVEL_DATA_UNAVAILABLE: &str = "Failed to load level data";
pub const NO_DIFFICULTY_DATA: &str = "No data";
pub const NO_RECENT_ADJUSTMENT: &str = "No recent adjustment";
pub const ADJUSTMENT_APPLIED: &str = "Difficulty adjustment applied";
pub const ADJUSTMENT_NOT_MET: &str = "Adjustment conditions not met";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriorityReason {
    RecentDifficulty,
    Spaced,
    NextStep,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PriorityConcept {
    pub key: String,
    pub name: String,
    pub reason: PriorityReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// 本月学习过的日期，YYYY-MM-DD，升序
    pub learned_dates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardGates {
    pub weak_session_enabled: bool,
}

/// null 与缺失一样取默认值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// evaluate_user_level_progress 返回的统计，字段缺失或为 null 时取默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(default)]
pub struct LevelStats {
    pub recent_session_id: Option<String>,
    pub recent_session_started_at: Option<String>,
    pub recent_session_ended_at: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub recent_attempts: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub recent_correct_attempts: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub recent_correct_rate: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_attempts: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub stable_concept_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub stable_concept_ratio: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub low_box_concept_count: i64,
}

/// 升级到 level 的门槛，比例统一为 0~1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct LevelUpPolicy {
    pub level: i32,
    pub min_total_attempts: Option<i64>,
    pub min_correct_rate: Option<f64>,
    pub min_box_level_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct LevelEntry {
    pub level: i32,
    pub changed_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LevelMeta {
    pub eligible_for_next: bool,
    pub reason: String,
    pub target_level: i32,
    /// 30 天内最近一次等级变更
    pub recent_level_entry: Option<LevelEntry>,
    pub stats: Option<LevelStats>,
    pub policy: Option<LevelUpPolicy>,
}

impl LevelMeta {
    pub fn unavailable() -> Self {
        Self {
            eligible_for_next: false,
            reason: LEVEL_DATA_UNAVAILABLE.to_string(),
            target_level: 0,
            recent_level_entry: None,
            stats: None,
            policy: None,
        }
    }
}

/// 最近一次会话的难度调整信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Difficulty {
    pub applied: bool,
    pub reason: String,
    pub applied_mix: Option<BTreeMap<String, f64>>,
    pub policy_level: Option<i64>,
    pub recent_correct_rate: Option<f64>,
    pub low_box_concept_count: Option<i64>,
}

impl Difficulty {
    pub fn no_data() -> Self {
        Self {
            applied: false,
            reason: NO_DIFFICULTY_DATA.to_string(),
            applied_mix: None,
            policy_level: None,
            recent_correct_rate: None,
            low_box_concept_count: None,
        }
    }
}

/// dashboard 中与 access 无关的部分
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFacts {
    pub level: i32,
    pub delta30d: i32,
    pub total_sentence_count: i64,
    pub studied_word_count: i64,
    pub calendar: CalendarMonth,
    pub priority_concepts: Vec<PriorityConcept>,
    pub gates: DashboardGates,
    pub level_meta: LevelMeta,
    pub difficulty: Difficulty,
}

impl DashboardFacts {
    pub fn empty(now: DateTime<Local>) -> Self {
        Self {
            level: 1,
            delta30d: 0,
            total_sentence_count: 0,
            studied_word_count: 0,
            calendar: CalendarMonth {
                year: now.year(),
                month: now.month(),
                learned_dates: Vec::new(),
            },
            priority_concepts: Vec::new(),
            gates: DashboardGates {
                weak_session_enabled: true,
            },
            level_meta: LevelMeta::unavailable(),
            difficulty: Difficulty::no_data(),
        }
    }
}
