use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 学习会话：统计当天已用的免费次数，并读取最近一次的出题策略
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// { adjustment: {...}, applied_level_mix | level_mix: {...} }
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub strategy_json: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
