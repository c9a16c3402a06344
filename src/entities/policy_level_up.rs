use sea_orm::entity::prelude::*;

/// 每个等级的升级门槛。比例字段可能存为百分比 (0~100) 或小数 (0~1)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "policy_level_up")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub level: i32,
    pub min_total_attempts: Option<i32>,
    #[sea_orm(column_type = "Double", nullable)]
    pub min_correct_rate: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub min_box_level_ratio: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
