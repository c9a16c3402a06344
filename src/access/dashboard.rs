use super::types::{AccessSummary, EMPTY_ACCESS};
use crate::error::AppResult;
use crate::models::DashboardFacts;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// access 对象，以及为兼容旧客户端平铺在顶层的两个字段
#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct AccessSection {
    pub access: AccessSummary,
    pub free_sessions_left: i64,
    pub pro_until: Option<DateTime<Utc>>,
}

impl AccessSection {
    pub fn empty() -> Self {
        Self::from(EMPTY_ACCESS.clone())
    }
}

impl From<AccessSummary> for AccessSection {
    fn from(access: AccessSummary) -> Self {
        Self {
            free_sessions_left: access.free_sessions_left,
            pro_until: access.pro_until,
            access,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct DashboardPayload {
    #[serde(flatten)]
    pub facts: DashboardFacts,
    #[serde(flatten)]
    pub access: AccessSection,
}

impl DashboardPayload {
    /// 认证失败等无法取数时的兜底响应，结构与正常响应一致
    pub fn degraded(now: DateTime<Local>) -> Self {
        Self {
            facts: DashboardFacts::empty(now),
            access: AccessSection::empty(),
        }
    }
}

/// access 计算失败只降级 access 部分，不影响其他字段
pub fn compose_dashboard(facts: DashboardFacts, access: AppResult<AccessSummary>) -> DashboardPayload {
    let access = match access {
        Ok(summary) => summary,
        Err(e) => {
            log::warn!("Access summary failed, falling back to empty access: {e}");
            EMPTY_ACCESS.clone()
        }
    };

    DashboardPayload {
        facts,
        access: AccessSection::from(access),
    }
}
