use super::types::{AccessStatus, AccessSummary, parse_timestamp};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Default,
    Secondary,
    Destructive,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct Badge {
    pub label: String,
    pub variant: BadgeVariant,
}

/// 本地日期 YYYY.MM.DD，缺失时为 "-"
pub fn format_badge_date(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(dt) => dt.with_timezone(&Local).format("%Y.%m.%d").to_string(),
        None => "-".to_string(),
    }
}

pub fn format_badge_date_str(value: &str) -> String {
    format_badge_date(parse_timestamp(value))
}

/// 摘要缺失时不显示徽章
pub fn present(summary: Option<&AccessSummary>) -> Option<Badge> {
    let summary = summary?;

    if summary.is_admin() {
        return Some(Badge {
            label: "Admin".to_string(),
            variant: BadgeVariant::Default,
        });
    }

    if summary.status == AccessStatus::Pro {
        return Some(Badge {
            label: format!("Unlimited until {}", format_badge_date(summary.pro_until)),
            variant: BadgeVariant::Default,
        });
    }

    let limit = summary.free_sessions_limit.max(1);
    let left = summary.free_sessions_left.clamp(0, limit);
    let variant = if left > 0 {
        BadgeVariant::Secondary
    } else {
        BadgeVariant::Destructive
    };

    Some(Badge {
        label: format!("Free {left}/{limit}"),
        variant,
    })
}

/// 学习开始卡片上的两个提示，互斥
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, ToSchema)]
pub struct AccessNotices {
    pub expired: bool,
    pub quota: bool,
}

impl AccessNotices {
    pub fn from_summary(summary: &AccessSummary) -> Self {
        if summary.is_admin() {
            return Self::default();
        }
        let expired = summary.status == AccessStatus::Expired;
        let quota = !expired
            && summary.status != AccessStatus::Pro
            && summary.free_sessions_left.max(0) == 0;
        Self { expired, quota }
    }

    /// 只有 expired 且没有免费次数时，过期提示才会阻止开始
    pub fn blocked_from_start(&self, summary: &AccessSummary) -> bool {
        self.quota || (self.expired && summary.free_sessions_left.max(0) == 0)
    }
}
