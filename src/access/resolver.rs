//! 把权益、支付和免费额度三份记录合并为一份 [`AccessSummary`]。
//!
//! 这里全部是纯函数：输入已经取好的记录和当前时间，输出新的摘要，
//! 不会修改输入，也不会返回错误。

use super::types::{
    AccessStatus, AccessSummary, EntitlementRecord, QuotaSnapshot, ReasonCode,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// 支付后允许取消的小时数
pub const CANCEL_WINDOW_HOURS: i64 = 72;

pub fn cancel_window() -> Duration {
    Duration::hours(CANCEL_WINDOW_HOURS)
}

/// 仅由权益/支付记录决定的部分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementState {
    pub status: AccessStatus,
    pub pro_until: Option<DateTime<Utc>>,
    pub can_cancel: bool,
    pub cancel_deadline: Option<DateTime<Utc>>,
    pub payment_id: Option<Uuid>,
}

impl Default for EntitlementState {
    fn default() -> Self {
        Self {
            status: AccessStatus::Free,
            pro_until: None,
            can_cancel: false,
            cancel_deadline: None,
            payment_id: None,
        }
    }
}

/// 半开区间 [start_at, end_at)，任一端缺失都算不在区间内
fn within_window(entitlement: &EntitlementRecord, now: DateTime<Utc>) -> bool {
    match (entitlement.start_at, entitlement.end_at) {
        (Some(start), Some(end)) => start <= now && now < end,
        _ => false,
    }
}

pub fn resolve(entitlement: Option<&EntitlementRecord>, now: DateTime<Utc>) -> EntitlementState {
    let mut state = EntitlementState::default();
    let Some(entitlement) = entitlement else {
        return state;
    };

    // 有过权益记录的用户至少是 expired，和从未订阅的用户区分开
    state.status = AccessStatus::Expired;
    state.pro_until = entitlement.end_at;
    state.payment_id = entitlement.payment_id;

    if entitlement.is_active && within_window(entitlement, now) {
        state.status = AccessStatus::Pro;
    }

    if state.status == AccessStatus::Pro
        && let Some(payment) = entitlement.payment.as_ref()
        && payment.is_paid()
        && let Some(paid_at) = payment.paid_at
        && now - paid_at <= cancel_window()
        && let Some(deadline) = paid_at.checked_add_signed(cancel_window())
    {
        state.can_cancel = true;
        state.cancel_deadline = Some(deadline);
    }

    state
}

/// 合并额度并计算 can_start / reason
pub fn summarize(state: EntitlementState, quota: QuotaSnapshot) -> AccessSummary {
    let used = quota.used_today.max(0);
    let limit = quota.limit.max(0);
    let left = limit.saturating_sub(used).max(0);

    let (can_start, reason) = if state.status == AccessStatus::Pro {
        (true, ReasonCode::OkWithPro)
    } else if left > 0 {
        (true, ReasonCode::OkWithFree)
    } else {
        (false, ReasonCode::NoFreeLeft)
    };

    AccessSummary {
        status: state.status,
        pro_until: state.pro_until,
        can_cancel: state.can_cancel,
        cancel_deadline: state.cancel_deadline,
        payment_id: state.payment_id,
        free_sessions_used_today: used,
        free_sessions_left: left,
        free_sessions_limit: limit,
        can_start,
        reason,
    }
}

pub fn resolve_access(
    entitlement: Option<&EntitlementRecord>,
    quota: QuotaSnapshot,
    now: DateTime<Utc>,
) -> AccessSummary {
    summarize(resolve(entitlement, now), quota)
}
