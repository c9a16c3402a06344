use crate::access::{AccessSummary, EntitlementRecord, PaymentRecord, resolve_access};
use crate::entities::{entitlement_entity as entitlements, payment_entity as payments, user_entity as users};
use crate::error::AppResult;
use crate::services::QuotaService;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

#[derive(Clone)]
pub struct AccessService {
    pool: DatabaseConnection,
    quota_service: QuotaService,
}

fn to_record(entitlement: entitlements::Model, payment: Option<payments::Model>) -> EntitlementRecord {
    EntitlementRecord {
        start_at: Some(entitlement.start_at),
        end_at: Some(entitlement.end_at),
        is_active: entitlement.is_active,
        payment_id: entitlement.payment_id,
        payment: payment.map(|p| PaymentRecord {
            status: p.status,
            paid_at: p.paid_at,
        }),
    }
}

/// 权益没有给出 pro_until 时，退回 users.pro_until（仅展示，不改变 status）；管理员总能开始
pub fn apply_user_profile(summary: AccessSummary, user: Option<&users::Model>) -> AccessSummary {
    let Some(user) = user else {
        return summary;
    };

    let summary = AccessSummary {
        pro_until: summary.pro_until.or(user.pro_until),
        ..summary
    };
    if user.is_admin() {
        summary.with_admin_override()
    } else {
        summary
    }
}

impl AccessService {
    pub fn new(pool: DatabaseConnection, quota_service: QuotaService) -> Self {
        Self {
            pool,
            quota_service,
        }
    }

    /// 取 end_at 最晚的一条权益（相同则取 start_at 最晚），并带上支付记录
    pub async fn find_latest_entitlement(&self, user_id: Uuid) -> AppResult<Option<EntitlementRecord>> {
        let row = entitlements::Entity::find()
            .filter(entitlements::Column::UserId.eq(user_id))
            .order_by_desc(entitlements::Column::EndAt)
            .order_by_desc(entitlements::Column::StartAt)
            .find_also_related(payments::Entity)
            .one(&self.pool)
            .await?;

        Ok(row.map(|(entitlement, payment)| to_record(entitlement, payment)))
    }

    /// 每次请求重新计算，不做缓存
    pub async fn load_access_summary(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<AccessSummary> {
        let entitlement = self.find_latest_entitlement(user_id).await?;
        let quota = self.quota_service.today_usage(user_id, now).await?;

        let user = users::Entity::find_by_id(user_id).one(&self.pool).await?;

        let summary = apply_user_profile(resolve_access(entitlement.as_ref(), quota, now), user.as_ref());

        log::debug!(
            "Access summary for {user_id}: status={}, reason={}",
            summary.status,
            summary.reason
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessStatus, EMPTY_ACCESS, QuotaSnapshot, ReasonCode};
    use crate::entities::UserRole;
    use chrono::{Duration, TimeZone};

    fn user(role: UserRole, pro_until: Option<DateTime<Utc>>) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            role,
            current_level: Some(2),
            pro_until,
            created_at: None,
        }
    }

    #[test]
    fn test_to_record_with_payment() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let payment_id = Uuid::new_v4();
        let entitlement = entitlements::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_at: now - Duration::days(1),
            end_at: now + Duration::days(29),
            is_active: true,
            payment_id: Some(payment_id),
            created_at: None,
        };
        let payment = payments::Model {
            id: payment_id,
            user_id: entitlement.user_id,
            status: "paid".to_string(),
            paid_at: Some(now - Duration::hours(2)),
            created_at: None,
        };

        let record = to_record(entitlement, Some(payment));
        assert_eq!(record.payment_id, Some(payment_id));
        assert!(record.payment.as_ref().unwrap().is_paid());

        let summary = resolve_access(
            Some(&record),
            QuotaSnapshot { used_today: 0, limit: 1 },
            now,
        );
        assert_eq!(summary.status, AccessStatus::Pro);
        assert!(summary.can_cancel);
    }

    #[test]
    fn test_to_record_grant_without_payment() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let entitlement = entitlements::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_at: now - Duration::days(10),
            end_at: now - Duration::days(3),
            is_active: true,
            payment_id: None,
            created_at: None,
        };

        let record = to_record(entitlement, None);
        assert!(record.payment.is_none());
        assert_eq!(record.end_at, Some(now - Duration::days(3)));
    }

    #[test]
    fn test_user_pro_until_fills_missing_entitlement_date() {
        let legacy_until = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let summary = apply_user_profile(
            EMPTY_ACCESS.clone(),
            Some(&user(UserRole::User, Some(legacy_until))),
        );

        assert_eq!(summary.pro_until, Some(legacy_until));
        assert_eq!(summary.status, AccessStatus::Free);
        assert_eq!(summary.reason, ReasonCode::OkWithFree);
    }

    #[test]
    fn test_entitlement_pro_until_wins_over_user_column() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let entitlement_until = now + Duration::days(30);
        let summary = AccessSummary {
            status: AccessStatus::Pro,
            pro_until: Some(entitlement_until),
            reason: ReasonCode::OkWithPro,
            ..EMPTY_ACCESS.clone()
        };

        let applied = apply_user_profile(
            summary,
            Some(&user(UserRole::User, Some(now + Duration::days(90)))),
        );
        assert_eq!(applied.pro_until, Some(entitlement_until));
    }

    #[test]
    fn test_admin_override_and_missing_user() {
        let exhausted = resolve_access(None, QuotaSnapshot { used_today: 1, limit: 1 }, Utc::now());
        assert!(!exhausted.can_start);

        let admin = apply_user_profile(exhausted.clone(), Some(&user(UserRole::Admin, None)));
        assert!(admin.can_start);
        assert_eq!(admin.reason, ReasonCode::OkAdmin);
        assert_eq!(admin.pro_until, None);

        assert_eq!(apply_user_profile(exhausted.clone(), None), exhausted);
    }
}
