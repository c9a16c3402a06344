use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// 用户当前的访问状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    Free,
    Pro,
    Expired,
}

impl std::fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessStatus::Free => write!(f, "free"),
            AccessStatus::Pro => write!(f, "pro"),
            AccessStatus::Expired => write!(f, "expired"),
        }
    }
}

/// `can_start` 的原因码。未知取值保留在 `Other` 中，新增原因不会破坏已有匹配。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReasonCode {
    OkWithPro,
    OkWithFree,
    NoFreeLeft,
    OkAdmin,
    Other(String),
}

impl ReasonCode {
    pub fn as_str(&self) -> &str {
        match self {
            ReasonCode::OkWithPro => "OK_WITH_PRO",
            ReasonCode::OkWithFree => "OK_WITH_FREE",
            ReasonCode::NoFreeLeft => "NO_FREE_LEFT",
            ReasonCode::OkAdmin => "OK_ADMIN",
            ReasonCode::Other(s) => s,
        }
    }
}

impl From<String> for ReasonCode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OK_WITH_PRO" => ReasonCode::OkWithPro,
            "OK_WITH_FREE" => ReasonCode::OkWithFree,
            "NO_FREE_LEFT" => ReasonCode::NoFreeLeft,
            "OK_ADMIN" => ReasonCode::OkAdmin,
            _ => ReasonCode::Other(s),
        }
    }
}

impl From<ReasonCode> for String {
    fn from(r: ReasonCode) -> Self {
        match r {
            ReasonCode::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解析时间戳字符串，无法解析时返回 None
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres 文本格式，例如 "2025-01-01 12:00:00+09"
    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// 宽松的时间戳反序列化：缺失、null、非字符串或格式错误都视为 None
pub(crate) mod lenient_timestamp {
    use super::parse_timestamp;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
    }
}

/// 关联的支付记录（只读）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentRecord {
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }
}

/// 用户最相关的一条权益记录，连同其支付记录
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntitlementRecord {
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub payment_id: Option<Uuid>,
    /// 没有关联支付（例如赠送）时为 None
    #[serde(default, alias = "payments")]
    pub payment: Option<PaymentRecord>,
}

/// 当天免费额度快照，由额度服务提供
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct QuotaSnapshot {
    pub used_today: i64,
    pub limit: i64,
}

/// 对外暴露的访问摘要，API 与 UI 共用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessSummary {
    pub status: AccessStatus,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub pro_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub can_cancel: bool,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub cancel_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_id: Option<Uuid>,
    #[serde(default)]
    pub free_sessions_used_today: i64,
    #[serde(default)]
    pub free_sessions_left: i64,
    #[serde(default)]
    pub free_sessions_limit: i64,
    pub can_start: bool,
    #[schema(value_type = String, example = "OK_WITH_FREE")]
    pub reason: ReasonCode,
}

/// 任何取数失败时使用的默认摘要
pub static EMPTY_ACCESS: AccessSummary = AccessSummary {
    status: AccessStatus::Free,
    pro_until: None,
    can_cancel: false,
    cancel_deadline: None,
    payment_id: None,
    free_sessions_used_today: 0,
    free_sessions_left: 1,
    free_sessions_limit: 1,
    can_start: true,
    reason: ReasonCode::OkWithFree,
};

impl AccessSummary {
    /// 管理员不受额度限制，其余字段保持不变
    pub fn with_admin_override(self) -> Self {
        Self {
            can_start: true,
            reason: ReasonCode::OkAdmin,
            ..self
        }
    }

    pub fn is_admin(&self) -> bool {
        self.reason == ReasonCode::OkAdmin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_reason_code_wire_format() {
        assert_eq!(
            serde_json::to_value(ReasonCode::NoFreeLeft).unwrap(),
            json!("NO_FREE_LEFT")
        );
        let other: ReasonCode = serde_json::from_value(json!("BANNED")).unwrap();
        assert_eq!(other, ReasonCode::Other("BANNED".into()));
        assert_eq!(String::from(other), "BANNED");
        let known: ReasonCode = serde_json::from_value(json!("OK_WITH_PRO")).unwrap();
        assert_eq!(known, ReasonCode::OkWithPro);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-01T03:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T12:00:00+09:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01 12:00:00+09"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_entitlement_record_lenient_rows() {
        let record: EntitlementRecord = serde_json::from_value(json!({
            "start_at": "garbage",
            "end_at": 12345,
            "is_active": true,
            "payment_id": null,
            "payments": { "status": "paid", "paid_at": "2025-01-01T00:00:00Z" }
        }))
        .unwrap();

        assert_eq!(record.start_at, None);
        assert_eq!(record.end_at, None);
        assert!(record.payment.as_ref().unwrap().is_paid());

        let bare: EntitlementRecord = serde_json::from_value(json!({})).unwrap();
        assert!(!bare.is_active);
        assert!(bare.payment.is_none());
    }

    #[test]
    fn test_empty_access_wire_shape() {
        let v = serde_json::to_value(&EMPTY_ACCESS).unwrap();
        assert_eq!(
            v,
            json!({
                "status": "free",
                "pro_until": null,
                "can_cancel": false,
                "cancel_deadline": null,
                "payment_id": null,
                "free_sessions_used_today": 0,
                "free_sessions_left": 1,
                "free_sessions_limit": 1,
                "can_start": true,
                "reason": "OK_WITH_FREE"
            })
        );
    }

    #[test]
    fn test_summary_tolerates_bad_dates() {
        let summary: AccessSummary = serde_json::from_value(json!({
            "status": "expired",
            "pro_until": "yesterday-ish",
            "can_start": false,
            "reason": "NO_FREE_LEFT"
        }))
        .unwrap();
        assert_eq!(summary.status, AccessStatus::Expired);
        assert_eq!(summary.pro_until, None);
        assert_eq!(summary.free_sessions_left, 0);
    }

    #[test]
    fn test_admin_override_keeps_status() {
        let summary = AccessSummary {
            status: AccessStatus::Expired,
            can_start: false,
            reason: ReasonCode::NoFreeLeft,
            free_sessions_left: 0,
            ..EMPTY_ACCESS.clone()
        }
        .with_admin_override();

        assert_eq!(summary.status, AccessStatus::Expired);
        assert!(summary.can_start);
        assert!(summary.is_admin());
    }
}
