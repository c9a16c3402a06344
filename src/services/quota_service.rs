use crate::access::QuotaSnapshot;
use crate::entities::session_entity as sessions;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

/// 当天第一个存在的本地时刻；夏令时跳过 00:00 时向后顺延
fn start_of_day<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    (0..=24 * 60)
        .map(|minutes| midnight + Duration::minutes(minutes))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn day_bounds_in<Tz: TimeZone>(tz: &Tz, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(tz).date_naive();
    let start = start_of_day(tz, today).unwrap_or(now);
    let end = today
        .succ_opt()
        .and_then(|tomorrow| start_of_day(tz, tomorrow))
        .unwrap_or(start + Duration::days(1));
    (start, end)
}

/// 免费额度读取。计数只读快照，原子扣减由会话创建侧负责。
#[derive(Clone)]
pub struct QuotaService {
    pool: DatabaseConnection,
    daily_free_limit: i64,
}

impl QuotaService {
    pub fn new(pool: DatabaseConnection, daily_free_limit: i64) -> Self {
        Self {
            pool,
            daily_free_limit,
        }
    }

    /// 当前本地日的 [00:00, 次日 00:00)，以 UTC 表示
    pub fn local_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        day_bounds_in(&Local, now)
    }

    pub async fn today_usage(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<QuotaSnapshot> {
        let (day_start, day_end) = Self::local_day_bounds(now);

        let used = sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::StartedAt.gte(day_start))
            .filter(sessions::Column::StartedAt.lt(day_end))
            .count(&self.pool)
            .await?;
        let used_today = i64::try_from(used)
            .map_err(|_| AppError::InternalError(format!("Session count overflow: {used}")))?;

        log::debug!("User {user_id} used {used_today}/{} free sessions today", self.daily_free_limit);

        Ok(QuotaSnapshot {
            used_today,
            limit: self.daily_free_limit,
        })
    }
}
