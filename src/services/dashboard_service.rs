use crate::entities::{
    concept_entity as concepts, policy_level_up_entity as level_policies,
    session_bundle_entity as session_bundles, session_entity as sessions,
    user_concept_status_entity as ucs, user_entity as users,
    user_level_history_entity as level_history,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Statement,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

const BUNDLE_SCAN_LIMIT: u64 = 100;
const PRIORITY_CONCEPT_LIMIT: u64 = 5;

/// session_bundles 汇总结果
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BundleTally {
    pub total_sentence_count: i64,
    pub studied_word_count: i64,
    pub learned_dates: Vec<String>,
}

/// evaluate_user_level_progress 的结果，各字段都可能为 null
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelEvaluation {
    pub eligible: Option<bool>,
    pub reason: Option<String>,
    pub current_level: Option<i32>,
    pub target_level: Option<i32>,
    pub stats: Option<LevelStats>,
}

/// 各项查询的原始结果。组装时逐项降级，一项失败不影响其他部分
pub struct FactSources {
    pub user: AppResult<Option<users::Model>>,
    pub history: AppResult<Vec<level_history::Model>>,
    pub bundles: AppResult<Vec<Value>>,
    pub statuses: AppResult<Vec<ucs::Model>>,
    pub concept_names: HashMap<String, String>,
    pub evaluation: AppResult<Option<LevelEvaluation>>,
    pub policy: AppResult<Option<LevelUpPolicy>>,
    pub strategy: AppResult<Option<Value>>,
}

fn or_default<T: Default>(section: &str, result: AppResult<T>) -> T {
    result.unwrap_or_else(|e| {
        log::warn!("Dashboard {section} lookup failed, using defaults: {e}");
        T::default()
    })
}

fn current_level(user: Option<&users::Model>) -> i32 {
    user.and_then(|u| u.current_level)
        .filter(|level| *level != 0)
        .unwrap_or(1)
}

fn target_level(level: i32, evaluation: Option<&LevelEvaluation>) -> i32 {
    evaluation
        .and_then(|e| e.target_level)
        .filter(|target| *target != 0)
        .unwrap_or_else(|| level.saturating_add(1))
}

/// 百分比 (>1) 转为 0~1 比例
pub fn normalize_policy_rate(value: Option<f64>) -> Option<f64> {
    value
        .filter(|v| v.is_finite())
        .map(|v| if v > 1.0 { v / 100.0 } else { v })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn as_integer(value: &Value) -> Option<i64> {
    as_number(value)
        .filter(|n| n.fract() == 0.0)
        .map(|n| n as i64)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn adjustment_field<'a>(adjustment: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    adjustment.and_then(|a| a.get(key)).filter(|v| !v.is_null())
}

#[derive(Clone)]
pub struct DashboardService {
    pool: DatabaseConnection,
}

impl DashboardService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 加载 dashboard 中除 access 以外的部分；单项查询失败只降级对应部分
    pub async fn load_facts(&self, user_id: Uuid, now: DateTime<Utc>) -> DashboardFacts {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await
            .map_err(AppError::from);
        let history = self.level_history(user_id, now).await;
        let bundles = self.bundle_summaries(user_id).await;
        let statuses = self.concept_statuses(user_id).await;
        let concept_names = match &statuses {
            Ok(rows) => self.concept_names(rows).await,
            Err(_) => HashMap::new(),
        };
        let evaluation = self.evaluate_level(user_id).await;

        let evaluated = evaluation.as_ref().ok().and_then(Option::as_ref);
        let level = current_level(user.as_ref().ok().and_then(Option::as_ref));
        let policy = self.level_policy(target_level(level, evaluated)).await;
        let recent_session = evaluated
            .and_then(|e| e.stats.as_ref())
            .and_then(|s| s.recent_session_id.as_deref())
            .and_then(|id| Uuid::parse_str(id).ok());
        let strategy = match recent_session {
            Some(session_id) => self.session_strategy(session_id).await,
            None => Ok(None),
        };

        Self::assemble_facts(
            now.with_timezone(&Local),
            FactSources {
                user,
                history,
                bundles,
                statuses,
                concept_names,
                evaluation,
                policy,
                strategy,
            },
        )
    }

    /// 30 天内的等级变更，按时间升序
    async fn level_history(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<level_history::Model>> {
        let rows = level_history::Entity::find()
            .filter(level_history::Column::UserId.eq(user_id))
            .filter(level_history::Column::ChangedAt.gte(now - Duration::days(30)))
            .order_by_asc(level_history::Column::ChangedAt)
            .all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn bundle_summaries(&self, user_id: Uuid) -> AppResult<Vec<Value>> {
        let bundles = session_bundles::Entity::find()
            .filter(session_bundles::Column::UserId.eq(user_id))
            .order_by_desc(session_bundles::Column::BundleSeq)
            .limit(BUNDLE_SCAN_LIMIT)
            .all(&self.pool)
            .await?;
        Ok(bundles.into_iter().filter_map(|b| b.summary_json).collect())
    }

    async fn concept_statuses(&self, user_id: Uuid) -> AppResult<Vec<ucs::Model>> {
        let rows = ucs::Entity::find()
            .filter(ucs::Column::UserId.eq(user_id))
            .order_by_desc(ucs::Column::WrongCount)
            .limit(PRIORITY_CONCEPT_LIMIT)
            .all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// 名称只是展示用，查询失败时退回 concept_key
    async fn concept_names(&self, statuses: &[ucs::Model]) -> HashMap<String, String> {
        let keys: Vec<String> = statuses
            .iter()
            .map(|s| s.concept_key.clone())
            .filter(|k| !k.is_empty())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if keys.is_empty() {
            return HashMap::new();
        }

        match concepts::Entity::find()
            .filter(concepts::Column::ConceptKey.is_in(keys))
            .all(&self.pool)
            .await
        {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|c| {
                    let name = c.display_name.filter(|n| !n.trim().is_empty())?;
                    Some((c.concept_key, name))
                })
                .collect(),
            Err(e) => {
                log::warn!("Failed to load concept names: {e}");
                HashMap::new()
            }
        }
    }

    /// 升级评估由数据库函数 evaluate_user_level_progress 完成
    async fn evaluate_level(&self, user_id: Uuid) -> AppResult<Option<LevelEvaluation>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT evaluate_user_level_progress($1)::jsonb AS result",
            [user_id.into()],
        );
        let Some(row) = self.pool.query_one(stmt).await? else {
            return Ok(None);
        };
        let raw: Option<Value> = row.try_get("", "result")?;
        raw.filter(|v| !v.is_null())
            .map(Self::parse_evaluation)
            .transpose()
    }

    pub fn parse_evaluation(raw: Value) -> AppResult<LevelEvaluation> {
        serde_json::from_value(raw)
            .map_err(|e| AppError::InternalError(format!("Malformed level evaluation: {e}")))
    }

    async fn level_policy(&self, level: i32) -> AppResult<Option<LevelUpPolicy>> {
        let row = level_policies::Entity::find_by_id(level)
            .one(&self.pool)
            .await?;
        Ok(row.map(Self::policy_from_row))
    }

    pub fn policy_from_row(row: level_policies::Model) -> LevelUpPolicy {
        LevelUpPolicy {
            level: row.level,
            min_total_attempts: row.min_total_attempts.map(i64::from),
            min_correct_rate: normalize_policy_rate(row.min_correct_rate),
            min_box_level_ratio: normalize_policy_rate(row.min_box_level_ratio),
        }
    }

    async fn session_strategy(&self, session_id: Uuid) -> AppResult<Option<Value>> {
        let session = sessions::Entity::find_by_id(session_id)
            .one(&self.pool)
            .await?;
        Ok(session
            .and_then(|s| s.strategy_json)
            .filter(|v| !v.is_null()))
    }

    pub fn assemble_facts(now: DateTime<Local>, sources: FactSources) -> DashboardFacts {
        let user = or_default("user", sources.user);
        let history = or_default("level history", sources.history);
        let bundles = or_default("session bundle", sources.bundles);
        let statuses = or_default("concept status", sources.statuses);
        let evaluation = or_default("level evaluation", sources.evaluation);
        let policy = or_default("level policy", sources.policy);
        let strategy = or_default("session strategy", sources.strategy);

        let level = current_level(user.as_ref());
        let tally = Self::tally_bundles(&bundles, now.year(), now.month());

        DashboardFacts {
            level,
            delta30d: Self::level_delta(level, history.first().map(|h| h.level)),
            total_sentence_count: tally.total_sentence_count,
            studied_word_count: tally.studied_word_count,
            calendar: CalendarMonth {
                year: now.year(),
                month: now.month(),
                learned_dates: tally.learned_dates,
            },
            priority_concepts: Self::priority_concepts(&statuses, &sources.concept_names),
            gates: DashboardGates {
                weak_session_enabled: true,
            },
            level_meta: Self::level_meta(level, evaluation.as_ref(), history.last(), policy),
            difficulty: Self::difficulty(
                evaluation.as_ref().and_then(|e| e.stats.as_ref()),
                strategy.as_ref(),
            ),
        }
    }

    pub fn level_delta(current: i32, earliest_in_window: Option<i32>) -> i32 {
        earliest_in_window.map_or(0, |first| current - first)
    }

    pub fn level_meta(
        level: i32,
        evaluation: Option<&LevelEvaluation>,
        recent: Option<&level_history::Model>,
        policy: Option<LevelUpPolicy>,
    ) -> LevelMeta {
        LevelMeta {
            eligible_for_next: evaluation.and_then(|e| e.eligible).unwrap_or(false),
            reason: match evaluation {
                Some(e) => e.reason.clone().unwrap_or_default(),
                None => LEVEL_DATA_UNAVAILABLE.to_string(),
            },
            target_level: target_level(level, evaluation),
            recent_level_entry: recent.map(|h| LevelEntry {
                level: h.level,
                changed_at: h.changed_at,
                source: h.source.clone(),
            }),
            stats: evaluation.and_then(|e| e.stats.clone()),
            policy,
        }
    }

    /// 从最近会话的 strategy_json 读取难度调整，缺失的数值退回评估统计
    pub fn difficulty(stats: Option<&LevelStats>, strategy: Option<&Value>) -> Difficulty {
        let fallback_rate = stats.map(|s| s.recent_correct_rate);
        let fallback_low_box = stats.map(|s| s.low_box_concept_count);

        let Some(strategy) = strategy else {
            return Difficulty {
                applied: false,
                reason: NO_RECENT_ADJUSTMENT.to_string(),
                applied_mix: None,
                policy_level: None,
                recent_correct_rate: fallback_rate,
                low_box_concept_count: fallback_low_box,
            };
        };

        let adjustment = strategy.get("adjustment").filter(|a| !a.is_null());
        let applied = adjustment_field(adjustment, "applied").is_some_and(is_truthy);
        let reason = adjustment_field(adjustment, "reason")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if applied {
                    ADJUSTMENT_APPLIED.to_string()
                } else {
                    ADJUSTMENT_NOT_MET.to_string()
                }
            });
        let applied_mix = strategy
            .get("applied_level_mix")
            .filter(|m| !m.is_null())
            .or_else(|| strategy.get("level_mix").filter(|m| !m.is_null()))
            .and_then(Value::as_object)
            .map(|mix| {
                mix.iter()
                    .filter_map(|(level, weight)| as_number(weight).map(|w| (level.clone(), w)))
                    .collect()
            });

        Difficulty {
            applied,
            reason,
            applied_mix,
            policy_level: adjustment_field(adjustment, "policy_level").and_then(as_integer),
            recent_correct_rate: adjustment_field(adjustment, "recent_correct_rate")
                .and_then(as_number)
                .or(fallback_rate),
            low_box_concept_count: adjustment_field(adjustment, "low_box_concept_count")
                .and_then(as_integer)
                .or(fallback_low_box),
        }
    }

    /// 统计去重后的句子/单词数，以及本月的学习日期
    pub fn tally_bundles(summaries: &[Value], year: i32, month: u32) -> BundleTally {
        let mut sentence_ids = HashSet::new();
        let mut word_ids = HashSet::new();
        let mut phrase_ids = HashSet::new();
        let mut learned = BTreeSet::new();

        for summary in summaries {
            let items = summary
                .get("items")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for item in items {
                let id = match item.get("item_id") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => continue,
                };
                if id.is_empty() {
                    continue;
                }
                let item_type = item
                    .get("type")
                    .and_then(Value::as_str)
                    .or_else(|| item.pointer("/snapshot/type").and_then(Value::as_str))
                    .unwrap_or_default()
                    .to_lowercase();
                match item_type.as_str() {
                    "sentence" => {
                        sentence_ids.insert(id);
                    }
                    "word" => {
                        word_ids.insert(id);
                    }
                    "phrase" => {
                        phrase_ids.insert(id);
                    }
                    _ => {}
                }
            }

            let dates = summary
                .pointer("/calendar/dates")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for raw in dates.iter().filter_map(Value::as_str) {
                let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") else {
                    continue;
                };
                if date.year() == year && date.month() == month {
                    learned.insert(date.format("%Y-%m-%d").to_string());
                }
            }
        }

        BundleTally {
            total_sentence_count: sentence_ids.len() as i64,
            studied_word_count: (word_ids.len() + phrase_ids.len()) as i64,
            learned_dates: learned.into_iter().collect(),
        }
    }

    pub fn priority_concepts(
        statuses: &[ucs::Model],
        names: &HashMap<String, String>,
    ) -> Vec<PriorityConcept> {
        statuses
            .iter()
            .map(|s| {
                let key = if s.concept_key.is_empty() {
                    "general".to_string()
                } else {
                    s.concept_key.clone()
                };
                let struggling = s.wrong_count > s.correct_count;
                PriorityConcept {
                    name: names.get(&s.concept_key).cloned().unwrap_or_else(|| key.clone()),
                    key,
                    reason: if struggling {
                        PriorityReason::RecentDifficulty
                    } else {
                        PriorityReason::Spaced
                    },
                    score: Some(i64::from(s.wrong_count)),
                    trend: Some(if struggling { Trend::Up } else { Trend::Flat }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessStatus, AccessSummary, EMPTY_ACCESS, ReasonCode, compose_dashboard};
    use crate::entities::UserRole;
    use chrono::TimeZone;
    use sea_orm::DbErr;
    use serde_json::json;

    fn status(key: &str, wrong: i32, correct: i32) -> ucs::Model {
        ucs::Model {
            user_id: Uuid::nil(),
            concept_key: key.to_string(),
            wrong_count: wrong,
            correct_count: correct,
        }
    }

    fn user(level: Option<i32>) -> users::Model {
        users::Model {
            id: Uuid::nil(),
            role: UserRole::User,
            current_level: level,
            pro_until: None,
            created_at: None,
        }
    }

    fn history_row(level: i32, days_ago: i64) -> level_history::Model {
        level_history::Model {
            id: i64::from(level),
            user_id: Uuid::nil(),
            level,
            source: "auto".to_string(),
            changed_at: Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
                - Duration::days(days_ago),
        }
    }

    fn local_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn db_err(msg: &str) -> AppError {
        AppError::DatabaseError(DbErr::Custom(msg.to_string()))
    }

    fn sources() -> FactSources {
        FactSources {
            user: Ok(Some(user(Some(4)))),
            history: Ok(vec![history_row(3, 20), history_row(4, 2)]),
            bundles: Ok(vec![json!({
                "items": [{ "item_id": "s1", "type": "sentence" }],
                "calendar": { "dates": ["2025-03-04"] }
            })]),
            statuses: Ok(vec![status("past_tense", 4, 1)]),
            concept_names: HashMap::new(),
            evaluation: Ok(Some(LevelEvaluation {
                eligible: Some(true),
                reason: Some("ready".to_string()),
                current_level: Some(4),
                target_level: Some(5),
                stats: None,
            })),
            policy: Ok(None),
            strategy: Ok(None),
        }
    }

    #[test]
    fn test_level_delta() {
        assert_eq!(DashboardService::level_delta(5, Some(3)), 2);
        assert_eq!(DashboardService::level_delta(5, None), 0);
        assert_eq!(DashboardService::level_delta(2, Some(4)), -2);
    }

    #[test]
    fn test_assemble_all_sections() {
        let facts = DashboardService::assemble_facts(local_now(), sources());

        assert_eq!(facts.level, 4);
        assert_eq!(facts.delta30d, 1);
        assert_eq!(facts.total_sentence_count, 1);
        assert_eq!(facts.calendar.learned_dates, vec!["2025-03-04"]);
        assert_eq!(facts.priority_concepts.len(), 1);
        assert!(facts.level_meta.eligible_for_next);
        assert_eq!(facts.level_meta.target_level, 5);
        assert_eq!(facts.level_meta.reason, "ready");
        let recent = facts.level_meta.recent_level_entry.unwrap();
        assert_eq!(recent.level, 4);
        assert_eq!(recent.source, "auto");
        assert_eq!(facts.difficulty.reason, NO_RECENT_ADJUSTMENT);
    }

    #[test]
    fn test_bundle_failure_keeps_level_and_access() {
        let facts = DashboardService::assemble_facts(
            local_now(),
            FactSources {
                bundles: Err(db_err("session_bundles timed out")),
                ..sources()
            },
        );

        assert_eq!(facts.level, 4);
        assert_eq!(facts.delta30d, 1);
        assert_eq!(facts.total_sentence_count, 0);
        assert_eq!(facts.studied_word_count, 0);
        assert!(facts.calendar.learned_dates.is_empty());
        assert_eq!(facts.priority_concepts[0].key, "past_tense");
        assert_eq!(facts.level_meta.target_level, 5);

        let summary = AccessSummary {
            status: AccessStatus::Pro,
            reason: ReasonCode::OkWithPro,
            ..EMPTY_ACCESS.clone()
        };
        let payload = compose_dashboard(facts, Ok(summary.clone()));
        assert_eq!(payload.access.access, summary);
        assert_eq!(payload.facts.level, 4);
    }

    #[test]
    fn test_every_lookup_failing_falls_back_per_section() {
        let facts = DashboardService::assemble_facts(
            local_now(),
            FactSources {
                user: Err(db_err("users")),
                history: Err(db_err("history")),
                bundles: Err(db_err("bundles")),
                statuses: Err(db_err("statuses")),
                concept_names: HashMap::new(),
                evaluation: Err(db_err("evaluation")),
                policy: Err(db_err("policy")),
                strategy: Err(db_err("strategy")),
            },
        );

        assert_eq!(facts.level, 1);
        assert_eq!(facts.delta30d, 0);
        assert!(facts.priority_concepts.is_empty());
        assert_eq!(facts.calendar.year, 2025);
        assert_eq!(facts.calendar.month, 3);
        assert!(!facts.level_meta.eligible_for_next);
        assert_eq!(facts.level_meta.reason, LEVEL_DATA_UNAVAILABLE);
        assert_eq!(facts.level_meta.target_level, 2);
        assert!(facts.level_meta.recent_level_entry.is_none());
        assert!(!facts.difficulty.applied);
        assert!(facts.gates.weak_session_enabled);
    }

    #[test]
    fn test_zero_level_reads_as_one() {
        assert_eq!(current_level(Some(&user(Some(0)))), 1);
        assert_eq!(current_level(Some(&user(None))), 1);
        assert_eq!(current_level(None), 1);
        assert_eq!(target_level(3, None), 4);
    }

    #[test]
    fn test_parse_evaluation_tolerates_nulls() {
        let eval = DashboardService::parse_evaluation(json!({
            "eligible": null,
            "reason": null,
            "target_level": 3,
            "stats": {
                "recent_session_id": "5b0f6d0e-4f55-4c55-9a55-1b2c3d4e5f60",
                "recent_correct_rate": null,
                "low_box_concept_count": 2
            }
        }))
        .unwrap();

        assert_eq!(eval.eligible, None);
        assert_eq!(eval.target_level, Some(3));
        let stats = eval.stats.unwrap();
        assert_eq!(stats.recent_correct_rate, 0.0);
        assert_eq!(stats.low_box_concept_count, 2);
        assert_eq!(stats.total_attempts, 0);

        assert!(matches!(
            DashboardService::parse_evaluation(json!({ "target_level": "high" })),
            Err(AppError::InternalError(_))
        ));
    }

    #[test]
    fn test_policy_rates_normalized() {
        let policy = DashboardService::policy_from_row(level_policies::Model {
            level: 3,
            min_total_attempts: Some(40),
            min_correct_rate: Some(80.0),
            min_box_level_ratio: Some(0.6),
        });
        assert_eq!(policy.min_total_attempts, Some(40));
        assert_eq!(policy.min_correct_rate, Some(0.8));
        assert_eq!(policy.min_box_level_ratio, Some(0.6));

        assert_eq!(normalize_policy_rate(Some(f64::NAN)), None);
        assert_eq!(normalize_policy_rate(None), None);
    }

    #[test]
    fn test_difficulty_from_strategy() {
        let stats = LevelStats {
            recent_correct_rate: 0.9,
            low_box_concept_count: 7,
            ..LevelStats::default()
        };
        let strategy = json!({
            "adjustment": { "applied": 1, "reason": "", "policy_level": "3", "recent_correct_rate": 0.4 },
            "applied_level_mix": { "2": "0.25", "3": 0.75, "4": "n/a" },
            "level_mix": { "9": 1.0 }
        });

        let difficulty = DashboardService::difficulty(Some(&stats), Some(&strategy));
        assert!(difficulty.applied);
        assert_eq!(difficulty.reason, ADJUSTMENT_APPLIED);
        assert_eq!(difficulty.policy_level, Some(3));
        assert_eq!(difficulty.recent_correct_rate, Some(0.4));
        assert_eq!(difficulty.low_box_concept_count, Some(7));
        let mix = difficulty.applied_mix.unwrap();
        assert_eq!(mix.len(), 2);
        assert_eq!(mix["2"], 0.25);
        assert_eq!(mix["3"], 0.75);
    }

    #[test]
    fn test_difficulty_without_adjustment() {
        let no_strategy = DashboardService::difficulty(None, None);
        assert!(!no_strategy.applied);
        assert_eq!(no_strategy.reason, NO_RECENT_ADJUSTMENT);
        assert_eq!(no_strategy.recent_correct_rate, None);

        let bare = DashboardService::difficulty(None, Some(&json!({ "level_mix": { "1": 1 } })));
        assert!(!bare.applied);
        assert_eq!(bare.reason, ADJUSTMENT_NOT_MET);
        assert_eq!(bare.applied_mix.unwrap()["1"], 1.0);
    }

    #[test]
    fn test_tally_bundles() {
        let summaries = vec![
            json!({
                "items": [
                    { "item_id": "s1", "type": "sentence" },
                    { "item_id": "s1", "type": "Sentence" },
                    { "item_id": "w1", "snapshot": { "type": "word" } },
                    { "item_id": 7, "type": "phrase" },
                    { "item_id": "", "type": "word" },
                    { "type": "word" }
                ],
                "calendar": { "dates": ["2025-03-04", "2025-02-28", "bad", "2025-03-01"] }
            }),
            json!({
                "items": [{ "item_id": "s2", "type": "sentence" }],
                "calendar": { "dates": ["2025-03-04", 20250305] }
            }),
            json!({ "items": "not-an-array" }),
        ];

        let tally = DashboardService::tally_bundles(&summaries, 2025, 3);
        assert_eq!(tally.total_sentence_count, 2);
        assert_eq!(tally.studied_word_count, 2);
        assert_eq!(tally.learned_dates, vec!["2025-03-01", "2025-03-04"]);
    }

    #[test]
    fn test_tally_empty() {
        assert_eq!(
            DashboardService::tally_bundles(&[], 2025, 1),
            BundleTally::default()
        );
    }

    #[test]
    fn test_priority_concepts() {
        let mut names = HashMap::new();
        names.insert("past_tense".to_string(), "Past tense".to_string());

        let concepts = DashboardService::priority_concepts(
            &[status("past_tense", 4, 1), status("articles", 1, 6), status("", 0, 0)],
            &names,
        );

        assert_eq!(concepts.len(), 3);
        assert_eq!(concepts[0].name, "Past tense");
        assert_eq!(concepts[0].reason, PriorityReason::RecentDifficulty);
        assert_eq!(concepts[0].trend, Some(Trend::Up));
        assert_eq!(concepts[0].score, Some(4));
        assert_eq!(concepts[1].name, "articles");
        assert_eq!(concepts[1].reason, PriorityReason::Spaced);
        assert_eq!(concepts[1].trend, Some(Trend::Flat));
        assert_eq!(concepts[2].key, "general");
    }
}
