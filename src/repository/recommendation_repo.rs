// ==========================================
// 施肥推荐引擎 - 推荐历史仓储
// ==========================================
// 职责: fertilizer_recommendation 表的读写
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::recommendation::{RecommendationRecord, ScheduleLine};
use crate::domain::types::RecommendationStatus;
use crate::repository::error::{format_timestamp, parse_timestamp, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    recommendation_id, farm_id, crop_name, growth_stage, soil_test_id,
    fertilizer_plan_json, total_cost, expected_yield_increase,
    status, farmer_feedback, created_at
"#;

/// 数据库行（未解码）
struct RecommendationRow {
    recommendation_id: String,
    farm_id: i64,
    crop_name: String,
    growth_stage: String,
    soil_test_id: Option<String>,
    plan_json: String,
    total_cost: f64,
    expected_yield_increase: f64,
    status: String,
    farmer_feedback: Option<String>,
    created_at: String,
}

impl RecommendationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            recommendation_id: row.get(0)?,
            farm_id: row.get(1)?,
            crop_name: row.get(2)?,
            growth_stage: row.get(3)?,
            soil_test_id: row.get(4)?,
            plan_json: row.get(5)?,
            total_cost: row.get(6)?,
            expected_yield_increase: row.get(7)?,
            status: row.get(8)?,
            farmer_feedback: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_record(self) -> RepositoryResult<RecommendationRecord> {
        let fertilizer_plan: Vec<ScheduleLine> = serde_json::from_str(&self.plan_json)?;
        Ok(RecommendationRecord {
            created_at: parse_timestamp("created_at", &self.created_at)?,
            recommendation_id: self.recommendation_id,
            farm_id: self.farm_id,
            crop_name: self.crop_name,
            growth_stage: self.growth_stage,
            soil_test_id: self.soil_test_id,
            fertilizer_plan,
            total_cost: self.total_cost,
            expected_yield_increase: self.expected_yield_increase,
            status: RecommendationStatus::from_db_str(&self.status),
            farmer_feedback: self.farmer_feedback,
        })
    }
}

// ==========================================
// RecommendationRepository - 推荐历史仓储
// ==========================================
pub struct RecommendationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecommendationRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, record: &RecommendationRecord) -> RepositoryResult<()> {
        let plan_json = serde_json::to_string(&record.fertilizer_plan)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO fertilizer_recommendation (
                recommendation_id, farm_id, crop_name, growth_stage, soil_test_id,
                fertilizer_plan_json, total_cost, expected_yield_increase,
                status, farmer_feedback, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.recommendation_id,
                record.farm_id,
                record.crop_name,
                record.growth_stage,
                record.soil_test_id,
                plan_json,
                record.total_cost,
                record.expected_yield_increase,
                record.status.to_db_str(),
                record.farmer_feedback,
                format_timestamp(&record.created_at),
            ],
        )?;
        Ok(())
    }

    /// 按主键查询
    ///
    /// # 返回
    /// - Ok(Some(record)): 找到
    /// - Ok(None): 未找到
    pub fn find_by_id(&self, recommendation_id: &str) -> RepositoryResult<Option<RecommendationRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM fertilizer_recommendation WHERE recommendation_id = ?1",
            SELECT_COLUMNS
        );
        let row = conn
            .query_row(&sql, params![recommendation_id], RecommendationRow::from_row)
            .optional()?;
        row.map(RecommendationRow::into_record).transpose()
    }

    /// 按农场查询历史，最新在前
    pub fn list_by_farm(&self, farm_id: i64, limit: u32) -> RepositoryResult<Vec<RecommendationRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM fertilizer_recommendation WHERE farm_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![farm_id, limit], RecommendationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RecommendationRow::into_record).collect()
    }

    /// 更新状态与农户反馈
    pub fn update_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
        feedback: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE fertilizer_recommendation
            SET status = ?1, farmer_feedback = COALESCE(?2, farmer_feedback)
            WHERE recommendation_id = ?3
            "#,
            params![status.to_db_str(), feedback, recommendation_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "FertilizerRecommendation".to_string(),
                id: recommendation_id.to_string(),
            });
        }
        Ok(())
    }
}
