// ==========================================
// 施肥推荐引擎 - 施肥记录仓储
// ==========================================
// 职责: fertilizer_application_log 表的写入与查询
// ==========================================

use crate::domain::application_log::ApplicationLog;
use crate::repository::error::{format_timestamp, parse_timestamp, RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct ApplicationLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ApplicationLogRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, log: &ApplicationLog) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO fertilizer_application_log (
                log_id, farm_id, fertilizer_name, application_date, quantity_kg,
                application_method, growth_stage, cost, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                log.log_id,
                log.farm_id,
                log.fertilizer_name,
                log.application_date.format("%Y-%m-%d").to_string(),
                log.quantity_kg,
                log.application_method,
                log.growth_stage,
                log.cost,
                log.notes,
                format_timestamp(&log.created_at),
            ],
        )?;
        Ok(())
    }

    /// 按农场查询施肥记录（施用日期倒序）
    pub fn list_by_farm(&self, farm_id: i64) -> RepositoryResult<Vec<ApplicationLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                log_id, farm_id, fertilizer_name, application_date, quantity_kg,
                application_method, growth_stage, cost, notes, created_at
            FROM fertilizer_application_log
            WHERE farm_id = ?1
            ORDER BY application_date DESC, created_at DESC
            "#,
        )?;

        #[allow(clippy::type_complexity)]
        let rows: Vec<(String, i64, String, String, f64, Option<String>, Option<String>, Option<f64>, Option<String>, String)> = stmt
            .query_map(params![farm_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(log_id, farm_id, fertilizer_name, date, quantity_kg, method, stage, cost, notes, created_at)| {
                    let application_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                        RepositoryError::FieldValueError {
                            field: "application_date".to_string(),
                            message: format!("{} ({})", e, date),
                        }
                    })?;
                    Ok(ApplicationLog {
                        log_id,
                        farm_id,
                        fertilizer_name,
                        application_date,
                        quantity_kg,
                        application_method: method,
                        growth_stage: stage,
                        cost,
                        notes,
                        created_at: parse_timestamp("created_at", &created_at)?,
                    })
                },
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use crate::domain::application_log::ApplicationLogInput;

    fn setup() -> ApplicationLogRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ApplicationLogRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_insert_and_list_ordered_by_date() {
        let repo = setup();
        let early = ApplicationLog::from_input(
            5,
            ApplicationLogInput {
                fertilizer_name: "DAP".to_string(),
                quantity_kg: 78.26,
                application_date: NaiveDate::from_ymd_opt(2026, 6, 1),
                application_method: Some("Basal application".to_string()),
                ..Default::default()
            },
        );
        let late = ApplicationLog::from_input(
            5,
            ApplicationLogInput {
                fertilizer_name: "Urea".to_string(),
                quantity_kg: 36.86,
                application_date: NaiveDate::from_ymd_opt(2026, 6, 26),
                cost: Some(239.59),
                ..Default::default()
            },
        );
        repo.insert(&early).unwrap();
        repo.insert(&late).unwrap();

        let logs = repo.list_by_farm(5).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].fertilizer_name, "Urea");
        assert_eq!(logs[0].cost, Some(239.59));
        assert_eq!(logs[1].application_method.as_deref(), Some("Basal application"));
        assert!(repo.list_by_farm(6).unwrap().is_empty());
    }
}
