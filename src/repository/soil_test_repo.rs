// ==========================================
// 施肥推荐引擎 - 土壤检测仓储
// ==========================================
// 职责: soil_test 表的写入与最新记录查询
// ==========================================

use crate::domain::soil::{SoilTestRecord, SoilTestValues};
use crate::repository::error::{format_timestamp, parse_timestamp, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct SoilTestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SoilTestRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, record: &SoilTestRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO soil_test (
                soil_test_id, farm_id, nitrogen_level, phosphorus_level, potassium_level,
                ph_level, organic_carbon, ec_level, soil_health_score, test_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.soil_test_id,
                record.farm_id,
                record.values.nitrogen,
                record.values.phosphorus,
                record.values.potassium,
                record.values.ph,
                record.organic_carbon,
                record.ec_level,
                record.soil_health_score,
                format_timestamp(&record.test_date),
            ],
        )?;
        Ok(())
    }

    /// 查询农场最新一次检测
    pub fn find_latest(&self, farm_id: i64) -> RepositoryResult<Option<SoilTestRecord>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT
                    soil_test_id, farm_id, nitrogen_level, phosphorus_level, potassium_level,
                    ph_level, organic_carbon, ec_level, soil_health_score, test_date
                FROM soil_test
                WHERE farm_id = ?1
                ORDER BY test_date DESC
                LIMIT 1
                "#,
                params![farm_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        SoilTestValues {
                            nitrogen: row.get(2)?,
                            phosphorus: row.get(3)?,
                            potassium: row.get(4)?,
                            ph: row.get(5)?,
                        },
                        row.get::<_, Option<f64>>(6)?,
                        row.get::<_, Option<f64>>(7)?,
                        row.get::<_, u32>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((soil_test_id, farm_id, values, organic_carbon, ec_level, score, test_date)) => {
                Ok(Some(SoilTestRecord {
                    soil_test_id,
                    farm_id,
                    values,
                    organic_carbon,
                    ec_level,
                    soil_health_score: score,
                    test_date: parse_timestamp("test_date", &test_date)?,
                }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use chrono::{Duration, Utc};

    fn setup() -> SoilTestRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        SoilTestRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn record(id: &str, farm_id: i64, nitrogen: f64, days_ago: i64) -> SoilTestRecord {
        SoilTestRecord {
            soil_test_id: id.to_string(),
            farm_id,
            values: SoilTestValues {
                nitrogen,
                phosphorus: 12.0,
                potassium: 150.0,
                ph: Some(6.8),
            },
            organic_carbon: Some(0.6),
            ec_level: None,
            soil_health_score: 90,
            test_date: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_find_latest_picks_newest() {
        let repo = setup();
        repo.insert(&record("old", 9, 200.0, 30)).unwrap();
        repo.insert(&record("new", 9, 320.0, 1)).unwrap();

        let latest = repo.find_latest(9).unwrap().unwrap();
        assert_eq!(latest.soil_test_id, "new");
        assert_eq!(latest.values.nitrogen, 320.0);
        assert_eq!(latest.values.ph, Some(6.8));
        assert!(repo.find_latest(10).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let repo = setup();
        repo.insert(&record("dup", 1, 200.0, 0)).unwrap();
        let err = repo.insert(&record("dup", 1, 200.0, 0)).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }
}
