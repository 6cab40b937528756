// ==========================================
// 施肥推荐引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建全部业务表（幂等），并登记 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS soil_test (
            soil_test_id TEXT PRIMARY KEY,
            farm_id INTEGER NOT NULL,
            nitrogen_level REAL NOT NULL,
            phosphorus_level REAL NOT NULL,
            potassium_level REAL NOT NULL,
            ph_level REAL,
            organic_carbon REAL,
            ec_level REAL,
            soil_health_score INTEGER NOT NULL,
            test_date TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_soil_test_farm_date
            ON soil_test (farm_id, test_date DESC);

        CREATE TABLE IF NOT EXISTS fertilizer_recommendation (
            recommendation_id TEXT PRIMARY KEY,
            farm_id INTEGER NOT NULL,
            crop_name TEXT NOT NULL,
            growth_stage TEXT NOT NULL,
            soil_test_id TEXT REFERENCES soil_test(soil_test_id) ON DELETE SET NULL,
            fertilizer_plan_json TEXT NOT NULL,
            total_cost REAL NOT NULL,
            expected_yield_increase REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'suggested',
            farmer_feedback TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_recommendation_farm_created
            ON fertilizer_recommendation (farm_id, created_at DESC);

        CREATE TABLE IF NOT EXISTS fertilizer_application_log (
            log_id TEXT PRIMARY KEY,
            farm_id INTEGER NOT NULL,
            fertilizer_name TEXT NOT NULL,
            application_date TEXT NOT NULL,
            quantity_kg REAL NOT NULL,
            application_method TEXT,
            growth_stage TEXT,
            cost REAL,
            notes TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
