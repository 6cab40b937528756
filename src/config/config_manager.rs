// ==========================================
// 施肥推荐引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 引擎标定配置 =====

    /// 加载引擎配置
    ///
    /// 每个键独立覆写；键不存在取默认值，格式错误记录告警后取默认值
    pub fn load_engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        let defaults = EngineConfig::default();

        Ok(EngineConfig {
            nitrogen_reference_max: self.parse_or(
                config_keys::NITROGEN_REFERENCE_MAX,
                defaults.nitrogen_reference_max,
            )?,
            phosphorus_reference_max: self.parse_or(
                config_keys::PHOSPHORUS_REFERENCE_MAX,
                defaults.phosphorus_reference_max,
            )?,
            potassium_reference_max: self.parse_or(
                config_keys::POTASSIUM_REFERENCE_MAX,
                defaults.potassium_reference_max,
            )?,
            yield_base_pct: self.parse_or(config_keys::YIELD_BASE_PCT, defaults.yield_base_pct)?,
            yield_soil_test_bonus_pct: self.parse_or(
                config_keys::YIELD_SOIL_TEST_BONUS_PCT,
                defaults.yield_soil_test_bonus_pct,
            )?,
            yield_cap_pct: self.parse_or(config_keys::YIELD_CAP_PCT, defaults.yield_cap_pct)?,
            default_season: self
                .get_config_value(config_keys::DEFAULT_SEASON)?
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.default_season),
            history_limit: self.parse_or(config_keys::HISTORY_LIMIT, defaults.history_limit)?,
        })
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 土壤检测标定
    pub const NITROGEN_REFERENCE_MAX: &str = "soil_test_n_reference_max";
    pub const PHOSPHORUS_REFERENCE_MAX: &str = "soil_test_p_reference_max";
    pub const POTASSIUM_REFERENCE_MAX: &str = "soil_test_k_reference_max";

    // 增产估计
    pub const YIELD_BASE_PCT: &str = "yield_base_pct";
    pub const YIELD_SOIL_TEST_BONUS_PCT: &str = "yield_soil_test_bonus_pct";
    pub const YIELD_CAP_PCT: &str = "yield_cap_pct";

    // 建议
    pub const DEFAULT_SEASON: &str = "default_season";

    // 历史
    pub const HISTORY_LIMIT: &str = "recommendation_history_limit";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[test]
    fn test_empty_table_yields_defaults() {
        let (_tmp, manager) = create_manager();
        assert_eq!(manager.load_engine_config().unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_override_and_malformed_value() {
        let (_tmp, manager) = create_manager();
        manager
            .set_global_config_value(config_keys::YIELD_CAP_PCT, "30")
            .unwrap();
        manager
            .set_global_config_value(config_keys::NITROGEN_REFERENCE_MAX, "lots")
            .unwrap();
        manager
            .set_global_config_value(config_keys::DEFAULT_SEASON, "Rabi")
            .unwrap();

        let config = manager.load_engine_config().unwrap();
        assert_eq!(config.yield_cap_pct, 30.0);
        assert_eq!(config.nitrogen_reference_max, 560.0);
        assert_eq!(config.default_season, "Rabi");
    }

    #[test]
    fn test_snapshot_contains_written_keys() {
        let (_tmp, manager) = create_manager();
        manager
            .set_global_config_value(config_keys::HISTORY_LIMIT, "5")
            .unwrap();
        manager
            .set_global_config_value(config_keys::HISTORY_LIMIT, "7")
            .unwrap();
        let snapshot: HashMap<String, String> =
            serde_json::from_str(&manager.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.get(config_keys::HISTORY_LIMIT), Some(&"7".to_string()));
        assert_eq!(manager.load_engine_config().unwrap().history_limit, 7);
    }
}
