// ==========================================
// 施肥推荐引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::FertilizerApi;
use crate::db::open_sqlite_connection;
use crate::importer::ReferenceImporter;
use crate::reference::{ReferenceCatalog, ReferenceData};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "FERTILIZER_ADVISOR_DB_PATH";
/// 参考表目录环境变量（crops.csv / products.csv / soils.csv）
pub const REFERENCE_DIR_ENV: &str = "FERTILIZER_ADVISOR_REFERENCE_DIR";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 参考数据目录（可热替换）
    pub catalog: Arc<ReferenceCatalog>,

    /// 施肥推荐API
    pub fertilizer_api: Arc<FertilizerApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开数据库并建表
    /// 2. 加载参考数据（环境变量指定目录，否则内置表）
    /// 3. 创建API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let catalog = Arc::new(ReferenceCatalog::new(load_reference_from_env()));
        let fertilizer_api = FertilizerApi::new(conn, catalog.clone())
            .map_err(|e| format!("无法初始化施肥推荐API: {}", e))?;

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            catalog,
            fertilizer_api: Arc::new(fertilizer_api),
        })
    }
}

/// 读取参考数据：环境变量目录加载失败时回退内置表
fn load_reference_from_env() -> ReferenceData {
    let dir = match std::env::var(REFERENCE_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => dir,
        _ => return ReferenceData::builtin(),
    };

    match ReferenceImporter::new().load_dir(dir.trim()) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("参考数据目录加载失败，使用内置数据: {}", e);
            ReferenceData::builtin()
        }
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./fertilizer_advisor.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("fertilizer-advisor-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("fertilizer-advisor");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("fertilizer_advisor.db");
    }

    path.to_string_lossy().to_string()
}
