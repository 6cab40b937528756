// ==========================================
// 施肥推荐引擎 - 应用层
// ==========================================
// 职责: 组装数据库、参考数据与 API 实例
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
