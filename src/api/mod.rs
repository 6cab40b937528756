// ==========================================
// 施肥推荐引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供命令行及上层服务调用
// ==========================================

pub mod error;
pub mod fertilizer_api;

pub use error::{ApiError, ApiResult};
pub use fertilizer_api::{
    FarmRecommendation, FertilizerApi, ReferenceSummary, SoilTestReport, SoilTestUpload,
};
