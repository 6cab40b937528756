// ==========================================
// 施肥推荐引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按作物/土壤/面积/生育期计算施肥方案（确定性规则求值）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 参考数据 - 作物/肥料/土壤只读快照
pub mod reference;

// 引擎层 - 计算规则
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部参考表
pub mod importer;

// 配置层 - 引擎标定参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ApplicationMethod, ApplicationStage, GrowthStage, Nutrient, ProductClass,
    RecommendationStatus,
};

// 领域实体
pub use domain::{
    ApplicationLog, Coverage, CropRequirement, FertilizerProduct, NutrientNeed,
    RecommendationRecord, RecommendationRequest, RecommendationResult, ScheduleLine,
    SoilProfile, SoilTestReading,
};

// 参考数据
pub use reference::{ReferenceCatalog, ReferenceData};

// 引擎
pub use engine::{EngineError, EngineResult, RecommendationEngine, SoilHealthEngine};

// API
pub use api::{ApiError, ApiResult, FertilizerApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "施肥推荐引擎";
