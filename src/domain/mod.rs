// ==========================================
// 施肥推荐引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod application_log;
pub mod crop;
pub mod product;
pub mod recommendation;
pub mod soil;
pub mod types;

// 重导出核心类型
pub use application_log::{ApplicationLog, ApplicationLogInput};
pub use crop::CropRequirement;
pub use product::{FertilizerProduct, ProductQuery};
pub use recommendation::{
    Coverage, LineAnnotation, NutrientNeed, NutrientSupply, RecommendationRecord,
    RecommendationRequest, RecommendationResult, ScheduleLine,
};
pub use soil::{
    RawReading, SoilHealthGrade, SoilInterpretation, SoilProfile, SoilTestReading, SoilTestRecord,
    SoilTestValues,
};
pub use types::{
    round2, ApplicationMethod, ApplicationStage, GrowthStage, Nutrient, ProductClass,
    RecommendationStatus,
};
