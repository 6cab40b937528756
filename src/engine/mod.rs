// ==========================================
// 施肥推荐引擎 - 引擎层
// ==========================================
// 职责: 需求计算、分配规划、预算约束、效果评估、施肥提示、土壤评分
// 红线: Engine 不访问数据库，不做 I/O
// ==========================================

pub mod advisory;
pub mod allocation;
pub mod budget;
pub mod error;
pub mod nutrient_need;
pub mod orchestrator;
pub mod outcome;
pub mod soil_health;

pub use advisory::AdvisoryComposer;
pub use allocation::{application_instructions, AllocationPlan, AllocationPlanner};
pub use budget::{total_cost, BudgetNormalizer};
pub use error::{EngineError, EngineResult};
pub use nutrient_need::NutrientNeedCalculator;
pub use orchestrator::RecommendationEngine;
pub use outcome::OutcomeEstimator;
pub use soil_health::SoilHealthEngine;
