// ==========================================
// 施肥推荐引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

pub mod application_log_repo;
pub mod error;
pub mod recommendation_repo;
pub mod soil_test_repo;

pub use application_log_repo::ApplicationLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use recommendation_repo::RecommendationRepository;
pub use soil_test_repo::SoilTestRepository;
