// ==========================================
// 施肥推荐引擎 - 参考数据层
// ==========================================
// 职责: 作物/肥料/土壤参考表的快照与目录
// 约束: 进程启动时构造一次，之后只读；热加载走整体替换
// ==========================================

pub mod catalog;
pub mod store;

pub use catalog::ReferenceCatalog;
pub use store::{builtin_crops, builtin_products, builtin_soils, ReferenceData};
