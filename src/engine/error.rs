// ==========================================
// 施肥推荐引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 作物未收录是唯一的硬失败，其余异常一律降级处理
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 精确匹配与模糊匹配均失败，附带全部已收录作物供调用方展示
    #[error("作物未收录: {crop}（可选作物: {}）", .available_crops.join(", "))]
    CropNotFound {
        crop: String,
        available_crops: Vec<String>,
    },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
