// ==========================================
// 施肥推荐引擎 - 施肥记录领域模型
// ==========================================
// 用途: 农户实际施肥登记，与推荐方案对照
// 对齐: fertilizer_application_log 表
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ApplicationLog - 施肥记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationLog {
    // ===== 主键 =====
    pub log_id: String,            // 记录ID (UUID)
    pub farm_id: i64,              // 地块ID

    // ===== 施肥内容 =====
    pub fertilizer_name: String,   // 肥料名称
    pub application_date: NaiveDate, // 施用日期
    pub quantity_kg: f64,          // 施用量 (kg)
    pub application_method: Option<String>, // 施用方式
    pub growth_stage: Option<String>, // 施用时生育期
    pub cost: Option<f64>,         // 实际花费

    // ===== 扩展字段 =====
    pub notes: Option<String>,     // 备注
    pub created_at: DateTime<Utc>, // 登记时间
}

/// 施肥登记输入（由 API 层补齐 ID 与时间）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationLogInput {
    pub fertilizer_name: String,
    pub quantity_kg: f64,
    #[serde(default)]
    pub application_date: Option<NaiveDate>,
    #[serde(default)]
    pub application_method: Option<String>,
    #[serde(default)]
    pub growth_stage: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ApplicationLog {
    pub fn from_input(farm_id: i64, input: ApplicationLogInput) -> Self {
        let now = Utc::now();
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            farm_id,
            fertilizer_name: input.fertilizer_name,
            application_date: input.application_date.unwrap_or_else(|| now.date_naive()),
            quantity_kg: input.quantity_kg,
            application_method: input.application_method,
            growth_stage: input.growth_stage,
            cost: input.cost,
            notes: input.notes,
            created_at: now,
        }
    }
}
