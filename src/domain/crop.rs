// ==========================================
// 施肥推荐引擎 - 作物养分需求
// ==========================================
// 职责: 作物 N/P/K 需求（每单位面积）与生育阶段数
// 红线: 参考数据只读，不在调用期间修改
// ==========================================

use crate::domain::types::Nutrient;
use serde::{Deserialize, Serialize};

/// 作物养分需求（kg/acre）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRequirement {
    /// 作物名称（查找键）
    pub name: String,
    /// 氮需求（kg/acre）
    pub nitrogen_kg: f64,
    /// 磷需求（kg/acre）
    pub phosphorus_kg: f64,
    /// 钾需求（kg/acre）
    pub potassium_kg: f64,
    /// 生育阶段数
    pub stages: u32,
}

impl CropRequirement {
    pub fn new(name: &str, nitrogen_kg: f64, phosphorus_kg: f64, potassium_kg: f64, stages: u32) -> Self {
        Self {
            name: name.to_string(),
            nitrogen_kg,
            phosphorus_kg,
            potassium_kg,
            stages,
        }
    }

    /// 单位面积需求
    pub fn demand(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen_kg,
            Nutrient::Phosphorus => self.phosphorus_kg,
            Nutrient::Potassium => self.potassium_kg,
        }
    }

    /// 名称匹配：参考名称（忽略大小写）出现在输入中
    ///
    /// 例如 "Wheat" 匹配 "Durum wheat"，反之不成立
    pub fn matches_loosely(&self, input: &str) -> bool {
        input.to_lowercase().contains(&self.name.to_lowercase())
    }
}
