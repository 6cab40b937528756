// ==========================================
// 施肥推荐引擎 - 推荐结果实体
// ==========================================
// 职责: 养分需求、施肥计划行、推荐结果、覆盖情况、推荐请求
// 红线: 推荐结果独占其计划行，不跨调用共享
// ==========================================

use crate::domain::soil::SoilTestReading;
use crate::domain::types::{
    round2, ApplicationMethod, ApplicationStage, GrowthStage, Nutrient, RecommendationStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// NutrientNeed - 净养分需求
// ==========================================

/// 整块地的净养分需求（kg，已截断为 ≥0 并保留两位小数）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientNeed {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl NutrientNeed {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Potassium => self.potassium,
        }
    }
}

// ==========================================
// NutrientSupply - 计划行提供的养分
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientSupply {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
}

impl NutrientSupply {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Potassium => self.potassium,
        }
    }

    pub fn scaled(&self, ratio: f64) -> Self {
        Self {
            nitrogen: round2(self.nitrogen * ratio),
            phosphorus: round2(self.phosphorus * ratio),
            potassium: round2(self.potassium * ratio),
        }
    }
}

// ==========================================
// ScheduleLine - 施肥计划行
// ==========================================

/// 计划行附加标注（由 OutcomeEstimator 写入）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAnnotation {
    pub actionable: bool,
    pub days_from_now: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleLine {
    /// 阶段枚举（计算用）
    pub stage_tag: ApplicationStage,
    /// 阶段展示文本
    #[serde(rename = "stage")]
    pub stage_label: String,
    /// 肥料产品名称
    #[serde(rename = "fertilizer")]
    pub product_name: String,
    pub quantity_kg: f64,
    pub quantity_per_acre: f64,
    pub cost: f64,
    pub application_method: ApplicationMethod,
    pub instructions: String,
    pub timing: String,
    pub npk_provided: NutrientSupply,
    #[serde(flatten)]
    pub annotation: Option<LineAnnotation>,
}

impl ScheduleLine {
    pub fn is_actionable(&self) -> bool {
        self.annotation.map(|a| a.actionable).unwrap_or(false)
    }
}

// ==========================================
// Coverage - 养分覆盖情况
// ==========================================

/// 计划是否覆盖全部养分需求
///
/// Partial 表示有养分存在需求但候选产品无法提供，对应计划行被省略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Coverage {
    Full,
    Partial { missing: Vec<Nutrient> },
}

impl Coverage {
    pub fn from_missing(missing: Vec<Nutrient>) -> Self {
        if missing.is_empty() {
            Coverage::Full
        } else {
            Coverage::Partial { missing }
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Coverage::Full)
    }

    pub fn missing(&self) -> &[Nutrient] {
        match self {
            Coverage::Full => &[],
            Coverage::Partial { missing } => missing,
        }
    }
}

// ==========================================
// RecommendationRequest - 推荐请求
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub crop_name: String,
    pub soil_type: String,
    pub land_size: f64,
    pub growth_stage: GrowthStage,
    #[serde(default)]
    pub soil_test: Option<SoilTestReading>,
    #[serde(default)]
    pub prefer_organic: bool,
    /// ≤0 或缺省表示不限预算
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub season: Option<String>,
}

impl RecommendationRequest {
    pub fn new(crop_name: &str, soil_type: &str, land_size: f64, growth_stage: &str) -> Self {
        Self {
            crop_name: crop_name.to_string(),
            soil_type: soil_type.to_string(),
            land_size,
            growth_stage: GrowthStage::parse(growth_stage),
            soil_test: None,
            prefer_organic: false,
            budget: None,
            season: None,
        }
    }

    pub fn with_soil_test(mut self, soil_test: SoilTestReading) -> Self {
        self.soil_test = Some(soil_test);
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_season(mut self, season: &str) -> Self {
        self.season = Some(season.to_string());
        self
    }

    pub fn organic(mut self) -> Self {
        self.prefer_organic = true;
        self
    }
}

// ==========================================
// RecommendationResult - 推荐结果
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// 实际匹配到的作物名称
    pub crop: String,
    pub fertilizer_plan: Vec<ScheduleLine>,
    pub total_cost: f64,
    pub expected_yield_increase: f64,
    pub nutrient_summary: NutrientNeed,
    pub tips: Vec<String>,
    pub coverage: Coverage,
    /// 预算缩放比例（两位小数，未触发预算约束时为 None）
    #[serde(default)]
    pub budget_ratio: Option<f64>,
}

impl RecommendationResult {
    /// 计划行合计提供的某种养分
    pub fn supplied(&self, nutrient: Nutrient) -> f64 {
        self.fertilizer_plan
            .iter()
            .map(|line| line.npk_provided.get(nutrient))
            .sum()
    }
}

// ==========================================
// RecommendationRecord - 推荐历史（持久化对象）
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub recommendation_id: String,
    pub farm_id: i64,
    pub crop_name: String,
    pub growth_stage: String,
    pub soil_test_id: Option<String>,
    pub fertilizer_plan: Vec<ScheduleLine>,
    pub total_cost: f64,
    pub expected_yield_increase: f64,
    pub status: RecommendationStatus,
    pub farmer_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RecommendationRecord {
    pub fn from_result(
        farm_id: i64,
        growth_stage: &GrowthStage,
        soil_test_id: Option<String>,
        result: &RecommendationResult,
    ) -> Self {
        Self {
            recommendation_id: uuid::Uuid::new_v4().to_string(),
            farm_id,
            crop_name: result.crop.clone(),
            growth_stage: growth_stage.to_string(),
            soil_test_id,
            fertilizer_plan: result.fertilizer_plan.clone(),
            total_cost: result.total_cost,
            expected_yield_increase: result.expected_yield_increase,
            status: RecommendationStatus::Suggested,
            farmer_feedback: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_from_missing() {
        assert!(Coverage::from_missing(vec![]).is_full());
        let partial = Coverage::from_missing(vec![Nutrient::Potassium]);
        assert_eq!(partial.missing(), &[Nutrient::Potassium]);
    }

    #[test]
    fn test_coverage_serialization_is_tagged() {
        let json = serde_json::to_value(Coverage::Partial {
            missing: vec![Nutrient::Phosphorus],
        })
        .unwrap();
        assert_eq!(json["status"], "partial");
        assert_eq!(json["missing"][0], "phosphorus");
    }

    #[test]
    fn test_supply_scaled_rounds() {
        let supply = NutrientSupply {
            nitrogen: 10.0,
            phosphorus: 36.0,
            potassium: 0.0,
        };
        let scaled = supply.scaled(1.0 / 3.0);
        assert_eq!(scaled.nitrogen, 3.33);
        assert_eq!(scaled.phosphorus, 12.0);
        assert_eq!(scaled.potassium, 0.0);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: RecommendationRequest = serde_json::from_str(
            r#"{"crop_name":"Wheat","soil_type":"Red soil","land_size":1.5,"growth_stage":"Sowing"}"#,
        )
        .unwrap();
        assert!(!request.prefer_organic);
        assert!(request.budget.is_none());
        assert_eq!(request.growth_stage, GrowthStage::Sowing);
    }
}
