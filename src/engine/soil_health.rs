// ==========================================
// 施肥推荐引擎 - 土壤健康评分与解读
// ==========================================
// 评分: N/P/K/pH 各 25 分，总分 0~100
// 解读: 总体等级 + 分项状态 + 改良建议
// ==========================================

use crate::domain::soil::{SoilHealthGrade, SoilInterpretation, SoilTestValues};
use tracing::instrument;

// ===== 适宜区间（kg/ha）=====
const NITROGEN_OPTIMAL: (f64, f64) = (280.0, 560.0);
const PHOSPHORUS_OPTIMAL: (f64, f64) = (11.0, 25.0);
const POTASSIUM_OPTIMAL: (f64, f64) = (110.0, 280.0);
const PH_OPTIMAL: (f64, f64) = (6.5, 7.5);
const PH_TOLERABLE: (f64, f64) = (6.0, 8.0);
const NEUTRAL_PH: f64 = 7.0;

pub struct SoilHealthEngine {}

impl SoilHealthEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 土壤健康评分（pH 缺失按中性 7 计）
    #[instrument(skip(self))]
    pub fn score(&self, values: &SoilTestValues) -> u32 {
        let nutrient_score = |value: f64, (low, high): (f64, f64)| -> u32 {
            if value >= low && value <= high {
                25
            } else if value > high {
                15
            } else {
                10
            }
        };

        let ph = values.ph.unwrap_or(NEUTRAL_PH);
        let ph_score = if ph >= PH_OPTIMAL.0 && ph <= PH_OPTIMAL.1 {
            25
        } else if ph >= PH_TOLERABLE.0 && ph < PH_TOLERABLE.1 {
            15
        } else {
            5
        };

        nutrient_score(values.nitrogen, NITROGEN_OPTIMAL)
            + nutrient_score(values.phosphorus, PHOSPHORUS_OPTIMAL)
            + nutrient_score(values.potassium, POTASSIUM_OPTIMAL)
            + ph_score
    }

    pub fn grade(score: u32) -> SoilHealthGrade {
        match score {
            s if s >= 80 => SoilHealthGrade::Excellent,
            s if s >= 60 => SoilHealthGrade::Good,
            s if s >= 40 => SoilHealthGrade::Fair,
            _ => SoilHealthGrade::Poor,
        }
    }

    /// 检测解读
    pub fn interpret(&self, values: &SoilTestValues, score: u32) -> SoilInterpretation {
        let mut recommendations = Vec::new();

        let nitrogen = if values.nitrogen < NITROGEN_OPTIMAL.0 {
            recommendations.push("Apply 50 kg/acre Urea during vegetative stage".to_string());
            "Low - Apply Urea or DAP"
        } else if values.nitrogen > NITROGEN_OPTIMAL.1 {
            "High - Reduce nitrogen fertilizers"
        } else {
            "Optimal"
        };

        let phosphorus = if values.phosphorus < PHOSPHORUS_OPTIMAL.0 {
            recommendations.push("Apply 25 kg/acre DAP as basal dose".to_string());
            "Low - Apply DAP or SSP"
        } else if values.phosphorus > PHOSPHORUS_OPTIMAL.1 {
            "High - Skip phosphatic fertilizers"
        } else {
            "Optimal"
        };

        let potassium = if values.potassium < POTASSIUM_OPTIMAL.0 {
            recommendations.push("Apply 15 kg/acre MOP".to_string());
            "Low - Apply MOP"
        } else if values.potassium > POTASSIUM_OPTIMAL.1 {
            "High - Maintain current levels"
        } else {
            "Optimal"
        };

        // pH 缺失时不给出改良建议
        let ph = match values.ph {
            Some(ph) if ph < PH_TOLERABLE.0 => {
                recommendations.push("Apply agricultural lime 200 kg/acre".to_string());
                "Acidic - Apply lime"
            }
            Some(ph) if ph > PH_TOLERABLE.1 => {
                recommendations.push("Apply gypsum 250 kg/acre".to_string());
                "Alkaline - Apply gypsum"
            }
            _ => "Optimal",
        };

        SoilInterpretation {
            overall_health: Self::grade(score),
            nitrogen: nitrogen.to_string(),
            phosphorus: phosphorus.to_string(),
            potassium: potassium.to_string(),
            ph: ph.to_string(),
            recommendations,
        }
    }
}

impl Default for SoilHealthEngine {
    fn default() -> Self {
        Self::new()
    }
}
