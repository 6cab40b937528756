// ==========================================
// 施肥推荐引擎 - 养分需求计算
// ==========================================
// 输入: 作物需求 + 面积 + 土壤保持率(可选) + 土壤检测(可选)
// 输出: 净 N/P/K 需求（≥0，两位小数）
// 红线: 纯函数，不报错；检测读数异常整体忽略
// ==========================================

use crate::config::EngineConfig;
use crate::domain::crop::CropRequirement;
use crate::domain::recommendation::NutrientNeed;
use crate::domain::soil::{SoilProfile, SoilTestReading, SoilTestValues};
use crate::domain::types::{round2, Nutrient};
use tracing::instrument;

// ==========================================
// NutrientNeedCalculator - 养分需求计算器
// ==========================================
pub struct NutrientNeedCalculator {
    nitrogen_reference_max: f64,
    phosphorus_reference_max: f64,
    potassium_reference_max: f64,
}

impl NutrientNeedCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            nitrogen_reference_max: config.nitrogen_reference_max,
            phosphorus_reference_max: config.phosphorus_reference_max,
            potassium_reference_max: config.potassium_reference_max,
        }
    }

    fn reference_max(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen_reference_max,
            Nutrient::Phosphorus => self.phosphorus_reference_max,
            Nutrient::Potassium => self.potassium_reference_max,
        }
    }

    /// 检测读数折算为有效性比例（0~1）
    pub fn availability(&self, values: &SoilTestValues, nutrient: Nutrient) -> f64 {
        let max = self.reference_max(nutrient);
        if max <= 0.0 {
            return 1.0;
        }
        (values.get(nutrient) / max).min(1.0)
    }

    /// 计算净养分需求
    ///
    /// 步骤：
    /// 1) 基础需求 = 单位面积需求 × 面积
    /// 2) 有土壤保持率时乘以 (1 - 保持率)
    /// 3) 检测读数三项均可解析时乘以 (1 - 有效性)
    /// 4) 截断为 ≥0 后保留两位小数
    #[instrument(skip(self, crop, soil, soil_test), fields(
        crop = %crop.name,
        soil_found = soil.is_some(),
        soil_test_supplied = soil_test.is_some()
    ))]
    pub fn calculate(
        &self,
        crop: &CropRequirement,
        land_size: f64,
        soil: Option<&SoilProfile>,
        soil_test: Option<&SoilTestReading>,
    ) -> NutrientNeed {
        let test_values = match soil_test {
            Some(reading) => {
                let parsed = reading.parsed();
                if parsed.is_none() {
                    tracing::warn!("土壤检测读数无法解析，忽略本次检测");
                }
                parsed
            }
            None => None,
        };

        let need_for = |nutrient: Nutrient| -> f64 {
            let mut need = crop.demand(nutrient) * land_size;

            if let Some(profile) = soil {
                need *= 1.0 - profile.retention(nutrient);
            }

            if let Some(values) = test_values.as_ref() {
                need *= 1.0 - self.availability(values, nutrient);
            }

            round2(need.max(0.0))
        };

        NutrientNeed {
            nitrogen: need_for(Nutrient::Nitrogen),
            phosphorus: need_for(Nutrient::Phosphorus),
            potassium: need_for(Nutrient::Potassium),
        }
    }
}

impl Default for NutrientNeedCalculator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::soil::RawReading;

    fn wheat() -> CropRequirement {
        CropRequirement::new("Wheat", 60.0, 30.0, 20.0, 3)
    }

    #[test]
    fn test_no_adjustments_is_linear_in_land() {
        let calc = NutrientNeedCalculator::default();
        let need = calc.calculate(&wheat(), 2.5, None, None);
        assert_eq!(need.nitrogen, 150.0);
        assert_eq!(need.phosphorus, 75.0);
        assert_eq!(need.potassium, 50.0);
    }

    #[test]
    fn test_alluvial_soil_retention() {
        let calc = NutrientNeedCalculator::default();
        let alluvial = SoilProfile::new("Alluvial soil", 0.6, 0.4, 0.6);
        let need = calc.calculate(&wheat(), 2.0, Some(&alluvial), None);
        assert_eq!(need.nitrogen, 48.0);
        assert_eq!(need.phosphorus, 36.0);
        assert_eq!(need.potassium, 16.0);
    }

    #[test]
    fn test_soil_test_at_reference_max_zeroes_need() {
        let calc = NutrientNeedCalculator::default();
        let reading = SoilTestReading::new(560.0, 40.0, 280.0);
        let need = calc.calculate(&wheat(), 1.0, None, Some(&reading));
        assert_eq!(need.nitrogen, 0.0);
        assert_eq!(need.phosphorus, 0.0);
        assert_eq!(need.potassium, 0.0);
    }

    #[test]
    fn test_partial_availability() {
        let calc = NutrientNeedCalculator::default();
        // N 280/560 = 0.5, P 5/25 = 0.2, K 70/280 = 0.25
        let reading = SoilTestReading::new(280.0, 5.0, 70.0);
        let need = calc.calculate(&wheat(), 1.0, None, Some(&reading));
        assert_eq!(need.nitrogen, 30.0);
        assert_eq!(need.phosphorus, 24.0);
        assert_eq!(need.potassium, 15.0);
    }

    #[test]
    fn test_malformed_soil_test_is_ignored() {
        let calc = NutrientNeedCalculator::default();
        let reading = SoilTestReading {
            potassium: Some(RawReading::from("??")),
            ..SoilTestReading::new(280.0, 5.0, 0.0)
        };
        let need = calc.calculate(&wheat(), 1.0, None, Some(&reading));
        assert_eq!(need.nitrogen, 60.0);
        assert_eq!(need.phosphorus, 30.0);
    }

    #[test]
    fn test_retention_above_one_clamps_to_zero() {
        let calc = NutrientNeedCalculator::default();
        let odd = SoilProfile::new("Odd soil", 1.2, 0.0, 0.0);
        let need = calc.calculate(&wheat(), 1.0, Some(&odd), None);
        assert_eq!(need.nitrogen, 0.0);
        assert_eq!(need.phosphorus, 30.0);
    }
}
