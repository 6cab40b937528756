// ==========================================
// 施肥推荐引擎 - 肥料分配规划
// ==========================================
// 依据: 净养分需求 + 候选肥料集合
// 顺序: 磷(基肥) → 剩余氮(两次追肥) → 钾(1/3 基肥 + 2/3 追肥)
// 红线: 无可用产品时不报错，缺口记录在 Coverage 中
// ==========================================

use crate::domain::product::FertilizerProduct;
use crate::domain::recommendation::{Coverage, NutrientNeed, NutrientSupply, ScheduleLine};
use crate::domain::types::{round2, ApplicationMethod, ApplicationStage, Nutrient};
use tracing::{debug, instrument, warn};

/// 首选磷肥
pub const PREFERRED_PHOSPHORUS_PRODUCT: &str = "DAP";
/// 首选氮肥
pub const PREFERRED_NITROGEN_PRODUCT: &str = "Urea";
/// 首选钾肥
pub const PREFERRED_POTASSIUM_PRODUCT: &str = "MOP";
/// 替代产品的最低养分含量（%）
pub const FALLBACK_MIN_CONTENT_PCT: f64 = 10.0;

// ==========================================
// AllocationPlan - 规划输出
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlan {
    pub lines: Vec<ScheduleLine>,
    pub coverage: Coverage,
}

// ==========================================
// 施用说明
// ==========================================

/// 按施肥方式查说明，并附加产品相关注意事项
pub fn application_instructions(method: ApplicationMethod, product_name: &str) -> String {
    let mut text = match method {
        ApplicationMethod::BasalApplication => {
            "Broadcast uniformly on the soil surface before sowing/planting and incorporate into the top 10-15 cm of soil."
        }
        ApplicationMethod::Broadcast => "Spread evenly across the field by hand or spreader.",
        ApplicationMethod::TopDressing => {
            "Apply near the root zone when the soil is moist. Avoid applying on wet foliage to prevent scorching."
        }
        ApplicationMethod::SideDressing => {
            "Apply in bands 5-10 cm away from the plant row and slightly below the soil surface."
        }
        ApplicationMethod::Foliar => {
            "Dissolve in water and spray on leaves during cooler parts of the day (morning/evening)."
        }
        ApplicationMethod::SeedTreatment => {
            "Mix with seeds using a sticking agent (like jaggery solution) and dry in shade before sowing."
        }
    }
    .to_string();

    if product_name.contains("Urea") {
        text.push_str(" Ensure soil moisture is adequate to minimize volatilization losses.");
    }
    if product_name.contains("DAP") {
        text.push_str(" Do not mix directly with seeds to avoid germination issues.");
    }

    text
}

// ==========================================
// AllocationPlanner - 肥料分配规划器
// ==========================================
pub struct AllocationPlanner {}

impl AllocationPlanner {
    pub fn new() -> Self {
        Self {}
    }

    /// 选择覆盖某养分的产品：首选名称命中，否则取第一个含量 >10% 的候选
    pub fn select_product<'a>(
        &self,
        candidates: &'a [FertilizerProduct],
        preferred: &str,
        nutrient: Nutrient,
    ) -> Option<&'a FertilizerProduct> {
        candidates
            .iter()
            .find(|p| p.name == preferred)
            .or_else(|| {
                candidates
                    .iter()
                    .find(|p| p.content_pct(nutrient) > FALLBACK_MIN_CONTENT_PCT)
            })
    }

    /// 生成施肥计划
    #[instrument(skip(self, need, candidates), fields(
        need_n = need.nitrogen,
        need_p = need.phosphorus,
        need_k = need.potassium,
        candidates = candidates.len()
    ))]
    pub fn plan(
        &self,
        need: &NutrientNeed,
        candidates: &[FertilizerProduct],
        land_size: f64,
    ) -> AllocationPlan {
        let mut lines = Vec::new();
        let mut missing = Vec::new();

        // ===== 磷：整量基施 =====
        let mut incidental_nitrogen = 0.0;
        if need.phosphorus > 0.0 {
            match self.quantity_for(candidates, PREFERRED_PHOSPHORUS_PRODUCT, Nutrient::Phosphorus, need.phosphorus) {
                Some((product, quantity)) => {
                    let line = build_line(
                        product,
                        quantity,
                        land_size,
                        ApplicationStage::Basal,
                        ApplicationMethod::BasalApplication,
                        None,
                    );
                    incidental_nitrogen = line.npk_provided.nitrogen;
                    lines.push(line);
                }
                None => missing.push(Nutrient::Phosphorus),
            }
        }

        // ===== 剩余氮：两次等量追肥 =====
        let residual_nitrogen = (need.nitrogen - incidental_nitrogen).max(0.0);
        debug!(incidental_nitrogen, residual_nitrogen, "磷肥附带氮已扣除");
        if residual_nitrogen > 0.0 {
            match self.quantity_for(candidates, PREFERRED_NITROGEN_PRODUCT, Nutrient::Nitrogen, residual_nitrogen) {
                Some((product, quantity)) => {
                    let dose = quantity / 2.0;
                    lines.push(build_line(
                        product,
                        dose,
                        land_size,
                        ApplicationStage::FirstTopDressing,
                        ApplicationMethod::SideDressing,
                        Some(Nutrient::Nitrogen),
                    ));
                    lines.push(build_line(
                        product,
                        dose,
                        land_size,
                        ApplicationStage::SecondTopDressing,
                        ApplicationMethod::TopDressing,
                        Some(Nutrient::Nitrogen),
                    ));
                }
                None => missing.push(Nutrient::Nitrogen),
            }
        }

        // ===== 钾：1/3 基施，2/3 追施 =====
        if need.potassium > 0.0 {
            match self.quantity_for(candidates, PREFERRED_POTASSIUM_PRODUCT, Nutrient::Potassium, need.potassium) {
                Some((product, quantity)) => {
                    lines.push(build_line(
                        product,
                        quantity / 3.0,
                        land_size,
                        ApplicationStage::Basal,
                        ApplicationMethod::BasalApplication,
                        Some(Nutrient::Potassium),
                    ));
                    lines.push(build_line(
                        product,
                        quantity * 2.0 / 3.0,
                        land_size,
                        ApplicationStage::SecondTopDressing,
                        ApplicationMethod::TopDressing,
                        Some(Nutrient::Potassium),
                    ));
                }
                None => missing.push(Nutrient::Potassium),
            }
        }

        if !missing.is_empty() {
            warn!(missing = ?missing, "候选肥料无法覆盖全部养分需求");
        }

        AllocationPlan {
            lines,
            coverage: Coverage::from_missing(missing),
        }
    }

    /// 选定产品并折算总施用量；含量为 0 时视为无法覆盖
    fn quantity_for<'a>(
        &self,
        candidates: &'a [FertilizerProduct],
        preferred: &str,
        nutrient: Nutrient,
        amount: f64,
    ) -> Option<(&'a FertilizerProduct, f64)> {
        let product = self.select_product(candidates, preferred, nutrient)?;
        let fraction = product.fraction(nutrient);
        if fraction <= 0.0 {
            return None;
        }
        Some((product, amount / fraction))
    }
}

impl Default for AllocationPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// 构建计划行
///
/// credited 为 None 时计入产品全部养分（磷肥行，附带氮参与后续扣减）；
/// 为 Some 时只计入目标养分
fn build_line(
    product: &FertilizerProduct,
    quantity: f64,
    land_size: f64,
    stage: ApplicationStage,
    method: ApplicationMethod,
    credited: Option<Nutrient>,
) -> ScheduleLine {
    let per_acre = if land_size > 0.0 { quantity / land_size } else { 0.0 };
    let supplied = |nutrient: Nutrient| -> f64 {
        match credited {
            Some(target) if target != nutrient => 0.0,
            _ => round2(quantity * product.fraction(nutrient)),
        }
    };

    ScheduleLine {
        stage_tag: stage,
        stage_label: stage.label().to_string(),
        product_name: product.name.clone(),
        quantity_kg: round2(quantity),
        quantity_per_acre: round2(per_acre),
        cost: round2(quantity * product.price_per_kg),
        application_method: method,
        instructions: application_instructions(method, &product.name),
        timing: stage.timing().to_string(),
        npk_provided: NutrientSupply {
            nitrogen: supplied(Nutrient::Nitrogen),
            phosphorus: supplied(Nutrient::Phosphorus),
            potassium: supplied(Nutrient::Potassium),
        },
        annotation: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ProductClass;
    use crate::reference::ReferenceData;

    fn need(n: f64, p: f64, k: f64) -> NutrientNeed {
        NutrientNeed {
            nitrogen: n,
            phosphorus: p,
            potassium: k,
        }
    }

    #[test]
    fn test_full_chemical_plan_order_and_stages() {
        let data = ReferenceData::builtin();
        let candidates = data.candidate_products(false);
        let plan = AllocationPlanner::new().plan(&need(48.0, 36.0, 16.0), &candidates, 2.0);

        let stages: Vec<_> = plan.lines.iter().map(|l| (l.product_name.as_str(), l.stage_tag)).collect();
        assert_eq!(
            stages,
            vec![
                ("DAP", ApplicationStage::Basal),
                ("Urea", ApplicationStage::FirstTopDressing),
                ("Urea", ApplicationStage::SecondTopDressing),
                ("MOP", ApplicationStage::Basal),
                ("MOP", ApplicationStage::SecondTopDressing),
            ]
        );
        assert!(plan.coverage.is_full());

        // DAP: 36 / 0.46 = 78.26 kg，附带氮 14.09
        let dap = &plan.lines[0];
        assert_eq!(dap.quantity_kg, 78.26);
        assert_eq!(dap.quantity_per_acre, 39.13);
        assert_eq!(dap.npk_provided.nitrogen, 14.09);
        assert_eq!(dap.application_method, ApplicationMethod::BasalApplication);
        assert!(dap.instructions.ends_with("Do not mix directly with seeds to avoid germination issues."));
    }

    #[test]
    fn test_residual_nitrogen_split_evenly() {
        let data = ReferenceData::builtin();
        let candidates = data.candidate_products(false);
        let plan = AllocationPlanner::new().plan(&need(48.0, 36.0, 0.0), &candidates, 2.0);

        let first = &plan.lines[1];
        let second = &plan.lines[2];
        assert_eq!(first.quantity_kg, second.quantity_kg);
        assert_eq!(first.application_method, ApplicationMethod::SideDressing);
        assert_eq!(second.application_method, ApplicationMethod::TopDressing);
        // (48 - 14.09) / 0.46 / 2 = 36.86
        assert_eq!(first.quantity_kg, 36.86);
        assert!(first.instructions.contains("volatilization"));
    }

    #[test]
    fn test_potassium_split_one_third_basal() {
        let data = ReferenceData::builtin();
        let candidates = data.candidate_products(false);
        let plan = AllocationPlanner::new().plan(&need(0.0, 0.0, 18.0), &candidates, 1.0);

        assert_eq!(plan.lines.len(), 2);
        // 18 / 0.6 = 30 kg → 10 + 20
        assert_eq!(plan.lines[0].quantity_kg, 10.0);
        assert_eq!(plan.lines[1].quantity_kg, 20.0);
        assert_eq!(plan.lines[0].cost, 180.0);
        assert_eq!(plan.lines[1].npk_provided.potassium, 12.0);
    }

    #[test]
    fn test_organic_candidates_record_missing_potassium() {
        let data = ReferenceData::builtin();
        let candidates = data.candidate_products(true);
        let plan = AllocationPlanner::new().plan(&need(40.0, 20.0, 20.0), &candidates, 1.0);

        // 内置有机肥养分含量均不超过 10%，三种养分都无法覆盖
        assert!(plan.lines.is_empty());
        assert!(plan.coverage.missing().contains(&Nutrient::Potassium));
        assert!(plan.coverage.missing().contains(&Nutrient::Phosphorus));
        assert!(plan.coverage.missing().contains(&Nutrient::Nitrogen));
    }

    #[test]
    fn test_organic_with_phosphorus_source_keeps_other_lines() {
        let candidates = vec![
            FertilizerProduct::new("Bone Meal", (3.0, 15.0, 0.0), 14.0, ProductClass::Organic),
            FertilizerProduct::new("Fish Meal", (12.0, 3.0, 0.0), 30.0, ProductClass::Organic),
        ];
        let plan = AllocationPlanner::new().plan(&need(20.0, 15.0, 10.0), &candidates, 1.0);
        assert_eq!(plan.lines.len(), 3);
        assert!(plan.lines.iter().all(|l| l.npk_provided.potassium == 0.0));
        assert_eq!(plan.coverage.missing(), &[Nutrient::Potassium]);
    }

    #[test]
    fn test_fallback_product_when_preferred_absent() {
        let candidates = vec![
            FertilizerProduct::new("SSP", (0.0, 16.0, 0.0), 8.5, ProductClass::Chemical),
            FertilizerProduct::new("Ammonium Sulphate", (21.0, 0.0, 0.0), 12.0, ProductClass::Chemical),
        ];
        let plan = AllocationPlanner::new().plan(&need(21.0, 16.0, 0.0), &candidates, 1.0);
        assert_eq!(plan.lines[0].product_name, "SSP");
        assert_eq!(plan.lines[0].quantity_kg, 100.0);
        assert_eq!(plan.lines[1].product_name, "Ammonium Sulphate");
        assert_eq!(plan.lines[1].quantity_kg, 50.0);
    }

    #[test]
    fn test_compound_potassium_source_credits_only_potassium() {
        let candidates = vec![
            FertilizerProduct::new("Urea", (46.0, 0.0, 0.0), 6.5, ProductClass::Chemical),
            FertilizerProduct::new("DAP", (18.0, 46.0, 0.0), 27.0, ProductClass::Chemical),
            FertilizerProduct::new("NPK 10:26:26", (10.0, 26.0, 26.0), 22.0, ProductClass::Chemical),
        ];
        let plan = AllocationPlanner::new().plan(&need(48.0, 36.0, 16.0), &candidates, 2.0);

        let k_lines: Vec<_> = plan
            .lines
            .iter()
            .filter(|l| l.product_name == "NPK 10:26:26")
            .collect();
        assert_eq!(k_lines.len(), 2);
        for line in &k_lines {
            assert_eq!(line.npk_provided.nitrogen, 0.0);
            assert_eq!(line.npk_provided.phosphorus, 0.0);
            assert!(line.npk_provided.potassium > 0.0);
        }

        let supplied = |nutrient: Nutrient| -> f64 {
            plan.lines.iter().map(|l| l.npk_provided.get(nutrient)).sum()
        };
        assert!(supplied(Nutrient::Nitrogen) <= 48.02);
        assert!((supplied(Nutrient::Phosphorus) - 36.0).abs() < 0.02);
        assert!((supplied(Nutrient::Potassium) - 16.0).abs() < 0.02);
    }

    #[test]
    fn test_zero_land_size_gives_zero_per_acre() {
        let data = ReferenceData::builtin();
        let candidates = data.candidate_products(false);
        let plan = AllocationPlanner::new().plan(&need(10.0, 5.0, 5.0), &candidates, 0.0);
        assert!(plan.lines.iter().all(|l| l.quantity_per_acre == 0.0));
    }

    #[test]
    fn test_zero_need_emits_nothing() {
        let data = ReferenceData::builtin();
        let candidates = data.candidate_products(false);
        let plan = AllocationPlanner::new().plan(&need(0.0, 0.0, 0.0), &candidates, 3.0);
        assert!(plan.lines.is_empty());
        assert!(plan.coverage.is_full());
    }

    #[test]
    fn test_instruction_table() {
        assert_eq!(
            application_instructions(ApplicationMethod::Broadcast, "FYM"),
            "Spread evenly across the field by hand or spreader."
        );
        assert!(application_instructions(ApplicationMethod::Foliar, "Urea").ends_with("volatilization losses."));
    }
}
