// ==========================================
// 施肥推荐引擎 - 引擎编排器
// ==========================================
// 用途: 串联 需求计算 → 分配规划 → 预算约束 → 效果评估 → 提示
// 红线: 单次调用无共享可变状态；仅 CropNotFound 为硬失败
// ==========================================

use crate::config::EngineConfig;
use crate::domain::recommendation::{RecommendationRequest, RecommendationResult};
use crate::domain::types::round2;
use crate::engine::budget::total_cost;
use crate::engine::error::EngineResult;
use crate::engine::{
    AdvisoryComposer, AllocationPlanner, BudgetNormalizer, NutrientNeedCalculator,
    OutcomeEstimator,
};
use crate::reference::ReferenceData;
use tracing::{debug, info, instrument, warn};

// ==========================================
// RecommendationEngine - 推荐引擎编排器
// ==========================================
pub struct RecommendationEngine {
    need: NutrientNeedCalculator,
    planner: AllocationPlanner,
    budget: BudgetNormalizer,
    outcome: OutcomeEstimator,
    advisory: AdvisoryComposer,
    default_season: String,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            need: NutrientNeedCalculator::new(&config),
            planner: AllocationPlanner::new(),
            budget: BudgetNormalizer::new(),
            outcome: OutcomeEstimator::new(&config),
            advisory: AdvisoryComposer::new(),
            default_season: config.default_season,
        }
    }

    /// 生成施肥推荐
    ///
    /// # 参数
    /// - reference: 参考数据快照（调用期间只读）
    /// - request: 推荐请求
    ///
    /// # 返回
    /// - Ok(RecommendationResult)
    /// - Err(EngineError::CropNotFound): 作物精确匹配与包含匹配均失败
    #[instrument(skip(self, reference, request), fields(
        crop = %request.crop_name,
        soil = %request.soil_type,
        land_size = request.land_size,
        stage = %request.growth_stage
    ))]
    pub fn recommend(
        &self,
        reference: &ReferenceData,
        request: &RecommendationRequest,
    ) -> EngineResult<RecommendationResult> {
        info!("开始生成施肥推荐");

        // ==========================================
        // 步骤1: 解析作物与土壤
        // ==========================================
        let crop = reference.find_crop(&request.crop_name)?;
        let soil = reference.find_soil(&request.soil_type);
        debug!(matched_crop = %crop.name, soil_found = soil.is_some(), "步骤1: 参考数据解析完成");

        let land_size = if request.land_size.is_finite() && request.land_size >= 0.0 {
            request.land_size
        } else {
            warn!(land_size = request.land_size, "面积无效，按 0 处理");
            0.0
        };

        // ==========================================
        // 步骤2: 净养分需求
        // ==========================================
        let need = self
            .need
            .calculate(crop, land_size, soil, request.soil_test.as_ref());
        debug!(
            n = need.nitrogen,
            p = need.phosphorus,
            k = need.potassium,
            "步骤2: 养分需求计算完成"
        );

        // ==========================================
        // 步骤3: 分配规划
        // ==========================================
        let candidates = reference.candidate_products(request.prefer_organic);
        let plan = self.planner.plan(&need, &candidates, land_size);
        let mut lines = plan.lines;
        debug!(lines = lines.len(), coverage = ?plan.coverage, "步骤3: 分配规划完成");

        // ==========================================
        // 步骤4: 预算约束
        // ==========================================
        let budget_ratio = self.budget.normalize(&mut lines, request.budget);
        let total = total_cost(&lines);
        debug!(total_cost = total, budget_ratio = ?budget_ratio, "步骤4: 预算约束完成");

        // ==========================================
        // 步骤5: 效果评估与标注
        // ==========================================
        let expected_yield_increase = self.outcome.estimate_yield(request.soil_test.is_some());
        self.outcome.annotate(&mut lines, &request.growth_stage);

        // ==========================================
        // 步骤6: 施肥提示
        // ==========================================
        let season = request
            .season
            .as_deref()
            .unwrap_or(self.default_season.as_str());
        let tips = self.advisory.compose(&request.soil_type, season);

        info!(
            crop = %crop.name,
            lines = lines.len(),
            total_cost = total,
            expected_yield_increase,
            full_coverage = plan.coverage.is_full(),
            "施肥推荐生成完成"
        );

        Ok(RecommendationResult {
            crop: crop.name.clone(),
            fertilizer_plan: lines,
            total_cost: total,
            expected_yield_increase,
            nutrient_summary: need,
            tips,
            coverage: plan.coverage,
            budget_ratio: budget_ratio.map(round2),
        })
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
