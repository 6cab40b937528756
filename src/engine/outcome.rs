// ==========================================
// 施肥推荐引擎 - 效果评估
// ==========================================
// 职责: 增产估计 + 计划行可执行性/距今天数标注
// 红线: 标注只追加字段，不修改数量与费用
// ==========================================

use crate::config::EngineConfig;
use crate::domain::recommendation::{LineAnnotation, ScheduleLine};
use crate::domain::types::{round2, ApplicationStage, GrowthStage};

pub struct OutcomeEstimator {
    base_pct: f64,
    soil_test_bonus_pct: f64,
    cap_pct: f64,
}

impl OutcomeEstimator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_pct: config.yield_base_pct,
            soil_test_bonus_pct: config.yield_soil_test_bonus_pct,
            cap_pct: config.yield_cap_pct,
        }
    }

    /// 增产估计（%）：基础值，提供土壤检测时加成，封顶
    pub fn estimate_yield(&self, soil_test_supplied: bool) -> f64 {
        let mut estimate = self.base_pct;
        if soil_test_supplied {
            estimate += self.soil_test_bonus_pct;
        }
        round2(estimate.min(self.cap_pct))
    }

    /// 当前生育期下该阶段是否可立即执行
    pub fn is_actionable(stage: ApplicationStage, current: &GrowthStage) -> bool {
        matches!(
            (stage, current),
            (ApplicationStage::Basal, GrowthStage::Sowing | GrowthStage::PreSowing)
                | (ApplicationStage::FirstTopDressing, GrowthStage::Vegetative)
        )
    }

    pub fn annotate(&self, lines: &mut [ScheduleLine], current: &GrowthStage) {
        for line in lines.iter_mut() {
            line.annotation = Some(LineAnnotation {
                actionable: Self::is_actionable(line.stage_tag, current),
                days_from_now: line.stage_tag.days_from_now(),
            });
        }
    }
}

impl Default for OutcomeEstimator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
