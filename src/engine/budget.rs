// ==========================================
// 施肥推荐引擎 - 预算约束
// ==========================================
// 规则: 总费用超出预算时，所有计划行按同一比例缩放
// 红线: 预算 ≤0 / 缺省 / 总费用为 0 时不做任何修改
// ==========================================

use crate::domain::recommendation::ScheduleLine;
use crate::domain::types::round2;
use tracing::{info, instrument};

/// 计划总费用（两位小数）
pub fn total_cost(lines: &[ScheduleLine]) -> f64 {
    round2(lines.iter().map(|line| line.cost).sum())
}

// ==========================================
// BudgetNormalizer - 预算归一化
// ==========================================
pub struct BudgetNormalizer {}

impl BudgetNormalizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 按预算缩放计划行
    ///
    /// # 返回
    /// - Some(ratio): 触发缩放时的比例 budget / total
    /// - None: 未触发
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub fn normalize(&self, lines: &mut [ScheduleLine], budget: Option<f64>) -> Option<f64> {
        let budget = budget.filter(|b| b.is_finite() && *b > 0.0)?;

        let total = total_cost(lines);
        if total <= 0.0 || total <= budget {
            return None;
        }

        let ratio = budget / total;
        for line in lines.iter_mut() {
            line.quantity_kg = round2(line.quantity_kg * ratio);
            line.quantity_per_acre = round2(line.quantity_per_acre * ratio);
            line.cost = round2(line.cost * ratio);
            line.npk_provided = line.npk_provided.scaled(ratio);
        }

        info!(budget, total, ratio, "计划费用超出预算，已按比例缩放");
        Some(ratio)
    }
}

impl Default for BudgetNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
