// ==========================================
// 施肥推荐引擎 - 施肥提示
// ==========================================

pub const TIP_MOIST_SOIL: &str = "Always apply fertilizers in moist soil";
pub const TIP_SPLIT_NITROGEN: &str = "Split nitrogen application helps reduce losses";
pub const TIP_MONSOON_LEACHING: &str = "During monsoon, apply urea in split doses to prevent leaching";
pub const TIP_BLACK_SOIL: &str = "Black soil retains nutrients well";

pub const KHARIF_SEASON: &str = "Kharif";
pub const BLACK_SOIL: &str = "Black soil";

pub struct AdvisoryComposer {}

impl AdvisoryComposer {
    pub fn new() -> Self {
        Self {}
    }

    /// 固定两条提示 + 季节/土壤相关提示（精确匹配）
    pub fn compose(&self, soil_type: &str, season: &str) -> Vec<String> {
        let mut tips = vec![TIP_MOIST_SOIL.to_string(), TIP_SPLIT_NITROGEN.to_string()];

        if season == KHARIF_SEASON {
            tips.push(TIP_MONSOON_LEACHING.to_string());
        }
        if soil_type == BLACK_SOIL {
            tips.push(TIP_BLACK_SOIL.to_string());
        }

        tips
    }
}

impl Default for AdvisoryComposer {
    fn default() -> Self {
        Self::new()
    }
}
