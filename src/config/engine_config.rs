use serde::{Deserialize, Serialize};

/// 引擎标定参数
///
/// 存储位置：config_kv（scope_id='global'），逐键覆写，缺省取 Default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 土壤检测"完全充足"读数（N，kg/ha）
    #[serde(default = "default_nitrogen_reference_max")]
    pub nitrogen_reference_max: f64,

    /// 土壤检测"完全充足"读数（P，kg/ha）
    #[serde(default = "default_phosphorus_reference_max")]
    pub phosphorus_reference_max: f64,

    /// 土壤检测"完全充足"读数（K，kg/ha）
    #[serde(default = "default_potassium_reference_max")]
    pub potassium_reference_max: f64,

    /// 增产估计基础值（%）
    #[serde(default = "default_yield_base_pct")]
    pub yield_base_pct: f64,

    /// 提供土壤检测时的增产加成（%）
    #[serde(default = "default_yield_soil_test_bonus_pct")]
    pub yield_soil_test_bonus_pct: f64,

    /// 增产估计上限（%）
    #[serde(default = "default_yield_cap_pct")]
    pub yield_cap_pct: f64,

    /// 请求未给出季节时使用的季节
    #[serde(default = "default_season")]
    pub default_season: String,

    /// 推荐历史查询条数上限
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_nitrogen_reference_max() -> f64 {
    560.0
}

fn default_phosphorus_reference_max() -> f64 {
    25.0
}

fn default_potassium_reference_max() -> f64 {
    280.0
}

fn default_yield_base_pct() -> f64 {
    10.0
}

fn default_yield_soil_test_bonus_pct() -> f64 {
    5.0
}

fn default_yield_cap_pct() -> f64 {
    25.0
}

fn default_season() -> String {
    "Kharif".to_string()
}

fn default_history_limit() -> u32 {
    20
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nitrogen_reference_max: default_nitrogen_reference_max(),
            phosphorus_reference_max: default_phosphorus_reference_max(),
            potassium_reference_max: default_potassium_reference_max(),
            yield_base_pct: default_yield_base_pct(),
            yield_soil_test_bonus_pct: default_yield_soil_test_bonus_pct(),
            yield_cap_pct: default_yield_cap_pct(),
            default_season: default_season(),
            history_limit: default_history_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_falls_back_per_field() {
        let config: EngineConfig = serde_json::from_str(r#"{"yield_cap_pct": 30.0}"#).unwrap();
        assert_eq!(config.yield_cap_pct, 30.0);
        assert_eq!(config.nitrogen_reference_max, 560.0);
        assert_eq!(config.default_season, "Kharif");
    }
}
