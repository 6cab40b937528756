// ==========================================
// 施肥推荐引擎 - 土壤数据
// ==========================================
// 职责: 土壤类型养分保持率、土壤检测读数、检测记录
// 红线: 检测读数解析失败不报错，整体忽略本次检测
// ==========================================

use crate::domain::types::Nutrient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// SoilProfile - 土壤类型保持率
// ==========================================

/// 土壤养分保持率（0~1，表示土壤自然满足的需求比例）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilProfile {
    pub soil_type: String,
    pub nitrogen_retention: f64,
    pub phosphorus_retention: f64,
    pub potassium_retention: f64,
}

impl SoilProfile {
    pub fn new(soil_type: &str, nitrogen: f64, phosphorus: f64, potassium: f64) -> Self {
        Self {
            soil_type: soil_type.to_string(),
            nitrogen_retention: nitrogen,
            phosphorus_retention: phosphorus,
            potassium_retention: potassium,
        }
    }

    pub fn retention(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen_retention,
            Nutrient::Phosphorus => self.phosphorus_retention,
            Nutrient::Potassium => self.potassium_retention,
        }
    }
}

// ==========================================
// SoilTestReading - 原始检测读数
// ==========================================

/// 单项原始读数：化验单可能给出数字或文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawReading {
    Number(f64),
    Text(String),
}

impl RawReading {
    /// 解析为非负有限数，失败返回 None
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            RawReading::Number(v) => Some(*v),
            RawReading::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|v| v.is_finite() && *v >= 0.0)
    }
}

impl From<f64> for RawReading {
    fn from(v: f64) -> Self {
        RawReading::Number(v)
    }
}

impl From<&str> for RawReading {
    fn from(s: &str) -> Self {
        RawReading::Text(s.to_string())
    }
}

/// 土壤检测读数（调用方输入）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilTestReading {
    #[serde(default)]
    pub nitrogen: Option<RawReading>,
    #[serde(default)]
    pub phosphorus: Option<RawReading>,
    #[serde(default)]
    pub potassium: Option<RawReading>,
    #[serde(default)]
    pub ph: Option<RawReading>,
}

impl SoilTestReading {
    pub fn new(
        nitrogen: impl Into<RawReading>,
        phosphorus: impl Into<RawReading>,
        potassium: impl Into<RawReading>,
    ) -> Self {
        Self {
            nitrogen: Some(nitrogen.into()),
            phosphorus: Some(phosphorus.into()),
            potassium: Some(potassium.into()),
            ph: None,
        }
    }

    /// 解析 N/P/K 三项读数
    ///
    /// 任一项缺失或无法解析时返回 None（整体忽略检测）；pH 为可选项
    pub fn parsed(&self) -> Option<SoilTestValues> {
        let nitrogen = self.nitrogen.as_ref()?.parse()?;
        let phosphorus = self.phosphorus.as_ref()?.parse()?;
        let potassium = self.potassium.as_ref()?.parse()?;
        let ph = self.ph.as_ref().and_then(RawReading::parse);

        Some(SoilTestValues {
            nitrogen,
            phosphorus,
            potassium,
            ph,
        })
    }
}

impl From<&SoilTestValues> for SoilTestReading {
    fn from(values: &SoilTestValues) -> Self {
        Self {
            nitrogen: Some(RawReading::Number(values.nitrogen)),
            phosphorus: Some(RawReading::Number(values.phosphorus)),
            potassium: Some(RawReading::Number(values.potassium)),
            ph: values.ph.map(RawReading::Number),
        }
    }
}

/// 已解析的检测值（kg/ha 口径）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilTestValues {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    #[serde(default)]
    pub ph: Option<f64>,
}

impl SoilTestValues {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Potassium => self.potassium,
        }
    }
}

// ==========================================
// 土壤检测记录（持久化对象）
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilTestRecord {
    pub soil_test_id: String,
    pub farm_id: i64,
    #[serde(flatten)]
    pub values: SoilTestValues,
    pub organic_carbon: Option<f64>,
    pub ec_level: Option<f64>,
    pub soil_health_score: u32,
    pub test_date: DateTime<Utc>,
}

// ==========================================
// 土壤检测解读
// ==========================================

/// 土壤总体健康等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilHealthGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// 检测解读结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilInterpretation {
    pub overall_health: SoilHealthGrade,
    pub nitrogen: String,
    pub phosphorus: String,
    pub potassium: String,
    pub ph: String,
    pub recommendations: Vec<String>,
}
