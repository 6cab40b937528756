// ==========================================
// 施肥推荐引擎 - 领域类型定义
// ==========================================
// 职责: 养分、肥料类别、施肥阶段、施肥方式、生育期等枚举
// 红线: 阶段判定使用枚举标签，不解析展示文本
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 统一保留两位小数（所有对外数值字段）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ==========================================
// 养分 (Nutrient)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Nitrogen,   // N
    Phosphorus, // P
    Potassium,  // K
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nutrient::Nitrogen => write!(f, "nitrogen"),
            Nutrient::Phosphorus => write!(f, "phosphorus"),
            Nutrient::Potassium => write!(f, "potassium"),
        }
    }
}

// ==========================================
// 肥料类别 (Product Class)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductClass {
    Chemical, // 化肥
    Organic,  // 有机肥
}

impl fmt::Display for ProductClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductClass::Chemical => write!(f, "chemical"),
            ProductClass::Organic => write!(f, "organic"),
        }
    }
}

impl std::str::FromStr for ProductClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chemical" => Ok(ProductClass::Chemical),
            "organic" => Ok(ProductClass::Organic),
            other => Err(format!("未知肥料类别: {}", other)),
        }
    }
}

// ==========================================
// 施肥阶段 (Application Stage)
// ==========================================
// 计算用枚举，展示文本由 label() 提供
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStage {
    Basal,              // 基肥
    FirstTopDressing,   // 第一次追肥
    SecondTopDressing,  // 第二次追肥
}

impl ApplicationStage {
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStage::Basal => "Basal (Before Sowing)",
            ApplicationStage::FirstTopDressing => "First Top-dressing (21-30 days)",
            ApplicationStage::SecondTopDressing => "Second Top-dressing (45-60 days)",
        }
    }

    pub fn timing(&self) -> &'static str {
        match self {
            ApplicationStage::Basal => "At sowing time",
            ApplicationStage::FirstTopDressing => "21-30 days after sowing",
            ApplicationStage::SecondTopDressing => "45-60 days after sowing",
        }
    }

    /// 距今天数（基肥 0 / 第一次追肥 25 / 第二次追肥 50）
    pub fn days_from_now(&self) -> i32 {
        match self {
            ApplicationStage::Basal => 0,
            ApplicationStage::FirstTopDressing => 25,
            ApplicationStage::SecondTopDressing => 50,
        }
    }
}

impl fmt::Display for ApplicationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 施肥方式 (Application Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationMethod {
    #[serde(rename = "Basal application")]
    BasalApplication,
    #[serde(rename = "Broadcast")]
    Broadcast,
    #[serde(rename = "Top dressing")]
    TopDressing,
    #[serde(rename = "Side dressing")]
    SideDressing,
    #[serde(rename = "Foliar")]
    Foliar,
    #[serde(rename = "Seed treatment")]
    SeedTreatment,
}

impl ApplicationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationMethod::BasalApplication => "Basal application",
            ApplicationMethod::Broadcast => "Broadcast",
            ApplicationMethod::TopDressing => "Top dressing",
            ApplicationMethod::SideDressing => "Side dressing",
            ApplicationMethod::Foliar => "Foliar",
            ApplicationMethod::SeedTreatment => "Seed treatment",
        }
    }
}

impl fmt::Display for ApplicationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 作物生育期 (Growth Stage)
// ==========================================
// 只有 Sowing / Pre-sowing / Vegetative 影响可执行性，其他文本原样保留
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GrowthStage {
    PreSowing,
    Sowing,
    Vegetative,
    Other(String),
}

impl GrowthStage {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Pre-sowing" => GrowthStage::PreSowing,
            "Sowing" => GrowthStage::Sowing,
            "Vegetative" => GrowthStage::Vegetative,
            other => GrowthStage::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GrowthStage::PreSowing => "Pre-sowing",
            GrowthStage::Sowing => "Sowing",
            GrowthStage::Vegetative => "Vegetative",
            GrowthStage::Other(raw) => raw,
        }
    }
}

impl From<String> for GrowthStage {
    fn from(raw: String) -> Self {
        GrowthStage::parse(&raw)
    }
}

impl From<GrowthStage> for String {
    fn from(stage: GrowthStage) -> Self {
        stage.as_str().to_string()
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 推荐状态 (Recommendation Status)
// ==========================================
// 序列化格式: 小写 (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Suggested, // 已推荐
    Applied,   // 已施用
    Rejected,  // 已拒绝
}

impl RecommendationStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Suggested => "suggested",
            RecommendationStatus::Applied => "applied",
            RecommendationStatus::Rejected => "rejected",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "applied" => RecommendationStatus::Applied,
            "rejected" => RecommendationStatus::Rejected,
            _ => RecommendationStatus::Suggested,
        }
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
