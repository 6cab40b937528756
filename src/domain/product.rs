// ==========================================
// 施肥推荐引擎 - 肥料产品
// ==========================================
// 职责: 肥料养分含量（百分比）、单价、类别
// ==========================================

use crate::domain::types::{Nutrient, ProductClass};
use serde::{Deserialize, Serialize};

/// 肥料产品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerProduct {
    /// 产品名称（查找键）
    pub name: String,
    /// 含氮量（%）
    pub nitrogen_pct: f64,
    /// 含磷量（%）
    pub phosphorus_pct: f64,
    /// 含钾量（%）
    pub potassium_pct: f64,
    /// 单价（每 kg）
    pub price_per_kg: f64,
    /// 类别
    pub class: ProductClass,
    /// 适用作物（为空表示不限作物）
    #[serde(default)]
    pub suitable_crops: Vec<String>,
}

/// 适用作物列表中表示"全部作物"的取值
pub const ALL_CROPS: &str = "All crops";

impl FertilizerProduct {
    pub fn new(
        name: &str,
        npk_pct: (f64, f64, f64),
        price_per_kg: f64,
        class: ProductClass,
    ) -> Self {
        Self {
            name: name.to_string(),
            nitrogen_pct: npk_pct.0,
            phosphorus_pct: npk_pct.1,
            potassium_pct: npk_pct.2,
            price_per_kg,
            class,
            suitable_crops: Vec::new(),
        }
    }

    pub fn with_suitable_crops(mut self, crops: &[&str]) -> Self {
        self.suitable_crops = crops.iter().map(|c| c.to_string()).collect();
        self
    }

    /// 是否适用于指定作物（忽略大小写）
    pub fn is_suitable_for(&self, crop: &str) -> bool {
        let crop = crop.trim();
        self.suitable_crops.is_empty()
            || self
                .suitable_crops
                .iter()
                .any(|c| c.eq_ignore_ascii_case(crop) || c.eq_ignore_ascii_case(ALL_CROPS))
    }

    pub fn content_pct(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen_pct,
            Nutrient::Phosphorus => self.phosphorus_pct,
            Nutrient::Potassium => self.potassium_pct,
        }
    }

    /// 养分质量分数（0~1）
    pub fn fraction(&self, nutrient: Nutrient) -> f64 {
        self.content_pct(nutrient) / 100.0
    }

    pub fn is_organic(&self) -> bool {
        self.class == ProductClass::Organic
    }

    /// NPK 配比文本，例如 "18-46-0"
    pub fn npk_ratio(&self) -> String {
        format!(
            "{}-{}-{}",
            self.nitrogen_pct, self.phosphorus_pct, self.potassium_pct
        )
    }
}

// ==========================================
// 产品检索条件
// ==========================================

/// 肥料检索条件（全部可选）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    /// 类别过滤
    #[serde(default)]
    pub class: Option<ProductClass>,
    /// 仅有机肥（与 class 同时给出时以此为准）
    #[serde(default)]
    pub organic_only: bool,
    /// 最高单价
    #[serde(default)]
    pub max_price: Option<f64>,
    /// 名称包含（忽略大小写）
    #[serde(default)]
    pub name_contains: Option<String>,
    /// NPK 配比，例如 "18-46-0"
    #[serde(default)]
    pub npk_ratio: Option<String>,
    /// 适用作物
    #[serde(default)]
    pub crop: Option<String>,
}

impl ProductQuery {
    pub fn matches(&self, product: &FertilizerProduct) -> bool {
        if self.organic_only {
            if !product.is_organic() {
                return false;
            }
        } else if let Some(class) = self.class {
            if product.class != class {
                return false;
            }
        }

        if let Some(max_price) = self.max_price {
            if product.price_per_kg > max_price {
                return false;
            }
        }

        if let Some(needle) = self.name_contains.as_deref() {
            let needle = needle.trim().to_lowercase();
            if !needle.is_empty() && !product.name.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(ratio) = self.npk_ratio.as_deref() {
            let ratio = ratio.trim();
            if !ratio.is_empty() && product.npk_ratio() != ratio {
                return false;
            }
        }

        if let Some(crop) = self.crop.as_deref() {
            if !crop.trim().is_empty() && !product.is_suitable_for(crop) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_and_ratio() {
        let dap = FertilizerProduct::new("DAP", (18.0, 46.0, 0.0), 27.0, ProductClass::Chemical);
        assert!((dap.fraction(Nutrient::Phosphorus) - 0.46).abs() < 1e-12);
        assert_eq!(dap.npk_ratio(), "18-46-0");
        assert!(!dap.is_organic());
    }

    #[test]
    fn test_query_organic_only_overrides_class() {
        let fym = FertilizerProduct::new("FYM", (0.5, 0.2, 0.5), 2.5, ProductClass::Organic);
        let query = ProductQuery {
            class: Some(ProductClass::Chemical),
            organic_only: true,
            ..Default::default()
        };
        assert!(query.matches(&fym));
    }

    #[test]
    fn test_query_price_and_name() {
        let urea = FertilizerProduct::new("Urea", (46.0, 0.0, 0.0), 6.5, ProductClass::Chemical);
        let cheap = ProductQuery {
            max_price: Some(5.0),
            ..Default::default()
        };
        assert!(!cheap.matches(&urea));

        let by_name = ProductQuery {
            name_contains: Some("ure".to_string()),
            ..Default::default()
        };
        assert!(by_name.matches(&urea));
    }

    #[test]
    fn test_query_npk_ratio() {
        let dap = FertilizerProduct::new("DAP", (18.0, 46.0, 0.0), 27.0, ProductClass::Chemical);
        let vermi = FertilizerProduct::new("Vermicompost", (1.5, 1.0, 1.0), 6.0, ProductClass::Organic);
        let query = ProductQuery {
            npk_ratio: Some(" 18-46-0 ".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&dap));
        assert!(!query.matches(&vermi));
        assert_eq!(vermi.npk_ratio(), "1.5-1-1");
    }

    #[test]
    fn test_query_crop_suitability() {
        let mop = FertilizerProduct::new("MOP", (0.0, 0.0, 60.0), 18.0, ProductClass::Chemical)
            .with_suitable_crops(&["Sugarcane", "Cotton", "Potato"]);
        let gypsum = FertilizerProduct::new("Gypsum", (0.0, 0.0, 0.0), 4.0, ProductClass::Chemical)
            .with_suitable_crops(&[ALL_CROPS]);
        let fym = FertilizerProduct::new("FYM", (0.5, 0.2, 0.5), 2.5, ProductClass::Organic);

        let potato = ProductQuery {
            crop: Some("potato".to_string()),
            ..Default::default()
        };
        assert!(potato.matches(&mop));
        assert!(potato.matches(&gypsum));
        assert!(potato.matches(&fym), "未标注适用作物时不限作物");

        let wheat = ProductQuery {
            crop: Some("Wheat".to_string()),
            ..Default::default()
        };
        assert!(!wheat.matches(&mop));
    }
}
