// ==========================================
// 施肥推荐引擎 - 参考数据快照
// ==========================================
// 职责: 作物需求表、肥料产品表、土壤保持率表的只读快照
// 红线: 快照构造后不可变，所有调用按引用共享
// ==========================================

use crate::domain::crop::CropRequirement;
use crate::domain::product::{FertilizerProduct, ProductQuery};
use crate::domain::soil::SoilProfile;
use crate::domain::types::ProductClass;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// ReferenceData - 参考数据快照
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    crops: Vec<CropRequirement>,
    products: Vec<FertilizerProduct>,
    soils: Vec<SoilProfile>,
}

impl ReferenceData {
    /// 由外部表构造（保持传入顺序，模糊匹配与兜底选品按此顺序）
    pub fn new(
        crops: Vec<CropRequirement>,
        products: Vec<FertilizerProduct>,
        soils: Vec<SoilProfile>,
    ) -> Self {
        Self {
            crops,
            products,
            soils,
        }
    }

    /// 内置参考表（kg/acre, %, 每 kg 单价）
    pub fn builtin() -> Self {
        Self::new(builtin_crops(), builtin_products(), builtin_soils())
    }

    pub fn crops(&self) -> &[CropRequirement] {
        &self.crops
    }

    pub fn products(&self) -> &[FertilizerProduct] {
        &self.products
    }

    pub fn soils(&self) -> &[SoilProfile] {
        &self.soils
    }

    pub fn crop_names(&self) -> Vec<String> {
        self.crops.iter().map(|c| c.name.clone()).collect()
    }

    // ==========================================
    // 查询方法
    // ==========================================

    /// 查找作物需求
    ///
    /// 规则：
    /// 1) 精确匹配（区分大小写）
    /// 2) 参考名称（忽略大小写）是输入的子串，取表中第一个
    ///
    /// # 返回
    /// - Err(CropNotFound): 附带全部作物名称
    pub fn find_crop(&self, name: &str) -> EngineResult<&CropRequirement> {
        if let Some(crop) = self.crops.iter().find(|c| c.name == name) {
            return Ok(crop);
        }

        self.crops
            .iter()
            .find(|c| c.matches_loosely(name))
            .ok_or_else(|| EngineError::CropNotFound {
                crop: name.to_string(),
                available_crops: self.crop_names(),
            })
    }

    /// 查找土壤保持率（精确匹配，缺失返回 None 由调用方跳过修正）
    pub fn find_soil(&self, soil_type: &str) -> Option<&SoilProfile> {
        self.soils.iter().find(|s| s.soil_type == soil_type)
    }

    /// 查找肥料产品（精确匹配）
    pub fn find_product(&self, name: &str) -> Option<&FertilizerProduct> {
        self.products.iter().find(|p| p.name == name)
    }

    /// 候选肥料集合（偏好有机时只保留有机肥）
    pub fn candidate_products(&self, prefer_organic: bool) -> Vec<FertilizerProduct> {
        self.products
            .iter()
            .filter(|p| !prefer_organic || p.class == ProductClass::Organic)
            .cloned()
            .collect()
    }

    /// 按条件检索肥料，按单价升序
    pub fn search_products(&self, query: &ProductQuery) -> Vec<FertilizerProduct> {
        let mut results: Vec<FertilizerProduct> = self
            .products
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        results.sort_by(|a, b| a.price_per_kg.total_cmp(&b.price_per_kg));
        results
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

// ==========================================
// 内置参考表
// ==========================================

pub fn builtin_crops() -> Vec<CropRequirement> {
    vec![
        CropRequirement::new("Wheat", 60.0, 30.0, 20.0, 3),
        CropRequirement::new("Rice", 50.0, 25.0, 25.0, 3),
        CropRequirement::new("Cotton", 60.0, 30.0, 30.0, 4),
        CropRequirement::new("Soybean", 25.0, 40.0, 20.0, 3),
        CropRequirement::new("Maize", 60.0, 30.0, 25.0, 3),
        CropRequirement::new("Sugarcane", 100.0, 50.0, 60.0, 4),
        CropRequirement::new("Groundnut", 15.0, 35.0, 25.0, 3),
        CropRequirement::new("Potato", 70.0, 35.0, 70.0, 3),
        CropRequirement::new("Tomato", 80.0, 40.0, 60.0, 4),
        CropRequirement::new("Onion", 50.0, 25.0, 50.0, 3),
    ]
}

pub fn builtin_products() -> Vec<FertilizerProduct> {
    use ProductClass::{Chemical, Organic};
    vec![
        FertilizerProduct::new("Urea", (46.0, 0.0, 0.0), 6.5, Chemical)
            .with_suitable_crops(&["Rice", "Wheat", "Maize", "Cotton"]),
        FertilizerProduct::new("DAP", (18.0, 46.0, 0.0), 27.0, Chemical)
            .with_suitable_crops(&["Wheat", "Rice", "Soybean", "Cotton"]),
        FertilizerProduct::new("MOP", (0.0, 0.0, 60.0), 18.0, Chemical)
            .with_suitable_crops(&["Sugarcane", "Cotton", "Potato", "Banana"]),
        FertilizerProduct::new("NPK 10:26:26", (10.0, 26.0, 26.0), 22.0, Chemical),
        FertilizerProduct::new("NPK 20:20:0", (20.0, 20.0, 0.0), 20.0, Chemical),
        FertilizerProduct::new("SSP", (0.0, 16.0, 0.0), 8.5, Chemical),
        FertilizerProduct::new("Vermicompost", (1.5, 1.0, 1.0), 6.0, Organic),
        FertilizerProduct::new("FYM", (0.5, 0.2, 0.5), 2.5, Organic),
        FertilizerProduct::new("Neem Cake", (5.0, 1.0, 2.0), 25.0, Organic),
    ]
}

pub fn builtin_soils() -> Vec<SoilProfile> {
    vec![
        SoilProfile::new("Black soil", 0.5, 0.3, 0.7),
        SoilProfile::new("Red soil", 0.3, 0.2, 0.5),
        SoilProfile::new("Alluvial soil", 0.6, 0.4, 0.6),
        SoilProfile::new("Laterite soil", 0.2, 0.1, 0.3),
        SoilProfile::new("Clay soil", 0.5, 0.4, 0.6),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_crop_exact_then_substring() {
        let data = ReferenceData::builtin();
        assert_eq!(data.find_crop("Rice").unwrap().name, "Rice");
        assert_eq!(data.find_crop("basmati rice").unwrap().name, "Rice");
        assert_eq!(data.find_crop("SUGARCANE (ratoon)").unwrap().name, "Sugarcane");
    }

    #[test]
    fn test_find_crop_substring_direction() {
        let data = ReferenceData::builtin();
        // 输入是参考名称的子串，不算匹配
        assert!(data.find_crop("Pot").is_err());
    }

    #[test]
    fn test_crop_not_found_lists_all_crops() {
        let data = ReferenceData::builtin();
        match data.find_crop("Avocado") {
            Err(EngineError::CropNotFound {
                crop,
                available_crops,
            }) => {
                assert_eq!(crop, "Avocado");
                assert_eq!(available_crops.len(), 10);
                assert!(available_crops.contains(&"Onion".to_string()));
            }
            other => panic!("expected CropNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_soil_lookup_is_exact() {
        let data = ReferenceData::builtin();
        assert!(data.find_soil("Black soil").is_some());
        assert!(data.find_soil("black soil").is_none());
    }

    #[test]
    fn test_candidate_products_organic_only() {
        let data = ReferenceData::builtin();
        let organic = data.candidate_products(true);
        assert_eq!(organic.len(), 3);
        assert!(organic.iter().all(|p| p.is_organic()));
        assert_eq!(data.candidate_products(false).len(), 9);
    }

    #[test]
    fn test_search_products_sorted_by_price() {
        let data = ReferenceData::builtin();
        let query = ProductQuery {
            class: Some(ProductClass::Chemical),
            max_price: Some(20.0),
            ..Default::default()
        };
        let names: Vec<String> = data
            .search_products(&query)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Urea", "SSP", "MOP", "NPK 20:20:0"]);
    }
}
