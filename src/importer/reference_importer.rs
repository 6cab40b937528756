// ==========================================
// 施肥推荐引擎 - 参考数据导入器
// ==========================================
// 职责: crops / products / soils 表格 → 领域对象 → ReferenceData 快照
// 约束: 行号从 1 开始（不含表头）；任一行错误即整表失败
// ==========================================

use crate::domain::crop::CropRequirement;
use crate::domain::product::FertilizerProduct;
use crate::domain::soil::SoilProfile;
use crate::domain::types::ProductClass;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use crate::reference::store::{builtin_crops, builtin_products, builtin_soils};
use crate::reference::ReferenceData;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

pub const CROPS_FILE: &str = "crops.csv";
pub const PRODUCTS_FILE: &str = "products.csv";
pub const SOILS_FILE: &str = "soils.csv";

// ==========================================
// 字段读取（支持列名别名）
// ==========================================
struct RowReader<'a> {
    row: &'a RawRecord,
    row_number: usize,
}

impl<'a> RowReader<'a> {
    fn get(&self, aliases: &[&str]) -> Option<&'a str> {
        let row: &'a RawRecord = self.row;
        aliases
            .iter()
            .filter_map(|alias| row.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    fn required(&self, aliases: &[&str]) -> ImportResult<&'a str> {
        self.get(aliases).ok_or_else(|| ImportError::MissingField {
            row: self.row_number,
            field: aliases[0].to_string(),
        })
    }

    fn number(&self, aliases: &[&str], min: f64, max: f64) -> ImportResult<f64> {
        let raw = self.required(aliases)?;
        let value = raw
            .parse::<f64>()
            .map_err(|_| ImportError::TypeConversionError {
                row: self.row_number,
                field: aliases[0].to_string(),
                message: format!("无法解析为浮点数: {}", raw),
            })?;

        if !value.is_finite() || value < min || value > max {
            return Err(ImportError::ValueRangeError {
                row: self.row_number,
                field: aliases[0].to_string(),
                value,
                min,
                max,
            });
        }
        Ok(value)
    }
}

/// 分号分隔的列表字段，缺省为空
fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|v| {
        v.split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// 名称查找不区分大小写，唯一性按小写比较
fn check_unique(seen: &mut HashSet<String>, key: &str, row_number: usize) -> ImportResult<()> {
    if !seen.insert(key.to_lowercase()) {
        return Err(ImportError::DuplicateKey {
            row: row_number,
            key: key.to_string(),
        });
    }
    Ok(())
}

// ==========================================
// ReferenceImporter - 参考数据导入器
// ==========================================
pub struct ReferenceImporter {
    parser: UniversalFileParser,
}

impl ReferenceImporter {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
        }
    }

    /// 导入作物需求表
    ///
    /// 列: name, nitrogen_kg, phosphorus_kg, potassium_kg, stages
    pub fn load_crops<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<CropRequirement>> {
        let rows = self.parser.parse(path.as_ref())?;
        let mut seen = HashSet::new();
        let mut crops = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let r = RowReader { row, row_number: idx + 1 };
            let name = r.required(&["name", "crop", "crop_name"])?;
            check_unique(&mut seen, name, r.row_number)?;

            let stages = r.number(&["stages", "growth_stages"], 1.0, 12.0)?;
            if stages.fract() != 0.0 {
                return Err(ImportError::TypeConversionError {
                    row: r.row_number,
                    field: "stages".to_string(),
                    message: format!("阶段数必须为整数: {}", stages),
                });
            }

            crops.push(CropRequirement::new(
                name,
                r.number(&["nitrogen_kg", "N", "nitrogen"], 0.0, f64::MAX)?,
                r.number(&["phosphorus_kg", "P", "phosphorus"], 0.0, f64::MAX)?,
                r.number(&["potassium_kg", "K", "potassium"], 0.0, f64::MAX)?,
                stages as u32,
            ));
        }

        if crops.is_empty() {
            return Err(ImportError::EmptyTable("crops".to_string()));
        }
        Ok(crops)
    }

    /// 导入肥料产品表
    ///
    /// 列: name, nitrogen_pct, phosphorus_pct, potassium_pct, price_per_kg, class（缺省 chemical）,
    /// suitable_crops（可选，分号分隔）
    pub fn load_products<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<FertilizerProduct>> {
        let rows = self.parser.parse(path.as_ref())?;
        let mut seen = HashSet::new();
        let mut products = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let r = RowReader { row, row_number: idx + 1 };
            let name = r.required(&["name", "product", "fertilizer"])?;
            check_unique(&mut seen, name, r.row_number)?;

            let class = match r.get(&["class", "type"]) {
                None => ProductClass::Chemical,
                Some(raw) => raw.parse::<ProductClass>().map_err(|message| {
                    ImportError::TypeConversionError {
                        row: r.row_number,
                        field: "class".to_string(),
                        message,
                    }
                })?,
            };

            products.push(FertilizerProduct::new(
                name,
                (
                    r.number(&["nitrogen_pct", "N", "nitrogen"], 0.0, 100.0)?,
                    r.number(&["phosphorus_pct", "P", "phosphorus"], 0.0, 100.0)?,
                    r.number(&["potassium_pct", "K", "potassium"], 0.0, 100.0)?,
                ),
                r.number(&["price_per_kg", "price"], 0.0, f64::MAX)?,
                class,
            )
            .with_suitable_crops(&split_list(r.get(&["suitable_crops", "crops"]))));
        }

        if products.is_empty() {
            return Err(ImportError::EmptyTable("products".to_string()));
        }
        Ok(products)
    }

    /// 导入土壤保持率表
    ///
    /// 列: soil_type, nitrogen_retention, phosphorus_retention, potassium_retention（0~1）
    pub fn load_soils<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<SoilProfile>> {
        let rows = self.parser.parse(path.as_ref())?;
        let mut seen = HashSet::new();
        let mut soils = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let r = RowReader { row, row_number: idx + 1 };
            let soil_type = r.required(&["soil_type", "name", "soil"])?;
            check_unique(&mut seen, soil_type, r.row_number)?;

            soils.push(SoilProfile::new(
                soil_type,
                r.number(&["nitrogen_retention", "N"], 0.0, 1.0)?,
                r.number(&["phosphorus_retention", "P"], 0.0, 1.0)?,
                r.number(&["potassium_retention", "K"], 0.0, 1.0)?,
            ));
        }

        if soils.is_empty() {
            return Err(ImportError::EmptyTable("soils".to_string()));
        }
        Ok(soils)
    }

    /// 从目录构建参考数据快照
    ///
    /// 目录中缺少的表使用内置表
    #[instrument(skip(self, dir), fields(dir = %dir.as_ref().display()))]
    pub fn load_dir<P: AsRef<Path>>(&self, dir: P) -> ImportResult<ReferenceData> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ImportError::FileNotFound(dir.display().to_string()));
        }

        let crops_path = dir.join(CROPS_FILE);
        let crops = if crops_path.exists() {
            self.load_crops(&crops_path)?
        } else {
            warn!(file = CROPS_FILE, "未找到作物表，使用内置数据");
            builtin_crops()
        };

        let products_path = dir.join(PRODUCTS_FILE);
        let products = if products_path.exists() {
            self.load_products(&products_path)?
        } else {
            warn!(file = PRODUCTS_FILE, "未找到肥料表，使用内置数据");
            builtin_products()
        };

        let soils_path = dir.join(SOILS_FILE);
        let soils = if soils_path.exists() {
            self.load_soils(&soils_path)?
        } else {
            warn!(file = SOILS_FILE, "未找到土壤表，使用内置数据");
            builtin_soils()
        };

        info!(
            crops = crops.len(),
            products = products.len(),
            soils = soils.len(),
            "参考数据导入完成"
        );
        Ok(ReferenceData::new(crops, products, soils))
    }
}

impl Default for ReferenceImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_crops_with_aliases() {
        let file = csv_file(&["crop,N,P,K,stages", "Barley,50,25,20,3"]);
        let crops = ReferenceImporter::new().load_crops(file.path()).unwrap();
        assert_eq!(crops, vec![CropRequirement::new("Barley", 50.0, 25.0, 20.0, 3)]);
    }

    #[test]
    fn test_load_products_default_class() {
        let file = csv_file(&[
            "name,nitrogen_pct,phosphorus_pct,potassium_pct,price_per_kg,class",
            "Urea,46,0,0,6.5,",
            "Bone Meal,3,15,0,14,organic",
        ]);
        let products = ReferenceImporter::new().load_products(file.path()).unwrap();
        assert_eq!(products[0].class, ProductClass::Chemical);
        assert!(products[1].is_organic());
    }

    #[test]
    fn test_load_products_suitable_crops() {
        let file = csv_file(&[
            "name,nitrogen_pct,phosphorus_pct,potassium_pct,price_per_kg,suitable_crops",
            "MOP,0,0,60,18,Sugarcane; Potato ;",
            "SSP,0,16,0,8.5,",
        ]);
        let products = ReferenceImporter::new().load_products(file.path()).unwrap();
        assert_eq!(products[0].suitable_crops, vec!["Sugarcane", "Potato"]);
        assert!(products[1].suitable_crops.is_empty());
        assert!(products[1].is_suitable_for("Wheat"));
    }

    #[test]
    fn test_retention_out_of_range() {
        let file = csv_file(&[
            "soil_type,nitrogen_retention,phosphorus_retention,potassium_retention",
            "Sandy soil,0.1,0.1,0.1",
            "Peat soil,1.4,0.2,0.2",
        ]);
        let err = ReferenceImporter::new().load_soils(file.path()).unwrap_err();
        match err {
            ImportError::ValueRangeError { row, field, .. } => {
                assert_eq!(row, 2);
                assert_eq!(field, "nitrogen_retention");
            }
            other => panic!("应返回 ValueRangeError，实际: {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_reports_row() {
        let file = csv_file(&["name,nitrogen_kg,phosphorus_kg,potassium_kg,stages", "Millet,abc,10,10,3"]);
        let err = ReferenceImporter::new().load_crops(file.path()).unwrap_err();
        assert!(matches!(err, ImportError::TypeConversionError { row: 1, .. }));
    }

    #[test]
    fn test_duplicate_product_rejected() {
        let file = csv_file(&[
            "name,nitrogen_pct,phosphorus_pct,potassium_pct,price_per_kg",
            "MOP,0,0,60,18",
            "MOP,0,0,60,19",
        ]);
        let err = ReferenceImporter::new().load_products(file.path()).unwrap_err();
        assert!(matches!(err, ImportError::DuplicateKey { row: 2, .. }));
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let err = ReferenceImporter::new().load_dir("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
