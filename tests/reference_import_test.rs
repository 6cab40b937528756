// ==========================================
// 参考数据导入集成测试
// ==========================================
// 职责: 验证 CSV 目录导入 → 快照替换 → 推荐使用新参考表
// ==========================================


use fertilizer_advisor::api::{ApiError, ReferenceSummary};
use fertilizer_advisor::domain::RecommendationRequest;
use fertilizer_advisor::importer::{ImportError, ReferenceImporter};
use test_helpers::{assert_close, create_test_api, write_reference_dir};

const CROPS_CSV: &str = "\
name,nitrogen_kg,phosphorus_kg,potassium_kg,stages
Millet,40,20,20,3
Barley,50,25,20,3
";

const PRODUCTS_CSV: &str = "\
name,nitrogen_pct,phosphorus_pct,potassium_pct,price_per_kg,class
Urea,46,0,0,7.0,chemical
DAP,18,46,0,28.0,chemical
MOP,0,0,60,19.0,chemical
Vermicompost,1.5,1,1,6.0,organic
";

#[test]
fn test_load_dir_with_builtin_fallback() {
    println!("\n=== 测试：部分表缺失时使用内置表 ===");

    let dir = write_reference_dir(&[("crops.csv", CROPS_CSV)]);
    let data = ReferenceImporter::new().load_dir(dir.path()).unwrap();

    assert_eq!(data.crop_names(), vec!["Millet".to_string(), "Barley".to_string()]);
    assert_eq!(data.products().len(), 9, "肥料表缺失时使用内置表");
    assert_eq!(data.soils().len(), 5, "土壤表缺失时使用内置表");

    println!("=== 测试通过 ===\n");
}

#[test]
fn test_reload_reference_switches_catalog() {
    println!("\n=== 测试：重载参考表后推荐使用新数据 ===");
    let (_tmp, catalog, api) = create_test_api();

    let dir = write_reference_dir(&[("crops.csv", CROPS_CSV), ("products.csv", PRODUCTS_CSV)]);
    let summary = api.reload_reference(dir.path()).unwrap();
    assert_eq!(
        summary,
        ReferenceSummary {
            crops: 2,
            products: 4,
            soils: 5
        }
    );
    assert_eq!(catalog.snapshot().crops().len(), 2);

    // 新作物可用，旧作物不再收录
    let result = api
        .recommend(&RecommendationRequest::new("Millet", "Laterite soil", 1.0, "Sowing"))
        .unwrap();
    let dap = &result.fertilizer_plan[0];
    assert_eq!(dap.product_name, "DAP");
    // P 需求 20 × (1 - 0.1) = 18，DAP 用量 18 / 0.46
    assert_close(dap.quantity_kg, 39.13, "DAP 用量");
    assert_close(dap.cost, 18.0 / 0.46 * 28.0, "按新单价计费");

    match api.recommend(&RecommendationRequest::new("Wheat", "Red soil", 1.0, "Sowing")) {
        Err(ApiError::CropNotFound {
            available_crops, ..
        }) => assert_eq!(available_crops, vec!["Millet".to_string(), "Barley".to_string()]),
        other => panic!("期望 CropNotFound，实际 {:?}", other),
    }

    println!("=== 测试通过 ===\n");
}

#[test]
fn test_failed_reload_keeps_previous_snapshot() {
    let (_tmp, catalog, api) = create_test_api();

    let bad_soils = "soil_type,nitrogen_retention,phosphorus_retention,potassium_retention\n\
                     Sandy soil,1.5,0.1,0.1\n";
    let dir = write_reference_dir(&[("soils.csv", bad_soils)]);

    let err = api.reload_reference(dir.path()).unwrap_err();
    assert!(matches!(err, ApiError::ImportError(_)));
    assert!(err.to_string().contains("nitrogen_retention"));

    assert_eq!(catalog.snapshot().crops().len(), 10, "失败时保留原快照");
    assert!(api.recommend(&test_helpers::wheat_request()).is_ok());
}

#[test]
fn test_missing_directory_is_rejected() {
    let err = ReferenceImporter::new()
        .load_dir("/definitely/not/a/reference/dir")
        .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));
}

#[test]
fn test_duplicate_crop_rejected_with_row_number() {
    let crops = "name,nitrogen_kg,phosphorus_kg,potassium_kg,stages\n\
                 Millet,40,20,20,3\n\
                 millet,45,20,20,3\n";
    let dir = write_reference_dir(&[("crops.csv", crops)]);

    match ReferenceImporter::new().load_dir(dir.path()) {
        Err(ImportError::DuplicateKey { row, .. }) => assert_eq!(row, 2),
        other => panic!("期望 DuplicateKey，实际 {:?}", other.map(|d| d.crop_names())),
    }
}
