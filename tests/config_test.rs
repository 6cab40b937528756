// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置覆写经 API 作用于推荐计算
// ==========================================


use fertilizer_advisor::config::{config_keys, ConfigManager, EngineConfig};
use test_helpers::{create_test_api, create_test_db, medium_soil_test, wheat_request};

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_defaults_without_overrides() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let config = config_manager.load_engine_config().unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config_manager.get_config_snapshot().unwrap(), "{}");
}

#[test]
fn test_overrides_persist_across_managers() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    {
        let config_manager = ConfigManager::new(&db_path).unwrap();
        config_manager
            .set_global_config_value(config_keys::YIELD_CAP_PCT, "12")
            .unwrap();
        config_manager
            .set_global_config_value(config_keys::YIELD_CAP_PCT, "18")
            .unwrap();
    }

    let reopened = ConfigManager::new(&db_path).unwrap();
    assert_eq!(
        reopened
            .get_global_config_value(config_keys::YIELD_CAP_PCT)
            .unwrap()
            .as_deref(),
        Some("18"),
        "后写入的值应覆盖"
    );
    assert_eq!(reopened.load_engine_config().unwrap().yield_cap_pct, 18.0);

    let snapshot: serde_json::Value =
        serde_json::from_str(&reopened.get_config_snapshot().unwrap()).unwrap();
    assert_eq!(snapshot["yield_cap_pct"], "18");
}

#[test]
fn test_malformed_value_falls_back_to_default() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_global_config_value(config_keys::NITROGEN_REFERENCE_MAX, "a lot")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::DEFAULT_SEASON, "   ")
        .unwrap();

    let config = config_manager.load_engine_config().unwrap();
    assert_eq!(config.nitrogen_reference_max, 560.0);
    assert_eq!(config.default_season, "Kharif");
}

#[test]
fn test_default_season_override_changes_tips() {
    println!("\n=== 测试：默认季节覆写影响提示 ===");
    let (_tmp, _catalog, api) = create_test_api();

    assert_eq!(api.recommend(&wheat_request()).unwrap().tips.len(), 3);

    api.config_manager()
        .set_global_config_value(config_keys::DEFAULT_SEASON, "Rabi")
        .unwrap();
    assert_eq!(api.recommend(&wheat_request()).unwrap().tips.len(), 2);

    // 请求显式给出季节时以请求为准
    let explicit = api
        .recommend(&wheat_request().with_season("Kharif"))
        .unwrap();
    assert_eq!(explicit.tips.len(), 3);

    println!("=== 测试通过 ===\n");
}

#[test]
fn test_yield_calibration_override() {
    let (_tmp, _catalog, api) = create_test_api();
    let manager = api.config_manager();
    manager
        .set_global_config_value(config_keys::YIELD_BASE_PCT, "20")
        .unwrap();
    manager
        .set_global_config_value(config_keys::YIELD_SOIL_TEST_BONUS_PCT, "8")
        .unwrap();

    let without = api.recommend(&wheat_request()).unwrap();
    let with = api
        .recommend(&wheat_request().with_soil_test(medium_soil_test()))
        .unwrap();

    assert_eq!(without.expected_yield_increase, 20.0);
    assert_eq!(with.expected_yield_increase, 25.0, "不超过上限");
}

#[test]
fn test_reference_max_override_changes_need() {
    let (_tmp, _catalog, api) = create_test_api();
    // N 读数 280 恰好等于新上限，氮需求归零
    api.config_manager()
        .set_global_config_value(config_keys::NITROGEN_REFERENCE_MAX, "280")
        .unwrap();

    let result = api
        .recommend(&wheat_request().with_soil_test(medium_soil_test()))
        .unwrap();
    assert_eq!(result.nutrient_summary.nitrogen, 0.0);
    assert_eq!(result.nutrient_summary.phosphorus, 18.0);
    assert!(result
        .fertilizer_plan
        .iter()
        .all(|line| line.product_name != "Urea"));
}
