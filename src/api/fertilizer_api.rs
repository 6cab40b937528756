// ==========================================
// 施肥推荐引擎 - 施肥推荐 API
// ==========================================
// 职责: 推荐生成与持久化、推荐历史、施肥登记、土壤检测上传、肥料检索、参考数据重载
// 红线: API 层不实现计算规则，计算全部委托 Engine
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, EngineConfig};
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::application_log::{ApplicationLog, ApplicationLogInput};
use crate::domain::product::{FertilizerProduct, ProductQuery};
use crate::domain::recommendation::{
    RecommendationRecord, RecommendationRequest, RecommendationResult,
};
use crate::domain::soil::{SoilInterpretation, SoilTestReading, SoilTestRecord};
use crate::domain::types::RecommendationStatus;
use crate::engine::{RecommendationEngine, SoilHealthEngine};
use crate::importer::ReferenceImporter;
use crate::reference::ReferenceCatalog;
use crate::repository::{ApplicationLogRepository, RecommendationRepository, SoilTestRepository};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

// ==========================================
// 请求/响应结构
// ==========================================

/// 农场推荐结果（已持久化）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmRecommendation {
    pub recommendation_id: String,
    /// 推荐使用的土壤检测（请求未提供时取最近一次入库检测）
    pub soil_test_id: Option<String>,
    #[serde(flatten)]
    pub result: RecommendationResult,
}

/// 土壤检测上传
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoilTestUpload {
    #[serde(flatten)]
    pub reading: SoilTestReading,
    #[serde(default)]
    pub organic_carbon: Option<f64>,
    #[serde(default)]
    pub ec_level: Option<f64>,
}

/// 土壤检测上传结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilTestReport {
    pub soil_test: SoilTestRecord,
    pub interpretation: SoilInterpretation,
}

/// 参考数据重载摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSummary {
    pub crops: usize,
    pub products: usize,
    pub soils: usize,
}

// ==========================================
// FertilizerApi - 施肥推荐 API
// ==========================================
pub struct FertilizerApi {
    catalog: Arc<ReferenceCatalog>,
    config_manager: Arc<ConfigManager>,
    recommendation_repo: RecommendationRepository,
    application_log_repo: ApplicationLogRepository,
    soil_test_repo: SoilTestRepository,
    soil_health: SoilHealthEngine,
    importer: ReferenceImporter,
}

impl FertilizerApi {
    /// 从已有连接创建（会确保表结构存在）
    pub fn new(conn: Arc<Mutex<Connection>>, catalog: Arc<ReferenceCatalog>) -> ApiResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
            configure_sqlite_connection(&guard)
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
            ensure_schema(&guard).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        }

        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self {
            catalog,
            config_manager: Arc::new(config_manager),
            recommendation_repo: RecommendationRepository::from_connection(conn.clone()),
            application_log_repo: ApplicationLogRepository::from_connection(conn.clone()),
            soil_test_repo: SoilTestRepository::from_connection(conn),
            soil_health: SoilHealthEngine::new(),
            importer: ReferenceImporter::new(),
        })
    }

    /// 打开数据库文件并使用内置参考数据
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        Self::new(
            Arc::new(Mutex::new(conn)),
            Arc::new(ReferenceCatalog::default()),
        )
    }

    pub fn config_manager(&self) -> Arc<ConfigManager> {
        self.config_manager.clone()
    }

    fn engine_config(&self) -> ApiResult<EngineConfig> {
        self.config_manager
            .load_engine_config()
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    // ==========================================
    // 推荐
    // ==========================================

    /// 生成施肥推荐（不落库）
    pub fn recommend(&self, request: &RecommendationRequest) -> ApiResult<RecommendationResult> {
        let engine = RecommendationEngine::new(self.engine_config()?);
        let reference = self.catalog.snapshot();
        Ok(engine.recommend(&reference, request)?)
    }

    /// 为农场生成推荐并保存
    ///
    /// 请求未携带土壤检测时，使用该农场最近一次入库的检测
    #[instrument(skip(self, request), fields(crop = %request.crop_name))]
    pub fn recommend_for_farm(
        &self,
        farm_id: i64,
        request: RecommendationRequest,
    ) -> ApiResult<FarmRecommendation> {
        let mut request = request;
        let mut soil_test_id = None;

        if request.soil_test.is_none() {
            if let Some(latest) = self.soil_test_repo.find_latest(farm_id)? {
                info!(soil_test_id = %latest.soil_test_id, "使用最近一次土壤检测");
                request.soil_test = Some(SoilTestReading::from(&latest.values));
                soil_test_id = Some(latest.soil_test_id);
            }
        }

        let result = self.recommend(&request)?;
        let record = RecommendationRecord::from_result(
            farm_id,
            &request.growth_stage,
            soil_test_id.clone(),
            &result,
        );
        self.recommendation_repo.insert(&record)?;

        info!(
            recommendation_id = %record.recommendation_id,
            total_cost = result.total_cost,
            "推荐已保存"
        );

        Ok(FarmRecommendation {
            recommendation_id: record.recommendation_id,
            soil_test_id,
            result,
        })
    }

    /// 查询农场推荐历史（最新在前，条数由配置决定）
    pub fn recommendation_history(&self, farm_id: i64) -> ApiResult<Vec<RecommendationRecord>> {
        let limit = self.engine_config()?.history_limit;
        Ok(self.recommendation_repo.list_by_farm(farm_id, limit)?)
    }

    pub fn get_recommendation(&self, recommendation_id: &str) -> ApiResult<RecommendationRecord> {
        self.recommendation_repo
            .find_by_id(recommendation_id)?
            .ok_or_else(|| ApiError::NotFound(format!("推荐记录{}不存在", recommendation_id)))
    }

    /// 更新推荐状态（农户采纳/拒绝）
    pub fn update_recommendation_status(
        &self,
        recommendation_id: &str,
        status: RecommendationStatus,
        feedback: Option<&str>,
    ) -> ApiResult<()> {
        self.recommendation_repo
            .update_status(recommendation_id, status, feedback)?;
        info!(recommendation_id, status = %status, "推荐状态已更新");
        Ok(())
    }

    // ==========================================
    // 施肥登记
    // ==========================================

    pub fn log_application(
        &self,
        farm_id: i64,
        input: ApplicationLogInput,
    ) -> ApiResult<ApplicationLog> {
        if input.fertilizer_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("肥料名称不能为空".to_string()));
        }
        if !input.quantity_kg.is_finite() || input.quantity_kg <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "施用量必须大于0: {}",
                input.quantity_kg
            )));
        }
        if let Some(cost) = input.cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(ApiError::InvalidInput(format!("费用不能为负: {}", cost)));
            }
        }

        if self.catalog.snapshot().find_product(&input.fertilizer_name).is_none() {
            warn!(fertilizer = %input.fertilizer_name, "登记的肥料不在参考表中");
        }

        let log = ApplicationLog::from_input(farm_id, input);
        self.application_log_repo.insert(&log)?;
        Ok(log)
    }

    pub fn application_history(&self, farm_id: i64) -> ApiResult<Vec<ApplicationLog>> {
        Ok(self.application_log_repo.list_by_farm(farm_id)?)
    }

    // ==========================================
    // 土壤检测
    // ==========================================

    /// 上传土壤检测：评分、解读并保存
    #[instrument(skip(self, upload))]
    pub fn upload_soil_test(&self, farm_id: i64, upload: SoilTestUpload) -> ApiResult<SoilTestReport> {
        let values = upload.reading.parsed().ok_or_else(|| {
            ApiError::InvalidInput("土壤检测 N/P/K 读数缺失或无法解析".to_string())
        })?;

        let score = self.soil_health.score(&values);
        let interpretation = self.soil_health.interpret(&values, score);

        let record = SoilTestRecord {
            soil_test_id: uuid::Uuid::new_v4().to_string(),
            farm_id,
            values,
            organic_carbon: upload.organic_carbon,
            ec_level: upload.ec_level,
            soil_health_score: score,
            test_date: Utc::now(),
        };
        self.soil_test_repo.insert(&record)?;

        info!(soil_test_id = %record.soil_test_id, score, "土壤检测已保存");
        Ok(SoilTestReport {
            soil_test: record,
            interpretation,
        })
    }

    // ==========================================
    // 参考数据
    // ==========================================

    pub fn search_fertilizers(&self, query: &ProductQuery) -> Vec<FertilizerProduct> {
        self.catalog.snapshot().search_products(query)
    }

    pub fn crop_names(&self) -> Vec<String> {
        self.catalog.snapshot().crop_names()
    }

    /// 从目录重载参考表；失败时保留原快照
    pub fn reload_reference<P: AsRef<Path>>(&self, dir: P) -> ApiResult<ReferenceSummary> {
        let data = self.importer.load_dir(dir)?;
        let summary = ReferenceSummary {
            crops: data.crops().len(),
            products: data.products().len(),
            soils: data.soils().len(),
        };
        self.catalog.replace(data);
        Ok(summary)
    }
}
