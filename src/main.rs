// ==========================================
// 施肥推荐引擎 - 命令行入口
// ==========================================
// 用法:
//   fertilizer-advisor <request.json> [db_path]
//
// request.json 为推荐请求；含 farm_id 时结果落库并使用该农场最近的土壤检测
// 设置 FERTILIZER_ADVISOR_REFERENCE_DIR 时从该目录加载参考表
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use fertilizer_advisor::api::ApiError;
use fertilizer_advisor::app::{get_default_db_path, AppState};
use fertilizer_advisor::domain::RecommendationRequest;
use fertilizer_advisor::logging;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CliRequest {
    #[serde(default)]
    farm_id: Option<i64>,
    #[serde(flatten)]
    request: RecommendationRequest,
}

fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let request_path = match args.next() {
        Some(path) => path,
        None => bail!("用法: fertilizer-advisor <request.json> [db_path]"),
    };
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    tracing::info!(
        version = fertilizer_advisor::VERSION,
        db_path = %db_path,
        "{}启动",
        fertilizer_advisor::APP_NAME
    );

    let raw = std::fs::read_to_string(&request_path)
        .with_context(|| format!("无法读取请求文件: {}", request_path))?;
    let cli_request: CliRequest =
        serde_json::from_str(&raw).with_context(|| format!("请求文件格式错误: {}", request_path))?;

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    let api = &state.fertilizer_api;

    let output = match cli_request.farm_id {
        Some(farm_id) => api
            .recommend_for_farm(farm_id, cli_request.request)
            .and_then(|r| serde_json::to_value(r).map_err(|e| ApiError::Other(e.into()))),
        None => api
            .recommend(&cli_request.request)
            .and_then(|r| serde_json::to_value(r).map_err(|e| ApiError::Other(e.into()))),
    };

    match output {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(ApiError::CropNotFound {
            crop,
            available_crops,
        }) => {
            bail!(
                "作物未收录: {}\n可选作物: {}",
                crop,
                available_crops.join(", ")
            )
        }
        Err(e) => Err(e.into()),
    }
}
