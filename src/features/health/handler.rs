use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde::Serialize;

use crate::features::gallery::models::iso_timestamp;
use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    #[schema(example = "healthy")]
    pub status: String,
    /// 服务名称
    #[schema(example = "carousel-backend")]
    pub service: String,
    /// 当前版本（Cargo package version）
    #[schema(example = "0.1.0")]
    pub version: String,
    #[schema(example = "2024-05-01T08:00:00.000Z")]
    pub timestamp: String,
    /// 当前扫描的图片目录
    #[schema(example = "./public/images")]
    pub images_folder: String,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "用于探活的健康检查端点，返回服务状态、版本与图片目录。",
    responses((status = 200, description = "服务健康", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: iso_timestamp(Utc::now()),
            images_folder: state.config.images.folder.clone(),
        }),
    )
}
