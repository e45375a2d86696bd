use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::Utc;

use super::aggregator::{Ordering, aggregate, decorate};
use super::models::{
    CarouselImage, CarouselMeta, CarouselResponse, ImageDetailsResponse, ImagesResponse,
    iso_timestamp,
};
use super::source::{DescriptorSource, StaticSource};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, serde::Deserialize)]
pub struct CarouselQuery {
    /// 分组键（仅静态表生效）
    set: Option<String>,
    /// 是否随机打乱（可选，支持 1/true/yes/on），缺省取配置
    shuffle: Option<String>,
    /// 随机种子（可选），给定后打乱结果可复现
    seed: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct HeaderImagesQuery {
    /// 透传给上游的分组键
    set: Option<String>,
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_seed(raw: Option<&str>) -> Result<Option<u64>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("seed 必须为非负整数: {s}"))),
    }
}

#[utoipa::path(
    get,
    path = "/images",
    summary = "列出图片目录",
    description = "扫描配置的图片目录，返回识别为图片的文件名（自然排序）。目录不存在时自动创建。",
    responses(
        (status = 200, description = "扫描成功", body = ImagesResponse),
        (
            status = 500,
            description = "目录无法访问",
            body = crate::error::ProblemDetails,
            content_type = "application/problem+json"
        )
    ),
    tag = "Images"
)]
pub async fn list_images(State(state): State<AppState>) -> Result<Json<ImagesResponse>, AppError> {
    let folder = state.config.images.folder.clone();
    tracing::info!("扫描图片目录: {}", folder);

    let images = state.directory_source().scan().await?;
    tracing::info!("找到 {} 张图片", images.len());

    Ok(Json(ImagesResponse {
        count: images.len(),
        images,
        folder,
        timestamp: iso_timestamp(Utc::now()),
    }))
}

#[utoipa::path(
    get,
    path = "/images/details",
    summary = "图片详细信息",
    description = "在目录扫描的基础上返回每个文件的大小、修改时间、扩展名与访问 URL。",
    responses(
        (status = 200, description = "获取成功", body = ImageDetailsResponse),
        (
            status = 500,
            description = "目录或文件无法访问",
            body = crate::error::ProblemDetails,
            content_type = "application/problem+json"
        )
    ),
    tag = "Images"
)]
pub async fn image_details(
    State(state): State<AppState>,
) -> Result<Json<ImageDetailsResponse>, AppError> {
    let images = state
        .directory_source()
        .details(&state.config.images.url_prefix)
        .await?;
    Ok(Json(ImageDetailsResponse {
        count: images.len(),
        images,
    }))
}

#[utoipa::path(
    get,
    path = "/carousel",
    summary = "轮播图列表",
    description = "优先使用配置中的静态图片表，未配置时扫描图片目录。补全 URL 与说明文字；加载失败时返回单张兜底图片而不是错误。",
    params(
        ("set" = Option<String>, Query, description = "分组键（仅静态表生效）"),
        ("shuffle" = Option<bool>, Query, description = "是否随机打乱（可选，缺省取配置）"),
        ("seed" = Option<u64>, Query, description = "随机种子（可选），用于复现打乱结果")
    ),
    responses(
        (status = 200, description = "获取成功（含兜底结果）", body = CarouselResponse),
        (
            status = 422,
            description = "参数校验错误（seed 无效）",
            body = crate::error::ProblemDetails,
            content_type = "application/problem+json"
        )
    ),
    tag = "Images"
)]
pub async fn get_carousel(
    State(state): State<AppState>,
    Query(params): Query<CarouselQuery>,
) -> Result<Json<CarouselResponse>, AppError> {
    let cfg = &state.config;
    let shuffled = params
        .shuffle
        .as_deref()
        .map(parse_bool)
        .unwrap_or(cfg.carousel.shuffle);
    let seed = parse_seed(params.seed.as_deref())?;
    let selection = params.set.as_deref();
    let now = Utc::now();

    let (source, loaded) = if cfg.carousel.images.is_empty() {
        let loaded = state.directory_source().load(selection).await;
        ("directory", loaded)
    } else {
        let loaded = StaticSource::new(&cfg.carousel.images).load(selection).await;
        ("static", loaded)
    };

    let ordering = match (shuffled, source) {
        (true, _) => Ordering::Shuffle { seed },
        (false, "directory") => Ordering::Natural,
        (false, _) => Ordering::Explicit,
    };

    let (images, source, fallback): (Vec<CarouselImage>, &str, bool) = match loaded {
        Ok(entries) => {
            let images = aggregate(entries, now, ordering)
                .iter()
                .map(|e| decorate(e, &cfg.carousel.captions, &cfg.images.url_prefix))
                .collect();
            (images, source, false)
        }
        Err(e) => {
            tracing::warn!("轮播图加载失败，返回兜底图片: {}", e);
            let image = decorate(
                &cfg.carousel.fallback,
                &cfg.carousel.captions,
                &cfg.images.url_prefix,
            );
            (vec![image], "fallback", true)
        }
    };

    Ok(Json(CarouselResponse {
        meta: CarouselMeta {
            count: images.len(),
            source: source.to_string(),
            shuffled: shuffled && !fallback,
            fallback,
            timestamp: iso_timestamp(now),
        },
        images,
    }))
}

#[utoipa::path(
    get,
    path = "/header-images",
    summary = "头图列表（上游代理）",
    description = "代理上游 JSON 接口：过滤缺少 image_url 或不在展示区间内的记录，按 order 升序返回。上游非 2xx 时透传其状态码。",
    params(
        ("set" = Option<String>, Query, description = "分组键，透传给上游")
    ),
    responses(
        (status = 200, description = "获取成功（数组，字段与上游一致）", body = Vec<serde_json::Value>),
        (
            status = 500,
            description = "上游不可用或未配置",
            body = crate::error::ProblemDetails,
            content_type = "application/problem+json"
        )
    ),
    tag = "Images"
)]
pub async fn get_header_images(
    State(state): State<AppState>,
    Query(params): Query<HeaderImagesQuery>,
) -> Result<Response, AppError> {
    let source = state
        .upstream_source()
        .ok_or_else(|| AppError::Internal("未配置上游头图接口地址".into()))?;

    let items = source.load(params.set.as_deref()).await?;
    let items = aggregate(items, Utc::now(), Ordering::Explicit);

    let upstream = &state.config.upstream;
    let mut res = Json(items).into_response();
    for (name, value) in [
        (header::CACHE_CONTROL, upstream.cache_control.as_str()),
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, upstream.allow_origin.as_str()),
    ] {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                res.headers_mut().insert(name, v);
            }
            Err(_) => tracing::warn!("响应头 {} 配置无效: {}", name, value),
        }
    }
    Ok(res)
}

/// 图片列表路由（目录扫描 + 轮播图）
pub fn create_gallery_router() -> Router<AppState> {
    Router::new()
        .route("/images", get(list_images))
        .route("/images/details", get(image_details))
        .route("/carousel", get(get_carousel))
}

/// 头图代理路由（自带固定的 Access-Control-Allow-Origin，不挂全局 CORS）
pub fn create_header_images_router() -> Router<AppState> {
    Router::new().route("/header-images", get(get_header_images))
}
