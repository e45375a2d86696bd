use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::cors::build_cors_layer;
use crate::features::gallery::{create_gallery_router, create_header_images_router};
use crate::features::health::health_check;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// 组装完整路由：
/// - `{api.prefix}/images|images/details|carousel` 与 `/health`：挂全局 CORS
/// - `{api.prefix}/header-images`：自带固定 Allow-Origin，不挂全局 CORS
/// - `{images.url_prefix}/*`：图片目录静态文件（前缀为外部 URL 或根路径时不挂载）
/// - `/docs`：Swagger UI
pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut gallery = create_gallery_router();
    let mut health = Router::<AppState>::new().route("/health", get(health_check));
    if let Some(cors) = build_cors_layer(&config.cors) {
        gallery = gallery.layer(cors.clone());
        health = health.layer(cors);
    }
    let api = gallery.merge(create_header_images_router());

    // axum 不允许在根路径 nest，前缀为空时直接 merge
    let prefix = config.api.prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        health.merge(api)
    } else {
        health.nest(prefix, api)
    };

    let app = match static_mount_path(&config.images.url_prefix) {
        Some(path) => app.nest_service(path, ServeDir::new(config.images_path())),
        None => {
            tracing::warn!(
                "images.url_prefix = {:?} 不是本地子路径，不挂载图片静态文件",
                config.images.url_prefix
            );
            app
        }
    };

    app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn(
            crate::request_id::request_id_middleware,
        ))
}

/// `url_prefix` 同时用于拼接图片 URL：外部地址（CDN）、空串或 `/` 都不能作为本地挂载点
fn static_mount_path(url_prefix: &str) -> Option<&str> {
    let path = url_prefix.trim_end_matches('/');
    (path.starts_with('/') && !path.contains(['*', ':', '{', '}'])).then_some(path)
}
