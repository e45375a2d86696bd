use utoipa::OpenApi;
use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::Modify;

/// 为 Swagger UI 提供正确的“业务接口前缀”Servers 配置。
///
/// - 业务接口默认前缀为 `/api`（对应 `config.api.prefix`）。
/// - `/health` 不带前缀，因此额外提供 `/` 作为备用 server。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some("业务接口前缀：对应 config.api.prefix")),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（用于 /health）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::gallery::handler::list_images,
        crate::features::gallery::handler::image_details,
        crate::features::gallery::handler::get_carousel,
        crate::features::gallery::handler::get_header_images,
    ),
    components(schemas(crate::error::AppError, crate::error::ProblemDetails)),
    modifiers(&ApiServers),
    tags(
        (
            name = "Images",
            description = "图片列表：目录扫描、轮播图、上游头图代理。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Carousel Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "为前端轮播/头图组件提供图片列表（Axum + utoipa）。除 /health 外，业务接口挂载在 `config.api.prefix`（默认 /api）下。"
    )
)]
pub struct ApiDoc;
