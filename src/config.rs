use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::features::gallery::models::ImageEntry;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        3000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 路由前缀
    #[serde(default = "ApiConfig::default_prefix")]
    pub prefix: String,
}

impl ApiConfig {
    fn default_prefix() -> String {
        "/api".to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: Self::default_prefix(),
        }
    }
}

/// 本地图片目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// 扫描的图片目录（不存在时自动创建）
    #[serde(default = "ImagesConfig::default_folder")]
    pub folder: String,
    /// 静态访问前缀，同时用于拼接图片 URL
    #[serde(default = "ImagesConfig::default_url_prefix")]
    pub url_prefix: String,
    /// 识别为图片的扩展名（小写、带点）
    #[serde(default = "ImagesConfig::default_extensions")]
    pub extensions: Vec<String>,
}

impl ImagesConfig {
    fn default_folder() -> String {
        "./public/images".to_string()
    }
    fn default_url_prefix() -> String {
        "/images".to_string()
    }
    fn default_extensions() -> Vec<String> {
        [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tiff"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            folder: Self::default_folder(),
            url_prefix: Self::default_url_prefix(),
            extensions: Self::default_extensions(),
        }
    }
}

/// 上游头图 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 上游 JSON 接口地址（为空时 /header-images 返回 500）
    #[serde(default)]
    pub url: Option<String>,
    /// 请求超时（秒），缺省不设置超时
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// 透传响应的 Cache-Control
    #[serde(default = "UpstreamConfig::default_cache_control")]
    pub cache_control: String,
    /// 头图接口固定返回的 Access-Control-Allow-Origin
    #[serde(default = "UpstreamConfig::default_allow_origin")]
    pub allow_origin: String,
}

impl UpstreamConfig {
    fn default_cache_control() -> String {
        "public, max-age=60, stale-while-revalidate=600".to_string()
    }
    fn default_allow_origin() -> String {
        "https://streamofdan.com".to_string()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: None,
            cache_control: Self::default_cache_control(),
            allow_origin: Self::default_allow_origin(),
        }
    }
}

/// 轮播图配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// 静态图片表；为空时回退到扫描本地目录
    #[serde(default)]
    pub images: Vec<ImageEntry>,
    /// 文件名 -> 说明文字
    #[serde(default)]
    pub captions: HashMap<String, String>,
    /// 默认是否每次请求随机打乱
    #[serde(default = "CarouselConfig::default_shuffle")]
    pub shuffle: bool,
    /// 加载失败时返回的兜底图片
    #[serde(default = "CarouselConfig::default_fallback")]
    pub fallback: ImageEntry,
}

impl CarouselConfig {
    fn default_shuffle() -> bool {
        true
    }
    fn default_fallback() -> ImageEntry {
        ImageEntry::new("default.jpg")
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            captions: HashMap::new(),
            shuffle: Self::default_shuffle(),
            fallback: Self::default_fallback(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 未设置时生效）
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "carousel_backend=info,tower_http=info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_any")]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_any")]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_any() -> Vec<String> {
        vec!["*".to_string()]
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Self::default_any(),
            allowed_methods: Self::default_any(),
            allowed_headers: Vec::new(),
            max_age_secs: None,
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 收到退出信号后等待在途请求完成的最长时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        10
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// 本地图片目录
    #[serde(default)]
    pub images: ImagesConfig,
    /// 上游头图接口
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 轮播图
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// 兼容旧部署使用的环境变量名，同一配置项靠后的变量优先
const LEGACY_ENV: [(&str, &str); 4] = [
    ("PORT", "server.port"),
    ("IMAGES_FOLDER", "images.folder"),
    ("XANO_HEADER_IMAGES_URL", "upstream.url"),
    ("HEADER_IMAGES_URL", "upstream.url"),
];

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    ///
    /// 优先级：旧环境变量 > `APP_*` 环境变量 > config.toml > 默认值
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path())
    }

    /// 从指定路径加载配置（文件不存在时只取默认值与环境变量）
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let mut builder = ConfigBuilder::builder()
            // 配置文件可选，缺失时全部走默认值
            .add_source(File::from(config_path.to_path_buf()).required(false))
            // 例如：APP_SERVER__PORT、APP_IMAGES__URL_PREFIX（字段名本身含下划线，层级用双下划线）
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV {
            let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(key, value)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;

        tracing::debug!(
            "配置加载完成: folder = {}, upstream = {:?}, static images = {}",
            config.images.folder,
            config.upstream.url,
            config.carousel.images.len()
        );

        Ok(config)
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径（可通过 APP_CONFIG 指定）
    fn get_config_path() -> PathBuf {
        std::env::var("APP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取图片目录路径
    pub fn images_path(&self) -> PathBuf {
        PathBuf::from(&self.images.folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_server() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.images.folder, "./public/images");
        assert_eq!(cfg.api.prefix, "/api");
        assert!(cfg.upstream.url.is_none());
        assert!(cfg.images.extensions.contains(&".tiff".to_string()));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let raw = r#"
            [server]
            port = 8080

            [[carousel.images]]
            filename = "Bronco-Roger-Simmons.jpg"
            order = 2

            [carousel.captions]
            "sunset.jpg" = "Sunset over the ridge"
        "#;
        let cfg: AppConfig = ConfigBuilder::builder()
            .add_source(File::from_str(raw, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("parse toml");

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.carousel.images.len(), 1);
        assert_eq!(cfg.carousel.images[0].order, Some(2.0));
        assert_eq!(
            cfg.carousel.captions.get("sunset.jpg").map(String::as_str),
            Some("Sunset over the ridge")
        );
        assert!(cfg.carousel.shuffle);
    }
}
