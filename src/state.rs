use reqwest::Client;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::gallery::source::{DirectorySource, UpstreamSource};

/// 聚合的应用共享状态（只读，跨请求共享）
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// 上游请求复用的 HTTP Client
    pub http_client: Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let http_client = crate::http::build_upstream_client(&config.upstream)?;
        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// 本地图片目录数据源
    pub fn directory_source(&self) -> DirectorySource {
        DirectorySource::new(
            self.config.images_path(),
            self.config.images.extensions.clone(),
        )
    }

    /// 上游头图数据源；未配置地址时返回 None
    pub fn upstream_source(&self) -> Option<UpstreamSource> {
        self.config
            .upstream
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .map(|u| UpstreamSource::new(self.http_client.clone(), u))
    }
}
