use reqwest::Client;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::AppError;

/// 构建上游请求使用的 HTTP Client（连接池在请求间复用）。
///
/// 未配置 `timeout_secs` 时不设置超时。
pub fn build_upstream_client(cfg: &UpstreamConfig) -> Result<Client, AppError> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(secs) = cfg.timeout_secs.filter(|s| *s > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| AppError::Internal(format!("HTTP Client 初始化失败: {e}")))
}
