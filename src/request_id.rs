use std::fmt;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_LEN: usize = 128;

tokio::task_local! {
    static CURRENT: RequestId;
}

/// 请求标识：客户端传入的安全值，或服务端生成的 `req_<uuid>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(format!("req_{}", Uuid::new_v4().simple()))
    }

    /// 只接受长度不超过 128 的 `[A-Za-z0-9._-]`，其余一律丢弃
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let safe = !raw.is_empty()
            && raw.len() <= MAX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        safe.then(|| Self(raw.to_string()))
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 当前请求的 request_id；不在请求上下文中（如单元测试直接构造错误）时为 `None`
pub fn current_request_id() -> Option<String> {
    CURRENT.try_with(|id| id.0.clone()).ok()
}

/// 为每个请求确定 request_id，并在其 span 与任务上下文中处理请求。
///
/// 错误响应体通过 [`current_request_id`] 读取同一个值，响应头同样回写。
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
        status = tracing::field::Empty,
    );

    let mut res = CURRENT
        .scope(id.clone(), next.run(req))
        .instrument(span.clone())
        .await;

    span.record("status", res.status().as_u16());
    if res.status().is_server_error() {
        tracing::debug!(parent: &span, "请求以服务端错误结束");
    }

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
