use carousel_backend::{AppConfig, AppState, build_app, shutdown};

#[tokio::main]
async fn main() {
    // Load config
    if let Err(e) = AppConfig::init_global() {
        eprintln!("Config init failed: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::global();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .init();

    let state = match AppState::new(config.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("应用状态初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    // 启动时先扫描一次：目录不存在则创建，并打印当前图片数量
    match state.directory_source().scan().await {
        Ok(files) => tracing::info!("图片目录 {} 中共有 {} 张图片", config.images.folder, files.len()),
        Err(e) => tracing::warn!("启动扫描图片目录失败（将继续运行）: {}", e),
    }
    if state.upstream_source().is_none() {
        tracing::warn!("未配置上游头图接口（upstream.url / HEADER_IMAGES_URL），/header-images 将返回 500");
    }

    let app = build_app(state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    let prefix = config.api.prefix.trim_end_matches('/');
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Images folder: {}", config.images.folder);
    tracing::info!("API endpoint: http://{}{}/images", addr, prefix);
    tracing::info!("Carousel: http://{}{}/carousel", addr, prefix);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);

    let shutdown_timeout = config.shutdown.timeout_duration();
    let (drained_tx, drained_rx) = tokio::sync::oneshot::channel::<()>();

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown::wait_for_signal().await;
        tracing::info!("开始优雅关闭HTTP服务器，最长等待 {:?}", shutdown_timeout);
        // 在途请求超时未结束时强制退出
        tokio::spawn(async move {
            if tokio::time::timeout(shutdown_timeout, drained_rx).await.is_err() {
                tracing::warn!("优雅退出超时，强制退出");
                std::process::exit(1);
            }
        });
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }
    let _ = drained_tx.send(());

    tracing::info!("服务器已优雅关闭");
}
