/// 图片列表聚合（目录扫描、轮播图、头图代理）
pub mod gallery;
/// 健康检查
pub mod health;
