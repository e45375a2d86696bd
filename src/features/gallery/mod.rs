//! 图片列表聚合：数据源（目录扫描 / 静态表 / 上游代理）→ 过滤 → 排序 → 补全说明文字。

pub mod aggregator;
pub mod handler;
pub mod models;
pub mod naming;
pub mod source;

pub use aggregator::{Ordering, aggregate};
pub use handler::{create_gallery_router, create_header_images_router};
pub use models::{ActiveWindow, CarouselImage, Descriptor, HeaderImage, ImageEntry};
pub use source::{DescriptorSource, DirectorySource, StaticSource, UpstreamSource};
