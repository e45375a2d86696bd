use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::models::{CarouselImage, Descriptor, ImageEntry};
use super::naming::{caption_from_filename, natural_cmp};

/// 输出排序策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    /// 按 `order` 字段稳定排序（缺失视为 0）
    Explicit,
    /// 按图片引用做自然排序（目录扫描使用）
    Natural,
    /// 每次请求随机打乱；给定 seed 时结果可复现
    Shuffle { seed: Option<u64> },
    /// 保留数据源顺序
    Preserve,
}

/// 图片列表聚合：过滤无效/不在展示区间内的条目，再按策略排序。
///
/// 空结果不是错误，直接返回空列表。
pub fn aggregate<D: Descriptor>(items: Vec<D>, now: DateTime<Utc>, ordering: Ordering) -> Vec<D> {
    let total = items.len();
    let mut kept = filter_active(items, now);
    if kept.len() != total {
        tracing::debug!("过滤掉 {} 条无效或不在展示区间内的图片", total - kept.len());
    }
    apply_ordering(&mut kept, ordering);
    kept
}

/// 丢弃没有可用引用、或当前时间不在展示区间内的条目
pub fn filter_active<D: Descriptor>(items: Vec<D>, now: DateTime<Utc>) -> Vec<D> {
    items
        .into_iter()
        .filter(|item| item.reference().is_some())
        .filter(|item| item.window().contains(now))
        .collect()
}

pub fn apply_ordering<D: Descriptor>(items: &mut [D], ordering: Ordering) {
    match ordering {
        // NaN 已在解析时归零，partial_cmp 不会失败；-0.0 与 0.0 视为相等
        Ordering::Explicit => items.sort_by(|a, b| {
            a.order()
                .partial_cmp(&b.order())
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        Ordering::Natural => items.sort_by(|a, b| {
            natural_cmp(a.reference().unwrap_or(""), b.reference().unwrap_or(""))
        }),
        Ordering::Shuffle { seed: Some(seed) } => {
            items.shuffle(&mut StdRng::seed_from_u64(seed));
        }
        Ordering::Shuffle { seed: None } => items.shuffle(&mut rand::thread_rng()),
        Ordering::Preserve => {}
    }
}

/// 为条目补全 URL 与说明文字。
///
/// 说明文字优先级：条目自带 caption > 元数据表（文件名匹配，不区分大小写）> 文件名推导。
pub fn decorate(
    entry: &ImageEntry,
    captions: &HashMap<String, String>,
    url_prefix: &str,
) -> CarouselImage {
    let caption = entry
        .caption
        .clone()
        .filter(|c| !c.trim().is_empty())
        .or_else(|| lookup_caption(captions, &entry.filename))
        .unwrap_or_else(|| caption_from_filename(&entry.filename));
    let alt = entry
        .alt
        .clone()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| caption.clone());
    let url = entry
        .url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| image_url(url_prefix, &entry.filename));

    CarouselImage {
        url,
        caption,
        alt,
        filename: entry.filename.clone(),
    }
}

fn lookup_caption(captions: &HashMap<String, String>, filename: &str) -> Option<String> {
    captions
        .get(filename)
        .or_else(|| {
            captions
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(filename))
                .map(|(_, v)| v)
        })
        .cloned()
}

/// 拼接静态资源 URL，例如 `/images` + `a.png` → `/images/a.png`
pub fn image_url(prefix: &str, filename: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), filename)
}
