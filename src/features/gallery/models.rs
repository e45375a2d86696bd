use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 图片的有效展示区间 `[start_at, end_at]`，任一端缺失即视为开区间。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

impl ActiveWindow {
    pub fn new(start_at: Option<DateTime<Utc>>, end_at: Option<DateTime<Utc>>) -> Self {
        Self { start_at, end_at }
    }

    /// 两端均为闭区间
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start_at.is_none_or(|s| s <= now) && self.end_at.is_none_or(|e| e >= now)
    }
}

/// 聚合器处理的原始描述符。
///
/// 三种数据源（目录扫描、静态表、上游接口）的条目各自实现该 trait，
/// 聚合器只依赖这里暴露的三个维度。
pub trait Descriptor {
    /// 图片引用（文件名或 URL），缺失或为空白时条目会被丢弃
    fn reference(&self) -> Option<&str>;
    /// 排序键，缺失或无法转换为数字时为 0
    fn order(&self) -> f64;
    /// 有效展示区间
    fn window(&self) -> ActiveWindow;
}

/// 将上游/配置中的时间值解析为 UTC 时间。
///
/// 支持：毫秒时间戳数字、RFC 3339、`YYYY-MM-DD HH:MM:SS`（按 UTC）、`YYYY-MM-DD`。
/// 空值、数字 0 或无法解析的值返回 `None`，即按“未设置”处理。
pub fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::String(s) => parse_instant_str(s),
        _ => None,
    }
}

fn parse_instant_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 将 order 字段解析为数字，保留小数。
///
/// 数字字符串（如 `"5"`、`" 1.5 "`）按数值处理，布尔值为 1/0，
/// 其他值（缺失、null、无法解析）一律为 0。
pub fn parse_order(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => match s.trim() {
            "" => Some(0.0),
            t => t.parse::<f64>().ok(),
        },
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|f| !f.is_nan()).unwrap_or(0.0)
}

fn lenient_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_instant))
}

/// 静态表或目录扫描得到的图片条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub filename: String,
    /// 显式 URL，缺失时按 `images.url_prefix` 拼接
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_instant",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_instant",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_at: Option<DateTime<Utc>>,
    /// 所属分组，对应请求中的 `set` 参数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
}

impl ImageEntry {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: None,
            caption: None,
            alt: None,
            order: None,
            start_at: None,
            end_at: None,
            set: None,
        }
    }
}

impl Descriptor for ImageEntry {
    fn reference(&self) -> Option<&str> {
        [self.url.as_deref(), Some(self.filename.as_str())]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }

    fn order(&self) -> f64 {
        self.order.filter(|o| !o.is_nan()).unwrap_or(0.0)
    }

    fn window(&self) -> ActiveWindow {
        ActiveWindow::new(self.start_at, self.end_at)
    }
}

/// 上游头图接口返回的单条记录。
///
/// 除聚合用到的字段外，其余字段原样保留并回传给前端。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Descriptor for HeaderImage {
    fn reference(&self) -> Option<&str> {
        self.image_url
            .as_ref()
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    fn order(&self) -> f64 {
        parse_order(self.order.as_ref())
    }

    fn window(&self) -> ActiveWindow {
        ActiveWindow::new(
            self.start_at.as_ref().and_then(parse_instant),
            self.end_at.as_ref().and_then(parse_instant),
        )
    }
}

/// 轮播图输出记录
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CarouselImage {
    #[schema(example = "/images/Bronco-Roger-Simmons.jpg")]
    pub url: String,
    #[schema(example = "Bronco Roger Simmons")]
    pub caption: String,
    #[schema(example = "Bronco Roger Simmons")]
    pub alt: String,
    #[schema(example = "Bronco-Roger-Simmons.jpg")]
    pub filename: String,
}

/// 轮播图响应元信息
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CarouselMeta {
    pub count: usize,
    /// 数据来源：static | directory | fallback
    #[schema(example = "directory")]
    pub source: String,
    pub shuffled: bool,
    /// 是否为加载失败后的兜底结果
    pub fallback: bool,
    #[schema(example = "2024-05-01T08:00:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CarouselResponse {
    pub images: Vec<CarouselImage>,
    pub meta: CarouselMeta,
}

/// 目录扫描结果
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ImagesResponse {
    #[schema(example = json!(["1.png", "2.png", "10.png"]))]
    pub images: Vec<String>,
    pub count: usize,
    #[schema(example = "./public/images")]
    pub folder: String,
    #[schema(example = "2024-05-01T08:00:00.000Z")]
    pub timestamp: String,
}

/// 单个文件的详细信息
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ImageDetail {
    pub filename: String,
    /// 文件大小（字节）
    pub size: u64,
    /// 最后修改时间（ISO 8601）
    pub modified: Option<String>,
    /// 原始扩展名（带点，保留大小写）
    #[schema(example = ".png")]
    pub extension: String,
    #[schema(example = "/images/1.png")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ImageDetailsResponse {
    pub images: Vec<ImageDetail>,
    pub count: usize,
}

/// 与前端约定的时间格式（毫秒精度、Z 结尾）
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_instant_accepts_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(parse_instant(&json!("2024-05-01T08:00:00Z")), Some(expected));
        assert_eq!(
            parse_instant(&json!("2024-05-01T10:00:00+02:00")),
            Some(expected)
        );
        assert_eq!(parse_instant(&json!("2024-05-01 08:00:00")), Some(expected));
        assert_eq!(
            parse_instant(&json!(expected.timestamp_millis())),
            Some(expected)
        );
        assert_eq!(
            parse_instant(&json!("2024-05-01")),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_bounds_are_treated_as_absent() {
        assert_eq!(parse_instant(&json!("next tuesday")), None);
        assert_eq!(parse_instant(&json!("")), None);
        assert_eq!(parse_instant(&Value::Null), None);
        assert_eq!(parse_instant(&json!(true)), None);
        assert_eq!(parse_instant(&json!(0)), None);
    }

    #[test]
    fn zero_end_at_keeps_record_visible() {
        let item: HeaderImage =
            serde_json::from_value(json!({"image_url": "a.jpg", "end_at": 0, "start_at": 0}))
                .expect("parse");
        assert_eq!(item.window(), ActiveWindow::default());
    }

    #[test]
    fn parse_order_handles_fractions_strings_and_junk() {
        assert_eq!(parse_order(Some(&json!(1.7))), 1.7);
        assert_eq!(parse_order(Some(&json!(-3))), -3.0);
        assert_eq!(parse_order(Some(&json!("5"))), 5.0);
        assert_eq!(parse_order(Some(&json!(" 2.5 "))), 2.5);
        assert_eq!(parse_order(Some(&json!(""))), 0.0);
        assert_eq!(parse_order(Some(&json!("later"))), 0.0);
        assert_eq!(parse_order(Some(&json!("NaN"))), 0.0);
        assert_eq!(parse_order(Some(&json!(true))), 1.0);
        assert_eq!(parse_order(Some(&Value::Null)), 0.0);
        assert_eq!(parse_order(None), 0.0);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert!(ActiveWindow::new(Some(t), Some(t)).contains(t));
        assert!(ActiveWindow::default().contains(t));
        assert!(!ActiveWindow::new(None, Some(t - chrono::Duration::seconds(1))).contains(t));
        assert!(!ActiveWindow::new(Some(t + chrono::Duration::seconds(1)), None).contains(t));
    }

    #[test]
    fn header_image_keeps_unknown_fields() {
        let raw = json!({
            "id": 7,
            "image_url": "https://cdn.example.com/a.jpg",
            "title": "Dawn",
            "order": 2.9,
            "start_at": null
        });
        let item: HeaderImage = serde_json::from_value(raw).expect("parse");
        assert_eq!(item.reference(), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(Descriptor::order(&item), 2.9);
        assert_eq!(item.window(), ActiveWindow::default());

        let back = serde_json::to_value(&item).expect("serialize");
        assert_eq!(back["id"], 7);
        assert_eq!(back["title"], "Dawn");
    }

    #[test]
    fn image_entry_prefers_explicit_url() {
        let mut entry = ImageEntry::new("a.jpg");
        assert_eq!(entry.reference(), Some("a.jpg"));
        entry.url = Some("https://cdn.example.com/a.jpg".into());
        assert_eq!(entry.reference(), Some("https://cdn.example.com/a.jpg"));
        entry.url = Some("  ".into());
        assert_eq!(entry.reference(), Some("a.jpg"));
        entry.filename = String::new();
        entry.url = None;
        assert_eq!(entry.reference(), None);
    }
}
