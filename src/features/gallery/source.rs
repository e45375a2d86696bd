use std::future::Future;
use std::path::{Path, PathBuf};

use axum::http::header;
use futures_util::future::try_join_all;
use reqwest::{Client, Url};
use serde_json::Value;

use super::aggregator::image_url;
use super::models::{Descriptor, HeaderImage, ImageDetail, ImageEntry, iso_timestamp};
use super::naming::{extension_of, is_image_file, natural_cmp};
use crate::error::AppError;

/// 图片描述符数据源。
///
/// `selection` 为可选的分组键（请求中的 `set` 参数），各数据源自行决定如何使用。
pub trait DescriptorSource {
    type Item: Descriptor;

    fn load(
        &self,
        selection: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Self::Item>, AppError>> + Send;
}

/// 本地目录扫描
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 列出目录下的图片文件名（自然排序）。目录不存在时先创建。
    pub async fn scan(&self) -> Result<Vec<String>, AppError> {
        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            tracing::info!("图片目录不存在，正在创建: {:?}", self.root);
            tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
                AppError::Retrieval(format!("创建图片目录 {:?} 失败: {e}", self.root))
            })?;
        }

        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            AppError::Retrieval(format!("读取图片目录 {:?} 失败: {e}", self.root))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!("跳过非 UTF-8 文件名: {:?}", entry.file_name());
                continue;
            };
            if is_image_file(&name, &self.extensions) {
                files.push(name);
            }
        }

        files.sort_by(|a, b| natural_cmp(a, b));
        tracing::debug!("扫描 {:?} 得到 {} 张图片", self.root, files.len());
        Ok(files)
    }

    /// 扫描并并发读取每个文件的元信息，结果按扫描顺序排列。
    pub async fn details(&self, url_prefix: &str) -> Result<Vec<ImageDetail>, AppError> {
        let files = self.scan().await?;
        try_join_all(files.into_iter().map(|filename| async move {
            let meta = tokio::fs::metadata(self.root.join(&filename)).await?;
            let modified = meta
                .modified()
                .ok()
                .map(|t| iso_timestamp(chrono::DateTime::<chrono::Utc>::from(t)));
            Ok::<_, AppError>(ImageDetail {
                url: image_url(url_prefix, &filename),
                extension: extension_of(&filename),
                size: meta.len(),
                modified,
                filename,
            })
        }))
        .await
    }
}

impl DescriptorSource for DirectorySource {
    type Item = ImageEntry;

    async fn load(&self, _selection: Option<&str>) -> Result<Vec<ImageEntry>, AppError> {
        Ok(self.scan().await?.into_iter().map(ImageEntry::new).collect())
    }
}

/// 配置注入的静态图片表
#[derive(Debug, Clone, Copy)]
pub struct StaticSource<'a> {
    entries: &'a [ImageEntry],
}

impl<'a> StaticSource<'a> {
    pub fn new(entries: &'a [ImageEntry]) -> Self {
        Self { entries }
    }
}

impl DescriptorSource for StaticSource<'_> {
    type Item = ImageEntry;

    async fn load(&self, selection: Option<&str>) -> Result<Vec<ImageEntry>, AppError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| selection.is_none_or(|set| e.set.as_deref() == Some(set)))
            .cloned()
            .collect())
    }
}

/// 上游 JSON 接口代理
#[derive(Debug, Clone)]
pub struct UpstreamSource {
    client: Client,
    url: String,
}

impl UpstreamSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// 构造请求地址：`set` 存在时覆盖 URL 中已有的同名参数
    fn request_url(&self, selection: Option<&str>) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| AppError::Internal(format!("上游地址无效 {}: {e}", self.url)))?;
        if let Some(set) = selection.filter(|s| !s.is_empty()) {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "set")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair("set", set);
        }
        Ok(url)
    }
}

impl DescriptorSource for UpstreamSource {
    type Item = HeaderImage;

    async fn load(&self, selection: Option<&str>) -> Result<Vec<HeaderImage>, AppError> {
        let url = self.request_url(selection)?;
        tracing::debug!("请求上游头图接口: {}", url);

        let resp = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!("上游头图接口返回非成功状态: {}", status);
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = resp.json().await?;
        Ok(header_images_from(data))
    }
}

/// 非数组响应视为空列表；数组中无法识别为对象的元素直接跳过
fn header_images_from(data: Value) -> Vec<HeaderImage> {
    match data {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_url_replaces_existing_set() {
        let src = UpstreamSource::new(
            Client::new(),
            "https://api.example.com/header_images?set=old&x=1",
        );
        let url = src.request_url(Some("spring")).expect("url");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("x".to_string(), "1".to_string()),
                ("set".to_string(), "spring".to_string())
            ]
        );

        let untouched = src.request_url(None).expect("url");
        assert_eq!(untouched.query(), Some("set=old&x=1"));
    }

    #[test]
    fn invalid_upstream_url_is_internal_error() {
        let src = UpstreamSource::new(Client::new(), "not a url");
        assert!(matches!(src.request_url(None), Err(AppError::Internal(_))));
    }

    #[test]
    fn non_array_payload_yields_empty_list() {
        assert!(header_images_from(json!({"items": []})).is_empty());
        let items = header_images_from(json!([null, 3, {"image_url": "a.jpg"}]));
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn static_source_filters_by_set() {
        let mut a = ImageEntry::new("a.jpg");
        a.set = Some("home".into());
        let b = ImageEntry::new("b.jpg");
        let table = vec![a, b];
        let src = StaticSource::new(&table);

        assert_eq!(src.load(None).await.expect("load").len(), 2);
        let home = src.load(Some("home")).await.expect("load");
        assert_eq!(home.len(), 1);
        assert_eq!(home[0].filename, "a.jpg");
        assert!(src.load(Some("other")).await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn directory_scan_creates_missing_folder_and_skips_non_images() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("nested").join("images");
        let src = DirectorySource::new(&root, vec![".png".into(), ".jpg".into()]);

        assert!(src.scan().await.expect("scan").is_empty());
        assert!(root.is_dir());

        for name in ["10.png", "1.png", "notes.txt", "2.PNG"] {
            std::fs::write(root.join(name), b"x").expect("write");
        }
        std::fs::create_dir(root.join("sub.png")).expect("mkdir");

        let files = src.scan().await.expect("scan");
        assert_eq!(files, vec!["1.png", "2.PNG", "10.png"]);

        let details = src.details("/images").await.expect("details");
        let names: Vec<_> = details.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["1.png", "2.PNG", "10.png"]);
        assert_eq!(details[1].extension, ".PNG");
        assert_eq!(details[1].url, "/images/2.PNG");
        assert_eq!(details[0].size, 1);
        assert!(details[0].modified.is_some());
    }
}
