// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 启动时加载一次，进程生命周期内不可变
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 订阅源元数据
    pub feed: FeedSettings,
    /// 目标站点配置
    pub site: SiteSettings,
    /// 关键词配置
    pub search: SearchSettings,
    /// 缓存文件配置
    pub cache: CacheSettings,
    /// 浏览器自动化配置
    pub browser: BrowserSettings,
    /// HTTP客户端配置
    pub http: HttpSettings,
    /// 刷新周期配置
    pub refresh: RefreshSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 对外公开的域名，用于拼接订阅源图片的绝对地址
    pub domain: String,
    /// 订阅源端点路径
    pub feed_path: String,
    /// 静态文件目录
    pub static_dir: String,
}

/// 订阅源元数据设置
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    /// 频道标题
    pub title: String,
    /// 频道描述
    pub description: String,
    /// 频道链接
    pub link: String,
    /// 缓存有效期（分钟）
    pub ttl_minutes: u64,
    /// 频道图片
    pub image: Option<FeedImageSettings>,
}

/// 频道图片设置
#[derive(Debug, Clone, Deserialize)]
pub struct FeedImageSettings {
    /// 图片路径（相对于本服务）
    pub url: String,
    pub title: Option<String>,
    pub link: Option<String>,
}

/// 目标站点设置
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    /// 搜索表单地址
    pub search_url: String,
    /// 相对链接的根地址
    pub root_url: String,
    /// 浏览器和HTTP客户端使用的 User-Agent
    pub user_agent: String,
    /// 描述中回链的显示名称
    pub display_name: String,
    /// 站点默认每页结果数
    pub page_size: usize,
    /// 重新请求时使用的每页结果数
    pub results_per_page: usize,
}

/// 关键词设置
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// 按顺序匹配的关键词
    pub terms: Vec<String>,
}

/// 缓存文件设置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// 缓存文件路径
    pub path: String,
}

/// 浏览器自动化设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 远程 Chrome 调试地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// 单步等待超时（秒）
    pub step_timeout_secs: u64,
    /// 选择器轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

/// HTTP客户端设置
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 详情页并发抓取上限
    pub max_concurrent_fetches: usize,
}

/// 刷新周期设置
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSettings {
    /// 单次刷新总超时（秒），0 表示不限制
    pub timeout_secs: u64,
}

/// 指标导出设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和 `PLANFEED__*` 环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PLANFEED")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("search.terms")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 只包含默认值的配置构建器
    pub fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Server
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.domain", "localhost")?
            .set_default("server.feed_path", "/xmlfeed")?
            .set_default("server.static_dir", "public")?
            // Feed metadata
            .set_default("feed.title", "Planning applications")?
            .set_default("feed.description", "Planning applications matching configured keywords")?
            .set_default("feed.link", "")?
            .set_default("feed.ttl_minutes", 60)?
            // Target site
            .set_default("site.search_url", "")?
            .set_default("site.root_url", "")?
            .set_default(
                "site.user_agent",
                "Mozilla/5.0 (compatible; planfeed/0.1; +https://github.com/Kirky-X)",
            )?
            .set_default("site.display_name", "council planning page")?
            .set_default("site.page_size", 10)?
            .set_default("site.results_per_page", 100)?
            .set_default("search.terms", Vec::<String>::new())?
            .set_default("cache.path", "rsscache.json")?
            // Browser and HTTP
            .set_default("browser.step_timeout_secs", 8)?
            .set_default("browser.poll_interval_ms", 100)?
            .set_default("http.timeout_secs", 30)?
            .set_default("http.max_concurrent_fetches", 8)?
            .set_default("refresh.timeout_secs", 120)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }

    /// 订阅源图片的绝对地址
    ///
    /// 图片路径按 `http://{domain}:{port}{url}` 拼接
    pub fn feed_image_url(&self) -> Option<String> {
        self.feed.image.as_ref().map(|image| {
            format!(
                "http://{}:{}{}",
                self.server.domain, self.server.port, image.url
            )
        })
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.browser.step_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.browser.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// 单次刷新的总超时，0 表示不限制
    pub fn refresh_timeout(&self) -> Option<Duration> {
        (self.refresh.timeout_secs > 0).then(|| Duration::from_secs(self.refresh.timeout_secs))
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
