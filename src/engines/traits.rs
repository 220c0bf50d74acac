// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 页面导航失败
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    /// 等待选择器超时
    #[error("Timed out waiting for selector `{0}`")]
    Timeout(String),
    /// 元素不存在
    #[error("Element `{0}` not found")]
    ElementNotFound(String),
    /// 页面脚本执行失败
    #[error("Script evaluation failed: {0}")]
    Script(String),
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 浏览器会话
///
/// 一次刷新周期独占的页面会话，提供搜索表单交互所需的最小操作集
#[async_trait]
pub trait BrowserSession: Send {
    /// 导航到指定地址
    async fn goto(&mut self, url: &str) -> Result<(), EngineError>;

    /// 等待选择器出现，超时返回 [`EngineError::Timeout`]
    async fn wait_for(&mut self, selector: &str) -> Result<(), EngineError>;

    /// 点击匹配的第一个元素
    async fn click(&mut self, selector: &str) -> Result<(), EngineError>;

    /// 设置下拉框的值并触发 change 事件
    async fn select_option(&mut self, selector: &str, value: &str) -> Result<(), EngineError>;

    /// 当前页面的 HTML
    async fn content(&mut self) -> Result<String, EngineError>;

    /// 释放会话
    async fn close(self: Box<Self>);
}

/// 浏览器启动器
///
/// 每次调用都返回一个独占的新会话
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, EngineError>;

    /// 启动器名称
    fn name(&self) -> &'static str;
}

/// 文档抓取器
///
/// 通过普通 HTTP 请求获取详情页 HTML
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, EngineError>;
}
