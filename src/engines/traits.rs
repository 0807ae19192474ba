// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::network::NetworkEnvironment;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// 页面错误类型
#[derive(Error, Debug)]
pub enum PageError {
    /// 导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 元素不存在
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    /// 元素没有可执行的点击行为
    #[error("No handler for element: {0}")]
    NoHandler(String),
    /// 请求失败
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 文档就绪状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    Loading,
    Interactive,
    #[default]
    Complete,
}

/// 页面快照
///
/// `scraper::Html` 不能跨越 await 点持有，因此驱动只交出HTML文本，
/// 需要查询DOM时在同步代码中解析
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
    pub ready_state: ReadyState,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            ready_state: ReadyState::Complete,
        }
    }

    /// 解析为DOM文档
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// 页面地址，用于解析相对链接
    pub fn base_url(&self) -> Option<Url> {
        Url::parse(&self.url).ok()
    }

    /// 统计匹配选择器的元素数量，无效选择器返回0
    pub fn count(&self, selector: &str) -> usize {
        match Selector::parse(selector) {
            Ok(selector) => self.document().select(&selector).count(),
            Err(_) => 0,
        }
    }

    /// 第一个匹配元素的文本内容（已去除首尾空白）
    pub fn first_text(&self, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        let document = self.document();
        let element = document.select(&selector).next()?;
        Some(element.text().collect::<String>().trim().to_string())
    }
}

/// 页面驱动特质
///
/// 站点规则操作的"标签页"：提供当前地址、就绪状态、DOM快照、
/// 导航与点击能力，以及页面发起HTTP请求所用的网络环境
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 当前地址
    async fn current_url(&self) -> String;

    /// 文档就绪状态
    async fn ready_state(&self) -> ReadyState;

    /// 获取当前页面快照
    async fn snapshot(&self) -> Result<PageSnapshot, PageError>;

    /// 直接修改地址
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// 调用元素的默认点击
    async fn click(&self, selector: &str) -> Result<(), PageError>;

    /// 在元素上依次派发 pointerdown / pointerup / click，事件之间间隔 `step`
    async fn dispatch_pointer_sequence(
        &self,
        selector: &str,
        step: Duration,
    ) -> Result<(), PageError>;

    /// 页面使用的HTTP原语
    fn network(&self) -> Arc<NetworkEnvironment>;
}
