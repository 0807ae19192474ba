// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use crate::domain::models::timing::CrawlTiming;
use crate::domain::rules::control::{NavigationMark, NavigationOutcome, PageControl};
use crate::domain::rules::waits;
use crate::engines::traits::{PageDriver, PageSnapshot};
use crate::utils::errors::CrawlError;
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::Serialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

/// URL匹配模式
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// 子串匹配
    Contains(String),
    /// 正则匹配
    Regex(Regex),
}

impl UrlPattern {
    pub fn contains(pattern: impl Into<String>) -> Self {
        UrlPattern::Contains(pattern.into())
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Contains(pattern) => url.contains(pattern.as_str()),
            UrlPattern::Regex(regex) => regex.is_match(url),
        }
    }
}

/// 数据获取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// 读取渲染后的DOM
    Dom,
    /// 拦截页面发出的API请求
    Api,
}

/// API模式下触发数据请求的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiTrigger {
    /// 第一页：点击查询按钮
    Query,
    /// 后续页：点击下一页控件
    NextPage(PageControl),
}

/// 站点规则特质
///
/// 一条规则描述一个站点的列表页：如何匹配URL、如何定位和解析列表项、
/// 如何判断和执行翻页。等待与点击的通用行为由默认方法提供
#[async_trait]
pub trait SiteRule: Send + Sync {
    /// 规则名称
    fn name(&self) -> &str;

    /// URL匹配模式
    fn url_patterns(&self) -> &[UrlPattern];

    /// 判断规则是否适用于URL，空URL永不匹配
    fn matches(&self, url: &str) -> bool {
        !url.is_empty() && self.url_patterns().iter().any(|p| p.matches(url))
    }

    /// 列表项选择器
    fn list_item_selector(&self) -> &str;

    /// 下一页控件选择器
    fn next_page_selector(&self) -> &str;

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Dom
    }

    /// 从单个列表项元素中抽取记录
    ///
    /// # 参数
    ///
    /// * `element` - 列表项元素
    /// * `page_url` - 当前页面地址，用于解析相对链接
    ///
    /// # 返回值
    ///
    /// 元素结构不符合规则预期时返回 `None`
    fn extract_item(&self, element: ElementRef<'_>, page_url: &Url) -> Option<TenderRecord>;

    /// 从API返回的单个JSON对象中抽取记录
    fn extract_api_item(&self, _item: &Value, _page_url: &str) -> Option<TenderRecord> {
        None
    }

    /// 判断下一页控件是否可用
    fn is_next_page_available(&self, control: Option<&PageControl>) -> bool {
        control.is_some_and(|c| !c.disabled && !c.hidden)
    }

    /// 启动前检查页面，返回错误时爬取不会开始
    fn preflight(&self, _snapshot: &PageSnapshot, _list_selector: &str) -> Result<(), CrawlError> {
        Ok(())
    }

    /// 等待页面加载完成
    async fn wait_for_load(&self, page: &dyn PageDriver, timing: &CrawlTiming) {
        waits::wait_for_load(page, timing).await
    }

    /// 点击翻页后等待新页面就绪
    async fn wait_for_navigation(
        &self,
        page: &dyn PageDriver,
        list_selector: &str,
        mark: &NavigationMark,
        timing: &CrawlTiming,
    ) -> NavigationOutcome {
        let outcome = waits::poll_navigation(page, list_selector, mark, timing).await;
        if outcome == NavigationOutcome::UrlChanged {
            self.wait_for_load(page, timing).await;
            sleep(timing.settle_delay).await;
        }
        outcome
    }

    /// 点击下一页
    async fn click_next_page(&self, page: &dyn PageDriver, control: &PageControl, timing: &CrawlTiming) {
        waits::click_control(page, control, timing).await
    }

    /// 通过网络拦截获取一页数据
    async fn crawl_from_api(
        &self,
        _page: &dyn PageDriver,
        _trigger: &ApiTrigger,
        _timing: &CrawlTiming,
    ) -> Result<Vec<TenderRecord>, CrawlError> {
        Err(CrawlError::UnsupportedMode(self.name().to_string()))
    }
}

/// 按规则从快照中抽取当前页的全部有效记录
///
/// 单个列表项抽取失败只会被跳过
pub fn extract_from_snapshot(
    rule: &dyn SiteRule,
    snapshot: &PageSnapshot,
    list_selector: &str,
) -> Result<Vec<TenderRecord>, CrawlError> {
    let selector = Selector::parse(list_selector)
        .map_err(|e| CrawlError::InvalidSelector(format!("{}: {:?}", list_selector, e)))?;
    let page_url = Url::parse(&snapshot.url)
        .map_err(|e| CrawlError::InvalidStart(format!("{}: {}", snapshot.url, e)))?;
    let document = snapshot.document();

    let mut records = Vec::new();
    for (index, element) in document.select(&selector).enumerate() {
        match rule.extract_item(element, &page_url) {
            Some(record) if record.is_valid() => records.push(record),
            _ => debug!("{}: list item {} skipped", rule.name(), index),
        }
    }
    Ok(records)
}

/// 校验CSS选择器
pub fn validate_selector(selector: &str) -> Result<(), CrawlError> {
    if selector.trim().is_empty() {
        return Err(CrawlError::InvalidSelector("empty selector".to_string()));
    }
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| CrawlError::InvalidSelector(format!("{}: {:?}", selector, e)))
}
