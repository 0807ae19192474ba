// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::crawl_request::StartCrawlDto;
use crate::config::settings::CrawlSettings;
use crate::domain::models::session::{CrawlMode, CrawlProgress, CrawlStatus};
use crate::domain::rules::traits::SiteRule;
use crate::domain::rules::RuleRegistry;
use crate::domain::services::crawl_controller::{CrawlController, StartCrawl, StartOutcome};
use crate::engines::http_page::{HttpPageConfig, HttpPageDriver};
use crate::engines::traits::{PageDriver, PageError};
use crate::utils::errors::CrawlError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;
use validator::Validate;

#[derive(Error, Debug)]
pub enum CrawlUseCaseError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error(transparent)]
    Crawl(#[from] CrawlError),
}

/// 页面打开器
///
/// 为每次会话提供一个已加载到目标URL的页面
#[async_trait]
pub trait PageOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<Arc<dyn PageDriver>, PageError>;
}

#[async_trait]
impl PageOpener for HttpPageConfig {
    async fn open(&self, url: &str) -> Result<Arc<dyn PageDriver>, PageError> {
        let driver = HttpPageDriver::new(self.clone())?;
        driver.open(url).await?;
        Ok(Arc::new(driver))
    }
}

/// 爬取用例
///
/// 解析规则、打开页面并交给控制器运行
pub struct CrawlUseCase {
    registry: Arc<RuleRegistry>,
    controller: CrawlController,
    opener: Arc<dyn PageOpener>,
    default_delay: Duration,
}

impl CrawlUseCase {
    /// 创建爬取用例
    ///
    /// # 参数
    ///
    /// * `registry` - 站点规则注册表
    /// * `controller` - 爬取控制器
    /// * `opener` - 页面打开器
    /// * `settings` - 爬取参数，提供默认翻页间隔
    pub fn new(
        registry: Arc<RuleRegistry>,
        controller: CrawlController,
        opener: Arc<dyn PageOpener>,
        settings: &CrawlSettings,
    ) -> Self {
        Self {
            registry,
            controller,
            opener,
            default_delay: settings.delay(),
        }
    }

    /// 为URL选择规则
    ///
    /// 注册表未命中时，只有提供了选择器才使用默认规则
    pub fn resolve_rule(
        &self,
        url: &str,
        selector: Option<&str>,
        mode: CrawlMode,
    ) -> Result<Arc<dyn SiteRule>, CrawlError> {
        if mode == CrawlMode::Custom {
            return Ok(self.registry.default_rule());
        }
        match self.registry.find(url) {
            Some(rule) => Ok(rule),
            None if selector.is_some() => Ok(self.registry.default_rule()),
            None => Err(CrawlError::NoRule(url.to_string())),
        }
    }

    /// 校验请求、打开页面并启动会话
    pub async fn start(&self, dto: StartCrawlDto) -> Result<StartOutcome, CrawlUseCaseError> {
        dto.validate()
            .map_err(|e| CrawlUseCaseError::ValidationError(e.to_string()))?;

        let rule = self.resolve_rule(&dto.url, dto.selector(), dto.mode)?;
        if self.controller.is_running() {
            return Ok(StartOutcome::AlreadyRunning);
        }

        let page = self
            .opener
            .open(&dto.url)
            .await
            .map_err(CrawlError::from)?;
        self.start_on_page(page, rule, &dto).await
    }

    /// 在已打开的页面上启动会话
    pub async fn start_on_page(
        &self,
        page: Arc<dyn PageDriver>,
        rule: Arc<dyn SiteRule>,
        dto: &StartCrawlDto,
    ) -> Result<StartOutcome, CrawlUseCaseError> {
        info!("Starting crawl of {} with rule {}", dto.url, rule.name());
        let outcome = self
            .controller
            .start(StartCrawl {
                page,
                rule,
                selector_override: dto.selector().map(str::to_string),
                delay: dto
                    .delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(self.default_delay),
                mode: dto.mode,
                max_pages: dto.max_pages,
            })
            .await?;
        Ok(outcome)
    }

    pub fn stop(&self) -> bool {
        self.controller.stop()
    }

    pub fn status(&self) -> CrawlStatus {
        self.controller.status()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CrawlProgress> {
        self.controller.subscribe()
    }

    /// 等待当前会话的页面循环结束
    pub async fn wait(&self) {
        self.controller.wait().await
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }
}
