// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::network::{HttpExchange, NetworkEnvironment, Primitive, ReqwestPrimitive};
use crate::engines::traits::{PageDriver, PageError, PageSnapshot, ReadyState};
use crate::utils::url_utils::{is_navigable_href, resolve_href};
use async_trait::async_trait;
use parking_lot::RwLock;
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// 默认用户代理
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; page-spider/0.1; +https://github.com/Kirky-X)";

type BuildRequest = Arc<dyn Fn(u32) -> HttpExchange + Send + Sync>;

/// 脚本绑定
///
/// 描述页面脚本对某类元素点击的响应：通过指定原语发出一个请求。
/// `build` 接收点击计数（从1开始），用于生成分页参数
#[derive(Clone)]
pub struct ScriptBinding {
    pub selector: String,
    pub primitive: Primitive,
    pub build: BuildRequest,
}

impl ScriptBinding {
    pub fn new(
        selector: impl Into<String>,
        primitive: Primitive,
        build: impl Fn(u32) -> HttpExchange + Send + Sync + 'static,
    ) -> Self {
        Self {
            selector: selector.into(),
            primitive,
            build: Arc::new(build),
        }
    }
}

/// 页面驱动配置
#[derive(Debug, Clone)]
pub struct HttpPageConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpPageConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
struct DocumentState {
    url: String,
    status: u16,
    html: String,
    ready_state: ReadyState,
}

enum ClickAction {
    Script(ScriptBinding),
    Navigate(String),
}

/// 基于reqwest的无头页面驱动
///
/// 加载静态HTML文档；脚本行为由 [`ScriptBinding`] 描述
pub struct HttpPageDriver {
    client: reqwest::Client,
    document: RwLock<DocumentState>,
    network: Arc<NetworkEnvironment>,
    bindings: Vec<ScriptBinding>,
    dispatches: AtomicU32,
}

impl HttpPageDriver {
    /// 创建页面驱动
    ///
    /// 页面的两个HTTP原语共用同一个带cookie的客户端
    pub fn new(config: HttpPageConfig) -> Result<Self, PageError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;
        let network = Arc::new(NetworkEnvironment::shared(Arc::new(
            ReqwestPrimitive::new(client.clone()),
        )));
        Ok(Self {
            client,
            document: RwLock::new(DocumentState::default()),
            network,
            bindings: Vec::new(),
            dispatches: AtomicU32::new(0),
        })
    }

    /// 替换网络环境
    pub fn with_network(mut self, network: Arc<NetworkEnvironment>) -> Self {
        self.network = network;
        self
    }

    /// 添加脚本绑定
    pub fn with_binding(mut self, binding: ScriptBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// 打开页面，非成功状态码视为导航失败
    pub async fn open(&self, url: &str) -> Result<(), PageError> {
        self.navigate(url).await?;
        let status = self.status();
        if !(200..300).contains(&status) {
            return Err(PageError::Navigation(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }
        Ok(())
    }

    /// 最近一次加载的HTTP状态码
    pub fn status(&self) -> u16 {
        self.document.read().status
    }

    /// 已处理的脚本点击次数
    pub fn dispatch_count(&self) -> u32 {
        self.dispatches.load(Ordering::SeqCst)
    }

    async fn fetch(&self, url: &str) -> Result<DocumentState, PageError> {
        let response = self.client.get(url).send().await?;
        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let html = response.text().await?;
        Ok(DocumentState {
            url: final_url,
            status,
            html,
            ready_state: ReadyState::Complete,
        })
    }

    fn resolve_click(&self, selector: &str) -> Result<ClickAction, PageError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| PageError::Other(format!("Invalid selector {}: {:?}", selector, e)))?;
        let document = self.document.read();
        let html = Html::parse_document(&document.html);
        let element = html
            .select(&parsed)
            .next()
            .ok_or_else(|| PageError::ElementNotFound(selector.to_string()))?;

        for binding in &self.bindings {
            if let Ok(binding_selector) = Selector::parse(&binding.selector) {
                if binding_selector.matches(&element) {
                    return Ok(ClickAction::Script(binding.clone()));
                }
            }
        }

        if element.value().name() == "a" {
            let target = element
                .value()
                .attr("href")
                .filter(|href| is_navigable_href(href))
                .and_then(|href| {
                    let base = Url::parse(&document.url).ok()?;
                    resolve_href(&base, href)
                });
            if let Some(target) = target {
                return Ok(ClickAction::Navigate(target));
            }
        }

        Err(PageError::NoHandler(selector.to_string()))
    }

    async fn perform(&self, action: ClickAction) -> Result<(), PageError> {
        match action {
            ClickAction::Script(binding) => {
                let count = self.dispatches.fetch_add(1, Ordering::SeqCst) + 1;
                let request = (binding.build)(count);
                debug!(
                    "Script binding {} issues {} {} via {}",
                    binding.selector, request.method, request.url, binding.primitive
                );
                // 页面脚本自行处理响应，这里只关心请求是否发出
                if let Err(e) = self.network.send(binding.primitive, request).await {
                    warn!("Script request failed: {}", e);
                }
                Ok(())
            }
            ClickAction::Navigate(url) => self.navigate(&url).await,
        }
    }
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    async fn current_url(&self) -> String {
        self.document.read().url.clone()
    }

    async fn ready_state(&self) -> ReadyState {
        self.document.read().ready_state
    }

    async fn snapshot(&self) -> Result<PageSnapshot, PageError> {
        let document = self.document.read();
        Ok(PageSnapshot {
            url: document.url.clone(),
            html: document.html.clone(),
            ready_state: document.ready_state,
        })
    }

    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        info!("Loading {}", url);
        self.document.write().ready_state = ReadyState::Loading;
        match self.fetch(url).await {
            Ok(loaded) => {
                if !(200..300).contains(&loaded.status) {
                    warn!("{} returned HTTP {}", loaded.url, loaded.status);
                }
                *self.document.write() = loaded;
                Ok(())
            }
            Err(e) => {
                self.document.write().ready_state = ReadyState::Complete;
                Err(e)
            }
        }
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        let action = self.resolve_click(selector)?;
        self.perform(action).await
    }

    async fn dispatch_pointer_sequence(
        &self,
        selector: &str,
        step: Duration,
    ) -> Result<(), PageError> {
        let action = self.resolve_click(selector)?;
        // pointerdown -> pointerup -> click
        tokio::time::sleep(step).await;
        tokio::time::sleep(step).await;
        self.perform(action).await
    }

    fn network(&self) -> Arc<NetworkEnvironment> {
        self.network.clone()
    }
}

#[cfg(test)]
#[path = "http_page_test.rs"]
mod tests;
