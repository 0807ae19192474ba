// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use page_spider::config::settings::DatabaseSettings;
use page_spider::domain::models::tender::TenderRecord;
use page_spider::domain::models::timing::CrawlTiming;
use page_spider::domain::services::record_sink::{RecordSink, SinkError};
use page_spider::engines::network::{
    HttpExchange, HttpPrimitive, HttpReply, NetworkEnvironment, NetworkError, Primitive,
};
use page_spider::engines::traits::{PageDriver, PageError, PageSnapshot, ReadyState};
use page_spider::infrastructure::database::connection;
use parking_lot::Mutex;
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// 所有等待都缩短到毫秒级的参数
pub fn fast_timing() -> CrawlTiming {
    CrawlTiming {
        poll_interval: Duration::from_millis(1),
        max_polls: 5,
        settle_polls: 1,
        settle_delay: Duration::from_millis(1),
        load_timeout: Duration::from_millis(10),
        link_grace: Duration::from_millis(1),
        click_grace: Duration::from_millis(1),
        pointer_step: Duration::from_millis(1),
        intercept_timeout: Duration::from_millis(500),
    }
}

/// 生成一页通用列表
///
/// 每个标题生成一个带链接的 `li`；`next` 为 `Some` 时附带下一页链接
pub fn listing_html(titles: &[&str], next: Option<&str>) -> String {
    let items: String = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            format!(
                r#"<li><a href="/detail/{}-{}.html">{}</a><span>2025-01-0{} | 采购人</span></li>"#,
                title.len(),
                i,
                title,
                i + 1
            )
        })
        .collect();
    let pager = match next {
        Some(href) => format!(r#"<a rel="next" href="{}">下一页</a>"#, href),
        None => String::new(),
    };
    format!(
        r#"<html><body><ul class="list">{}</ul><div class="pager">{}</div></body></html>"#,
        items, pager
    )
}

/// 四川站点的API页面骨架
pub fn sichuan_html(with_next: bool) -> String {
    let next = if with_next {
        r#"<div class="el-pagination"><button type="button" class="btn-next">下一页</button></div>"#
    } else {
        ""
    };
    format!(
        r#"<html><body>
        <div><button class="el-button el-button--primary el-button--medium">查询</button></div>
        <div class="is-scrolling-none"><table><tbody></tbody></table></div>
        {}
        </body></html>"#,
        next
    )
}

/// 一个API列表响应
pub fn api_reply(titles: &[&str]) -> HttpReply {
    let list: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            json!({
                "title": title,
                "url": format!("/info/{}.html", i),
                "id": format!("sc-{}-{}", title.len(), i),
                "releaseTime": "2025-03-01"
            })
        })
        .collect();
    HttpReply::json(200, &json!({ "code": 200, "data": { "list": list } }))
}

/// 非JSON响应，拦截器不会捕获
pub fn html_reply() -> HttpReply {
    let mut reply = HttpReply {
        status: 200,
        body: "<html></html>".to_string(),
        ..HttpReply::default()
    };
    reply
        .headers
        .insert("content-type".to_string(), "text/html".to_string());
    reply
}

/// 按顺序返回预设响应的HTTP原语
///
/// 预设响应用完后返回非JSON页面，不会被拦截器捕获
#[derive(Default)]
pub struct ScriptedApi {
    replies: Mutex<VecDeque<HttpReply>>,
    requests: Mutex<Vec<HttpExchange>>,
}

impl ScriptedApi {
    pub fn new(replies: Vec<HttpReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// 每次请求的请求体
    pub fn request_bodies(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.body.clone().unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl HttpPrimitive for ScriptedApi {
    async fn send(&self, request: HttpExchange) -> Result<HttpReply, NetworkError> {
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();
        Ok(reply.unwrap_or_else(html_reply))
    }
}

struct FakeDocument {
    url: String,
    html: String,
}

/// 脚本化的页面
///
/// DOM 页面：点击存在的元素即前进到下一份文档，导航按URL切换文档。
/// API 页面：点击存在的元素会通过网络环境发出一次 JSON POST
pub struct FakePage {
    documents: Vec<FakeDocument>,
    current: Mutex<usize>,
    network: Arc<NetworkEnvironment>,
    api_url: Option<String>,
    clicks: Mutex<u32>,
}

impl FakePage {
    pub fn dom(documents: Vec<(&str, String)>) -> Arc<Self> {
        Arc::new(Self {
            documents: documents
                .into_iter()
                .map(|(url, html)| FakeDocument {
                    url: url.to_string(),
                    html,
                })
                .collect(),
            current: Mutex::new(0),
            network: Arc::new(NetworkEnvironment::shared(ScriptedApi::new(Vec::new()))),
            api_url: None,
            clicks: Mutex::new(0),
        })
    }

    pub fn api(url: &str, html: String, api: Arc<ScriptedApi>) -> Arc<Self> {
        Arc::new(Self {
            documents: vec![FakeDocument {
                url: url.to_string(),
                html,
            }],
            current: Mutex::new(0),
            network: Arc::new(NetworkEnvironment::shared(api)),
            api_url: Some(format!("{}/api/list", url.trim_end_matches('/'))),
            clicks: Mutex::new(0),
        })
    }

    pub fn click_count(&self) -> u32 {
        *self.clicks.lock()
    }

    fn current_document(&self) -> &FakeDocument {
        let index = *self.current.lock();
        &self.documents[index]
    }

    fn activate(&self, selector: &str) -> Result<(), PageError> {
        let snapshot = PageSnapshot::new(&self.current_document().url, &self.current_document().html);
        if snapshot.count(selector) == 0 {
            return Err(PageError::ElementNotFound(selector.to_string()));
        }
        *self.clicks.lock() += 1;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn current_url(&self) -> String {
        self.current_document().url.clone()
    }

    async fn ready_state(&self) -> ReadyState {
        ReadyState::Complete
    }

    async fn snapshot(&self) -> Result<PageSnapshot, PageError> {
        let document = self.current_document();
        Ok(PageSnapshot::new(&document.url, &document.html))
    }

    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        let index = self
            .documents
            .iter()
            .position(|d| d.url == url)
            .ok_or_else(|| PageError::Navigation(format!("{} not scripted", url)))?;
        *self.current.lock() = index;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        self.activate(selector)?;
        match &self.api_url {
            Some(api_url) => {
                let page = self.click_count();
                let request = HttpExchange::post_json(api_url, &json!({ "page": page }));
                if let Err(e) = self.network.send(Primitive::Xhr, request).await {
                    tracing::warn!("scripted request failed: {}", e);
                }
            }
            None => {
                let mut current = self.current.lock();
                if *current + 1 < self.documents.len() {
                    *current += 1;
                }
            }
        }
        Ok(())
    }

    async fn dispatch_pointer_sequence(
        &self,
        selector: &str,
        _step: Duration,
    ) -> Result<(), PageError> {
        self.click(selector).await
    }

    fn network(&self) -> Arc<NetworkEnvironment> {
        self.network.clone()
    }
}

/// 记录每一批数据的存储端
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<TenderRecord>>>,
    fail: bool,
    saved: Notify,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 总是拒绝批次的存储端
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    pub fn records(&self) -> Vec<TenderRecord> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    /// 下一次保存调用的通知，创建后即开始监听
    pub fn saved(&self) -> Notified<'_> {
        self.saved.notified()
    }
}

#[async_trait]
impl RecordSink for RecordingSink {
    async fn save_records(&self, records: &[TenderRecord]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }
        self.batches.lock().push(records.to_vec());
        self.saved.notify_waiters();
        if self.fail {
            return Err(SinkError::Rejected("backend unavailable".to_string()));
        }
        Ok(records.len())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// 已迁移的内存数据库
pub async fn memory_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: Some(5),
        idle_timeout: None,
    };
    Arc::new(
        connection::connect_and_migrate(&settings)
            .await
            .expect("failed to prepare in-memory database"),
    )
}

/// 在随机端口上启动路由
pub async fn spawn_router(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 组装后端应用，爬取用例使用记录型存储端
pub fn backend_app(
    db: Arc<DatabaseConnection>,
) -> (
    axum::Router,
    Arc<page_spider::application::use_cases::crawl_use_case::CrawlUseCase>,
) {
    use page_spider::application::use_cases::crawl_use_case::CrawlUseCase;
    use page_spider::config::settings::Settings;
    use page_spider::domain::rules::RuleRegistry;
    use page_spider::domain::services::crawl_controller::{ControllerOptions, CrawlController};
    use page_spider::engines::http_page::HttpPageConfig;
    use page_spider::infrastructure::repositories::tender_repo_impl::TenderRepositoryImpl;
    use page_spider::presentation::routes;

    let settings = Settings::defaults().expect("built-in defaults are valid");
    let controller = CrawlController::new(
        RecordingSink::new(),
        ControllerOptions {
            timing: fast_timing(),
            ..ControllerOptions::default()
        },
    );
    let use_case = Arc::new(CrawlUseCase::new(
        Arc::new(RuleRegistry::with_builtin_rules()),
        controller,
        Arc::new(HttpPageConfig::default()),
        &settings.crawl,
    ));
    let repository = Arc::new(TenderRepositoryImpl::new(db));
    (routes::app(repository, use_case.clone()), use_case)
}
