// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::session::{
    ApiFailurePolicy, CrawlMode, CrawlPhase, CrawlProgress, CrawlSession, CrawlState, CrawlStatus,
};
use crate::domain::models::tender::TenderRecord;
use crate::domain::models::timing::CrawlTiming;
use crate::domain::rules::control::{NavigationMark, PageControl};
use crate::domain::rules::traits::{
    extract_from_snapshot, validate_selector, ApiTrigger, ExtractionMode, SiteRule,
};
use crate::domain::services::record_sink::RecordSink;
use crate::engines::traits::{PageDriver, PageSnapshot};
use crate::utils::errors::CrawlError;
use chrono::Utc;
use metrics::counter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex as AsyncMutex, Notify, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const PROGRESS_CAPACITY: usize = 64;

/// 控制器参数
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub timing: CrawlTiming,
    /// API模式下拦截失败的处理方式
    pub api_failure_policy: ApiFailurePolicy,
    /// `Retry` 策略下每页的最大重试次数
    pub api_retry_limit: u32,
    /// 最多爬取的页数，`None` 表示不限
    pub max_pages: Option<u32>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            timing: CrawlTiming::default(),
            api_failure_policy: ApiFailurePolicy::default(),
            api_retry_limit: 1,
            max_pages: None,
        }
    }
}

/// 启动参数
#[derive(Clone)]
pub struct StartCrawl {
    pub page: Arc<dyn PageDriver>,
    pub rule: Arc<dyn SiteRule>,
    /// 覆盖规则的列表项选择器
    pub selector_override: Option<String>,
    /// 翻页间隔
    pub delay: Duration,
    pub mode: CrawlMode,
    /// 覆盖控制器的页数上限
    pub max_pages: Option<u32>,
}

/// 启动结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// 已有会话在运行，本次调用没有任何效果
    AlreadyRunning,
}

/// 单页数据获取结果
enum PageData {
    Records(Vec<TenderRecord>),
    Failed(String),
    Abort(String),
}

struct ControllerInner {
    sink: Arc<dyn RecordSink>,
    options: ControllerOptions,
    session: Mutex<CrawlSession>,
    progress: broadcast::Sender<CrawlProgress>,
    task: Mutex<Option<JoinHandle<()>>>,
    /// 串行化 `start` 调用
    start_gate: AsyncMutex<()>,
    /// 页面循环运行期间一直持有，同一时刻只有一个循环操作页面
    page_loop: Arc<AsyncMutex<()>>,
    /// 停止请求，用于打断翻页间隔
    stop_signal: Notify,
}

/// 爬取控制器
///
/// 持有唯一的爬取会话，驱动"等待 -> 抽取 -> 保存 -> 检查下一页 -> 翻页"循环。
/// 克隆开销很小，所有克隆共享同一会话
#[derive(Clone)]
pub struct CrawlController {
    inner: Arc<ControllerInner>,
}

impl CrawlController {
    /// 创建控制器
    ///
    /// # 参数
    ///
    /// * `sink` - 每页记录的存储端
    /// * `options` - 等待参数与失败策略
    pub fn new(sink: Arc<dyn RecordSink>, options: ControllerOptions) -> Self {
        let (progress, _) = broadcast::channel(PROGRESS_CAPACITY);
        Self {
            inner: Arc::new(ControllerInner {
                sink,
                options,
                session: Mutex::new(CrawlSession::default()),
                progress,
                task: Mutex::new(None),
                start_gate: AsyncMutex::new(()),
                page_loop: Arc::new(AsyncMutex::new(())),
                stop_signal: Notify::new(),
            }),
        }
    }

    /// 启动爬取
    ///
    /// 参数校验和规则预检在返回前完成，失败时会话不会开始；
    /// 通过检查后页面循环在后台任务中运行。
    /// 上一个会话已停止但循环尚未退出时，先等待该循环结束
    ///
    /// # 返回值
    ///
    /// * `Ok(StartOutcome::Started)` - 会话已开始
    /// * `Ok(StartOutcome::AlreadyRunning)` - 已有会话在运行，未做任何改变
    /// * `Err(CrawlError)` - 参数无效或页面不满足规则要求
    pub async fn start(&self, request: StartCrawl) -> Result<StartOutcome, CrawlError> {
        let _gate = self.inner.start_gate.lock().await;
        if self.is_running() {
            info!("Crawl already running, start ignored");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let list_selector = effective_selector(&request)?;
        let loop_guard = self.acquire_page_loop().await;

        let timing = &self.inner.options.timing;
        request
            .rule
            .wait_for_load(request.page.as_ref(), timing)
            .await;
        let preflight = match request.page.snapshot().await {
            Ok(snapshot) => request.rule.preflight(&snapshot, &list_selector),
            Err(e) => Err(CrawlError::Page(e)),
        };
        if let Err(e) = preflight {
            warn!("Preflight for {} failed: {}", request.rule.name(), e);
            let mut session = self.inner.session.lock();
            if !session.is_running() {
                session.state = CrawlState::Idle;
                session.last_error = Some(e.to_string());
            }
            return Err(e);
        }

        let session_id = {
            let mut session = self.inner.session.lock();
            if session.is_running() {
                return Ok(StartOutcome::AlreadyRunning);
            }
            *session = CrawlSession::begin(request.rule.name());
            session.id
        };
        info!(
            "Crawl session {} started with rule {} (selector: {})",
            session_id,
            request.rule.name(),
            list_selector
        );
        self.emit(
            session_id,
            CrawlPhase::Started,
            format!("使用规则 {} 开始爬取", request.rule.name()),
        );

        let controller = self.clone();
        let handle = tokio::spawn(async move {
            let _loop_guard = loop_guard;
            controller.run(session_id, request, list_selector).await;
        });
        *self.inner.task.lock() = Some(handle);
        Ok(StartOutcome::Started)
    }

    /// 请求停止
    ///
    /// 状态立即变为 `Idle`；翻页间隔会被打断，
    /// 页面循环在当前步骤结束后退出，不再翻页
    pub fn stop(&self) -> bool {
        let session_id = {
            let mut session = self.inner.session.lock();
            if !session.is_running() {
                return false;
            }
            session.state = CrawlState::Idle;
            session.finished_at = Some(Utc::now());
            session.id
        };
        self.inner.stop_signal.notify_waiters();
        info!("Crawl stop requested");
        self.emit(session_id, CrawlPhase::Stopped, "已停止");
        true
    }

    pub fn status(&self) -> CrawlStatus {
        self.inner.session.lock().status()
    }

    pub fn is_running(&self) -> bool {
        self.inner.session.lock().is_running()
    }

    /// 订阅进度通知
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlProgress> {
        self.inner.progress.subscribe()
    }

    /// 等待后台页面循环结束
    pub async fn wait(&self) {
        let handle = self.inner.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Crawl task failed: {}", e);
            }
        }
    }

    /// 等待上一个页面循环退出并占用页面
    async fn acquire_page_loop(&self) -> OwnedMutexGuard<()> {
        let page_loop = self.inner.page_loop.clone();
        if let Ok(guard) = page_loop.clone().try_lock_owned() {
            return guard;
        }
        info!("Waiting for the previous page loop to exit");
        page_loop.lock_owned().await
    }

    /// 发布进度；会话已被替换时丢弃
    fn emit(&self, session_id: Uuid, phase: CrawlPhase, message: impl Into<String>) {
        let status = {
            let session = self.inner.session.lock();
            if session.id != session_id {
                return;
            }
            session.status()
        };
        // 没有订阅者时发送失败是正常情况
        let _ = self.inner.progress.send(CrawlProgress {
            phase,
            status,
            message: message.into(),
        });
    }

    /// 修改指定会话；会话已被替换时不做任何事
    fn update<F>(&self, session_id: Uuid, apply: F) -> bool
    where
        F: FnOnce(&mut CrawlSession),
    {
        let mut session = self.inner.session.lock();
        if session.id != session_id {
            return false;
        }
        apply(&mut session);
        true
    }

    fn is_active(&self, session_id: Uuid) -> bool {
        let session = self.inner.session.lock();
        session.id == session_id && session.is_running()
    }

    /// 以指定状态结束仍在运行的会话
    fn finish(&self, session_id: Uuid, state: CrawlState, error: Option<String>) -> bool {
        let mut finished = false;
        self.update(session_id, |session| {
            if session.is_running() {
                session.state = state;
                session.finished_at = Some(Utc::now());
                if error.is_some() {
                    session.last_error = error;
                }
                finished = true;
            }
        });
        finished
    }

    async fn run(&self, session_id: Uuid, request: StartCrawl, list_selector: String) {
        let StartCrawl {
            page,
            rule,
            delay,
            max_pages,
            ..
        } = request;
        let page = page.as_ref();
        let rule = rule.as_ref();
        let options = &self.inner.options;
        let timing = &options.timing;
        let max_pages = max_pages.or(options.max_pages);
        let mut trigger = ApiTrigger::Query;

        loop {
            if !self.is_active(session_id) {
                info!("Crawl session {} stopped", session_id);
                break;
            }

            let page_number = self.status().page_number;
            info!("Crawling page {}", page_number);
            self.emit(
                session_id,
                CrawlPhase::Loading,
                format!("正在爬取第 {} 页", page_number),
            );
            rule.wait_for_load(page, timing).await;

            let data = match rule.mode() {
                ExtractionMode::Dom => self.extract_dom(page, rule, &list_selector).await,
                ExtractionMode::Api => self.extract_api(page, rule, &trigger).await,
            };
            counter!("tender_pages_total").increment(1);

            match data {
                PageData::Records(records) if !records.is_empty() => {
                    self.store(session_id, page_number, records).await;
                }
                PageData::Records(_) => {
                    self.page_failed(session_id, page_number, "当前页没有有效数据".to_string());
                }
                PageData::Failed(message) => {
                    self.page_failed(session_id, page_number, message);
                }
                PageData::Abort(message) => {
                    error!("Crawl aborted on page {}: {}", page_number, message);
                    if self.finish(session_id, CrawlState::Idle, Some(message.clone())) {
                        self.emit(session_id, CrawlPhase::Aborted, message);
                    }
                    break;
                }
            }

            if max_pages.is_some_and(|max| page_number >= max) {
                info!("Reached page limit {}", page_number);
                if self.finish(session_id, CrawlState::Completed, None) {
                    self.emit(session_id, CrawlPhase::Completed, "已达到页数上限");
                }
                break;
            }

            let (control, mark) = match page.snapshot().await {
                Ok(snapshot) => locate_next(rule, &snapshot, &list_selector),
                Err(e) => {
                    warn!("Snapshot for pagination failed: {}", e);
                    (None, NavigationMark::default())
                }
            };
            let control = match control {
                Some(control) if rule.is_next_page_available(Some(&control)) => control,
                _ => {
                    info!("No next page, crawl finished after page {}", page_number);
                    if self.finish(session_id, CrawlState::Completed, None) {
                        self.emit(session_id, CrawlPhase::Completed, "爬取完成");
                    }
                    break;
                }
            };

            if !delay.is_zero() {
                self.pause(session_id, delay).await;
            }
            if !self.is_active(session_id) {
                info!(
                    "Crawl session {} stopped before leaving page {}",
                    session_id, page_number
                );
                break;
            }

            match rule.mode() {
                ExtractionMode::Dom => {
                    rule.click_next_page(page, &control, timing).await;
                    let outcome = rule
                        .wait_for_navigation(page, &list_selector, &mark, timing)
                        .await;
                    debug!("Navigation outcome: {:?}", outcome);
                }
                ExtractionMode::Api => {
                    trigger = ApiTrigger::NextPage(control);
                }
            }

            self.update(session_id, |session| session.page_number += 1);
            self.emit(
                session_id,
                CrawlPhase::Advanced,
                format!("翻到第 {} 页", page_number + 1),
            );
        }
    }

    /// 翻页间隔，收到停止请求时提前返回
    async fn pause(&self, session_id: Uuid, delay: Duration) {
        let stopped = self.inner.stop_signal.notified();
        tokio::pin!(stopped);
        stopped.as_mut().enable();
        if !self.is_active(session_id) {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut stopped => debug!("Delay interrupted by stop"),
        }
    }

    async fn extract_dom(
        &self,
        page: &dyn PageDriver,
        rule: &dyn SiteRule,
        list_selector: &str,
    ) -> PageData {
        match page.snapshot().await {
            Ok(snapshot) => match extract_from_snapshot(rule, &snapshot, list_selector) {
                Ok(records) => PageData::Records(records),
                Err(e) => PageData::Failed(e.to_string()),
            },
            Err(e) => PageData::Failed(e.to_string()),
        }
    }

    async fn extract_api(
        &self,
        page: &dyn PageDriver,
        rule: &dyn SiteRule,
        trigger: &ApiTrigger,
    ) -> PageData {
        let options = &self.inner.options;
        let mut retries = 0;
        loop {
            let error = match rule.crawl_from_api(page, trigger, &options.timing).await {
                Ok(records) => return PageData::Records(records),
                Err(e) => e,
            };
            warn!("API extraction failed: {}", error);

            if matches!(error, CrawlError::UnsupportedMode(_)) {
                return PageData::Abort(error.to_string());
            }
            match options.api_failure_policy {
                ApiFailurePolicy::Skip => return PageData::Failed(error.to_string()),
                ApiFailurePolicy::Stop => return PageData::Abort(error.to_string()),
                // 翻页点击不可重放：重试会让站点再前进一页
                ApiFailurePolicy::Retry if matches!(trigger, ApiTrigger::NextPage(_)) => {
                    return PageData::Failed(error.to_string())
                }
                ApiFailurePolicy::Retry if retries < options.api_retry_limit => {
                    retries += 1;
                    info!("Retrying API extraction ({}/{})", retries, options.api_retry_limit);
                }
                ApiFailurePolicy::Retry => return PageData::Failed(error.to_string()),
            }
        }
    }

    async fn store(&self, session_id: Uuid, page_number: u32, records: Vec<TenderRecord>) {
        let count = records.len() as u64;
        counter!("tender_records_crawled_total").increment(count);
        self.update(session_id, |session| session.total_crawled += count);
        self.emit(
            session_id,
            CrawlPhase::Extracted,
            format!("第 {} 页抽取到 {} 条记录", page_number, count),
        );

        match self.inner.sink.save_records(&records).await {
            Ok(saved) => {
                counter!("tender_records_saved_total").increment(saved as u64);
                self.update(session_id, |session| session.total_saved += saved as u64);
                info!("Page {}: saved {} of {} records", page_number, saved, count);
                self.emit(
                    session_id,
                    CrawlPhase::Saved,
                    format!("第 {} 页保存 {} 条", page_number, saved),
                );
            }
            Err(e) => {
                counter!("tender_sink_errors_total").increment(1);
                error!(
                    "Saving page {} to {} failed: {}",
                    page_number,
                    self.inner.sink.name(),
                    e
                );
                let message = e.to_string();
                self.update(session_id, |session| {
                    session.last_error = Some(message.clone())
                });
                self.emit(session_id, CrawlPhase::SaveFailed, message);
            }
        }
    }

    fn page_failed(&self, session_id: Uuid, page_number: u32, message: String) {
        counter!("tender_pages_failed_total").increment(1);
        warn!("Page {} failed: {}", page_number, message);
        self.update(session_id, |session| {
            session.failed_pages += 1;
            session.last_error = Some(message.clone());
        });
        self.emit(session_id, CrawlPhase::PageFailed, message);
    }
}

/// 确定本次会话使用的列表项选择器
fn effective_selector(request: &StartCrawl) -> Result<String, CrawlError> {
    let selector = match (&request.mode, &request.selector_override) {
        (CrawlMode::Custom, None) => {
            return Err(CrawlError::InvalidStart(
                "自定义模式需要提供列表项选择器".to_string(),
            ))
        }
        (_, Some(selector)) => selector.trim().to_string(),
        (CrawlMode::Auto, None) => request.rule.list_item_selector().to_string(),
    };
    if selector.is_empty() && request.selector_override.is_none() {
        return Err(CrawlError::MissingSelector(format!(
            "规则 {} 没有默认的列表项选择器",
            request.rule.name()
        )));
    }
    validate_selector(&selector)?;
    Ok(selector)
}

fn locate_next(
    rule: &dyn SiteRule,
    snapshot: &PageSnapshot,
    list_selector: &str,
) -> (Option<PageControl>, NavigationMark) {
    (
        PageControl::locate(snapshot, rule.next_page_selector()),
        NavigationMark::capture(snapshot, list_selector),
    )
}
