// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 页面等待与翻页点击
//!
//! 所有等待都采用固定间隔轮询，并受次数或时长上限约束

use crate::domain::models::timing::CrawlTiming;
use crate::domain::rules::control::{NavigationMark, NavigationOutcome, PageControl};
use crate::engines::traits::{PageDriver, PageSnapshot, ReadyState};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// 等待文档就绪
///
/// 超过 `load_timeout` 仍未就绪时照常返回
pub async fn wait_for_load(page: &dyn PageDriver, timing: &CrawlTiming) {
    if page.ready_state().await == ReadyState::Complete {
        return;
    }
    let ready = timeout(timing.load_timeout, async {
        while page.ready_state().await != ReadyState::Complete {
            sleep(timing.poll_interval).await;
        }
    })
    .await;
    if ready.is_err() {
        debug!("Page not ready after {:?}, continuing", timing.load_timeout);
    }
}

fn inspect(snapshot: &PageSnapshot, list_selector: &str) -> (String, usize) {
    (
        snapshot.first_text(list_selector).unwrap_or_default(),
        snapshot.count(list_selector),
    )
}

/// 轮询检测翻页是否完成
///
/// 返回 `ContentChanged` / `Settled` 前已经等待过 `settle_delay`；
/// `UrlChanged` 的后续等待由调用方负责
pub async fn poll_navigation(
    page: &dyn PageDriver,
    list_selector: &str,
    mark: &NavigationMark,
    timing: &CrawlTiming,
) -> NavigationOutcome {
    for check in 1..=timing.max_polls {
        sleep(timing.poll_interval).await;

        if page.current_url().await != mark.url {
            return NavigationOutcome::UrlChanged;
        }

        let snapshot = match page.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Snapshot failed while waiting for navigation: {}", e);
                continue;
            }
        };
        let (first_text, count) = inspect(&snapshot, list_selector);

        if !mark.first_item_text.is_empty()
            && !first_text.is_empty()
            && first_text != mark.first_item_text
        {
            sleep(timing.settle_delay).await;
            return NavigationOutcome::ContentChanged;
        }

        if count > 0 && check > timing.settle_polls {
            sleep(timing.settle_delay).await;
            return NavigationOutcome::Settled;
        }
    }

    warn!(
        "Navigation not detected after {} checks, continuing",
        timing.max_polls
    );
    NavigationOutcome::TimedOut
}

/// 点击下一页控件
///
/// 依次尝试：普通链接直接导航、元素默认点击、指针事件序列。
/// 失败只记录日志，随后的导航检测负责判断是否真的翻页
pub async fn click_control(page: &dyn PageDriver, control: &PageControl, timing: &CrawlTiming) {
    let current_url = page.current_url().await;
    if let Some(target) = control.navigation_target(&current_url) {
        debug!("Navigating to {}", target);
        if let Err(e) = page.navigate(&target).await {
            warn!("Navigation to {} failed: {}", target, e);
        }
        sleep(timing.link_grace).await;
        return;
    }

    if !control.is_javascript_link() {
        match page.click(&control.selector).await {
            Ok(()) => {
                sleep(timing.click_grace).await;
                return;
            }
            Err(e) => warn!("Click on {} failed, dispatching pointer events: {}", control.selector, e),
        }
    }

    if let Err(e) = page
        .dispatch_pointer_sequence(&control.selector, timing.pointer_step)
        .await
    {
        warn!("Pointer events on {} failed: {}", control.selector, e);
    }
    sleep(timing.click_grace).await;
}
