// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    api_reply, fast_timing, html_reply, listing_html, sichuan_html, FakePage, RecordingSink,
    ScriptedApi,
};
use page_spider::domain::models::session::{ApiFailurePolicy, CrawlMode, CrawlPhase, CrawlState};
use page_spider::domain::rules::ccgp_sichuan::CcgpSichuanRule;
use page_spider::domain::rules::default_rule::DefaultRule;
use page_spider::domain::services::crawl_controller::{
    ControllerOptions, CrawlController, StartCrawl, StartOutcome,
};
use page_spider::engines::traits::PageDriver;
use page_spider::utils::errors::CrawlError;
use std::sync::Arc;
use std::time::Duration;

const LIST: &str = "ul.list > li";

fn options() -> ControllerOptions {
    ControllerOptions {
        timing: fast_timing(),
        ..ControllerOptions::default()
    }
}

fn custom_start(page: Arc<dyn PageDriver>, delay: Duration) -> StartCrawl {
    StartCrawl {
        page,
        rule: Arc::new(DefaultRule::new()),
        selector_override: Some(LIST.to_string()),
        delay,
        mode: CrawlMode::Custom,
        max_pages: None,
    }
}

fn api_start(page: Arc<dyn PageDriver>, max_pages: Option<u32>) -> StartCrawl {
    StartCrawl {
        page,
        rule: Arc::new(CcgpSichuanRule::new()),
        selector_override: None,
        delay: Duration::ZERO,
        mode: CrawlMode::Auto,
        max_pages,
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_page_without_pagination_completes() {
    let page = FakePage::dom(vec![(
        "https://example.com/list/1",
        listing_html(&["甲项目", "乙项目", "丙项目"], None),
    )]);
    let sink = RecordingSink::new();
    let controller = CrawlController::new(sink.clone(), options());
    let mut progress = controller.subscribe();

    let outcome = controller
        .start(custom_start(page, Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(outcome, StartOutcome::Started);
    controller.wait().await;

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert!(!status.is_running);
    assert_eq!(status.total_crawled, 3);
    assert_eq!(status.total_saved, 3);
    assert_eq!(status.page_number, 1);
    assert_eq!(sink.batch_sizes(), vec![3]);

    let mut phases = Vec::new();
    while let Ok(event) = progress.try_recv() {
        phases.push(event.phase);
    }
    assert_eq!(phases.first(), Some(&CrawlPhase::Started));
    assert_eq!(phases.last(), Some(&CrawlPhase::Completed));
    assert!(phases.contains(&CrawlPhase::Saved));
}

#[tokio::test(start_paused = true)]
async fn test_two_page_crawl_follows_next_link() {
    let page = FakePage::dom(vec![
        (
            "https://example.com/list/1",
            listing_html(&["甲项目", "乙项目"], Some("/list/2")),
        ),
        (
            "https://example.com/list/2",
            listing_html(&["丙项目"], None),
        ),
    ]);
    let sink = RecordingSink::new();
    let controller = CrawlController::new(sink.clone(), options());

    controller
        .start(custom_start(page.clone(), Duration::from_millis(20)))
        .await
        .unwrap();
    controller.wait().await;

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.page_number, 2);
    assert_eq!(status.total_crawled, 3);
    assert_eq!(sink.batch_sizes(), vec![2, 1]);
    assert_eq!(page.current_url().await, "https://example.com/list/2");

    let urls: Vec<String> = sink.records().into_iter().map(|r| r.url).collect();
    assert!(urls[0].starts_with("https://example.com/detail/"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_page_is_counted_and_crawl_continues() {
    let page = FakePage::dom(vec![
        (
            "https://example.com/list/1",
            r#"<html><body><ul class="list"><li></li></ul><a rel="next" href="/list/2">下一页</a></body></html>"#
                .to_string(),
        ),
        (
            "https://example.com/list/2",
            listing_html(&["丁项目"], None),
        ),
    ]);
    let sink = RecordingSink::new();
    let controller = CrawlController::new(sink.clone(), options());

    controller
        .start(custom_start(page, Duration::ZERO))
        .await
        .unwrap();
    controller.wait().await;

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.failed_pages, 1);
    assert_eq!(status.total_crawled, 1);
    assert_eq!(sink.batch_sizes(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_sink_rejection_does_not_stop_crawl() {
    let page = FakePage::dom(vec![
        (
            "https://example.com/list/1",
            listing_html(&["甲项目"], Some("/list/2")),
        ),
        (
            "https://example.com/list/2",
            listing_html(&["乙项目"], None),
        ),
    ]);
    let sink = RecordingSink::failing();
    let controller = CrawlController::new(sink.clone(), options());

    controller
        .start(custom_start(page, Duration::ZERO))
        .await
        .unwrap();
    controller.wait().await;

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.total_crawled, 2);
    assert_eq!(status.total_saved, 0);
    assert!(status.last_error.unwrap().contains("backend unavailable"));
    assert_eq!(sink.batch_sizes(), vec![1, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_takes_effect_at_next_iteration() {
    let page = FakePage::dom(vec![
        (
            "https://example.com/list/1",
            listing_html(&["甲项目", "乙项目"], Some("/list/2")),
        ),
        (
            "https://example.com/list/2",
            listing_html(&["丙项目"], Some("/list/3")),
        ),
        (
            "https://example.com/list/3",
            listing_html(&["丁项目"], None),
        ),
    ]);
    let sink = RecordingSink::new();
    let controller = CrawlController::new(sink.clone(), options());

    let saved = sink.saved();
    controller
        .start(custom_start(page, Duration::from_secs(10)))
        .await
        .unwrap();
    saved.await;

    assert!(controller.stop());
    assert!(!controller.stop());
    controller.wait().await;

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Idle);
    assert_eq!(status.total_crawled, 2);
    assert_eq!(sink.batch_sizes(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop_runs_a_single_page_loop() {
    let page = FakePage::dom(vec![
        (
            "https://example.com/list/1",
            listing_html(&["甲项目", "乙项目"], Some("/list/2")),
        ),
        (
            "https://example.com/list/2",
            listing_html(&["丙项目"], Some("/list/3")),
        ),
        (
            "https://example.com/list/3",
            listing_html(&["丁项目"], None),
        ),
    ]);
    let sink = RecordingSink::new();
    let controller = CrawlController::new(sink.clone(), options());
    let mut progress = controller.subscribe();

    let saved = sink.saved();
    controller
        .start(custom_start(page.clone(), Duration::from_secs(10)))
        .await
        .unwrap();
    saved.await;
    assert!(controller.stop());

    let restarted = controller
        .start(custom_start(page.clone(), Duration::from_secs(20)))
        .await
        .unwrap();
    assert_eq!(restarted, StartOutcome::Started);
    controller.wait().await;

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.page_number, 3);
    assert_eq!(sink.batch_sizes(), vec![2, 2, 1, 1]);
    let titles: Vec<String> = sink.records().into_iter().map(|r| r.title).collect();
    assert_eq!(
        titles,
        vec!["甲项目", "乙项目", "甲项目", "乙项目", "丙项目", "丁项目"]
    );
    assert_eq!(page.current_url().await, "https://example.com/list/3");

    let mut phases = Vec::new();
    while let Ok(event) = progress.try_recv() {
        phases.push(event.phase);
    }
    let advanced = phases
        .iter()
        .filter(|phase| **phase == CrawlPhase::Advanced)
        .count();
    assert_eq!(advanced, 2);
    let stopped_at = phases
        .iter()
        .position(|phase| *phase == CrawlPhase::Stopped)
        .unwrap();
    assert_eq!(phases[stopped_at + 1], CrawlPhase::Started);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_while_running_is_noop() {
    let page = FakePage::dom(vec![
        (
            "https://example.com/list/1",
            listing_html(&["甲项目"], Some("/list/2")),
        ),
        (
            "https://example.com/list/2",
            listing_html(&["乙项目"], None),
        ),
    ]);
    let sink = RecordingSink::new();
    let controller = CrawlController::new(sink.clone(), options());

    let saved = sink.saved();
    let first = controller
        .start(custom_start(page.clone(), Duration::from_secs(5)))
        .await
        .unwrap();
    saved.await;
    let before = controller.status();

    // 运行中的会话优先于参数校验
    let mut invalid = custom_start(page.clone(), Duration::ZERO);
    invalid.selector_override = Some("li[".to_string());
    assert_eq!(
        controller.start(invalid).await.unwrap(),
        StartOutcome::AlreadyRunning
    );

    let second = controller
        .start(custom_start(page, Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(first, StartOutcome::Started);
    assert_eq!(second, StartOutcome::AlreadyRunning);
    assert_eq!(controller.status().total_crawled, before.total_crawled);

    controller.wait().await;
    let status = controller.status();
    assert_eq!(status.total_crawled, 2);
    assert_eq!(sink.batch_sizes(), vec![1, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_start_rejects_bad_arguments() {
    let page = FakePage::dom(vec![(
        "https://example.com/list/1",
        listing_html(&["甲项目"], None),
    )]);
    let sink = RecordingSink::new();
    let controller = CrawlController::new(sink.clone(), options());

    let mut request = custom_start(page.clone(), Duration::ZERO);
    request.selector_override = None;
    assert!(matches!(
        controller.start(request).await,
        Err(CrawlError::InvalidStart(_))
    ));

    let mut request = custom_start(page.clone(), Duration::ZERO);
    request.mode = CrawlMode::Auto;
    request.selector_override = None;
    assert!(matches!(
        controller.start(request).await,
        Err(CrawlError::MissingSelector(_))
    ));

    let mut request = custom_start(page.clone(), Duration::ZERO);
    request.selector_override = Some("li[".to_string());
    assert!(matches!(
        controller.start(request).await,
        Err(CrawlError::InvalidSelector(_))
    ));

    let mut request = custom_start(page, Duration::ZERO);
    request.selector_override = Some("table.nothing tr".to_string());
    assert!(matches!(
        controller.start(request).await,
        Err(CrawlError::MissingSelector(_))
    ));

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Idle);
    assert!(status.last_error.is_some());
    assert!(sink.batch_sizes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_api_mode_pages_through_intercepted_responses() {
    let api = ScriptedApi::new(vec![
        api_reply(&["成都项目", "绵阳项目"]),
        api_reply(&["德阳项目"]),
    ]);
    let page = FakePage::api("https://www.ccgp-sichuan.gov.cn/maincms-web/fullSearching", sichuan_html(true), api.clone());
    let sink = RecordingSink::new();
    let controller = CrawlController::new(sink.clone(), options());

    controller.start(api_start(page, Some(2))).await.unwrap();
    controller.wait().await;

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.page_number, 2);
    assert_eq!(sink.batch_sizes(), vec![2, 1]);
    assert_eq!(api.request_count(), 2);

    let records = sink.records();
    assert_eq!(records[0].province_name, "四川省");
    assert!(records[0]
        .url
        .starts_with("https://www.ccgp-sichuan.gov.cn/info/"));
}

#[tokio::test(start_paused = true)]
async fn test_api_mode_requires_query_button() {
    let api = ScriptedApi::new(vec![]);
    let page = FakePage::api(
        "https://www.ccgp-sichuan.gov.cn/list",
        "<html><body><p>维护中</p></body></html>".to_string(),
        api.clone(),
    );
    let controller = CrawlController::new(RecordingSink::new(), options());

    let result = controller.start(api_start(page, None)).await;
    assert!(matches!(result, Err(CrawlError::MissingSelector(_))));
    assert_eq!(api.request_count(), 0);
}

async fn run_with_policy(policy: ApiFailurePolicy) -> (CrawlController, Arc<ScriptedApi>) {
    // 没有预设响应，每次拦截都会超时
    let api = ScriptedApi::new(vec![]);
    let page = FakePage::api("https://www.ccgp-sichuan.gov.cn/list", sichuan_html(false), api.clone());
    let controller = CrawlController::new(
        RecordingSink::new(),
        ControllerOptions {
            timing: fast_timing(),
            api_failure_policy: policy,
            api_retry_limit: 1,
            max_pages: None,
        },
    );
    controller.start(api_start(page, None)).await.unwrap();
    controller.wait().await;
    (controller, api)
}

#[tokio::test(start_paused = true)]
async fn test_api_timeout_with_skip_policy_continues() {
    let (controller, api) = run_with_policy(ApiFailurePolicy::Skip).await;
    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.failed_pages, 1);
    assert_eq!(api.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_api_timeout_with_retry_policy_retries_once() {
    let (controller, api) = run_with_policy(ApiFailurePolicy::Retry).await;
    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.failed_pages, 1);
    assert_eq!(api.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_api_timeout_with_stop_policy_aborts() {
    let (controller, api) = run_with_policy(ApiFailurePolicy::Stop).await;
    let status = controller.status();
    assert_eq!(status.state, CrawlState::Idle);
    assert_eq!(status.failed_pages, 0);
    assert!(status.last_error.is_some());
    assert_eq!(api.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_next_page_is_not_clicked_again_on_retry() {
    let api = ScriptedApi::new(vec![
        api_reply(&["成都项目"]),
        html_reply(),
        api_reply(&["德阳项目"]),
    ]);
    let page = FakePage::api(
        "https://www.ccgp-sichuan.gov.cn/maincms-web/fullSearching",
        sichuan_html(true),
        api.clone(),
    );
    let sink = RecordingSink::new();
    let controller = CrawlController::new(
        sink.clone(),
        ControllerOptions {
            timing: fast_timing(),
            api_failure_policy: ApiFailurePolicy::Retry,
            api_retry_limit: 2,
            max_pages: None,
        },
    );

    controller.start(api_start(page, Some(3))).await.unwrap();
    controller.wait().await;

    let status = controller.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.page_number, 3);
    assert_eq!(status.failed_pages, 1);
    assert_eq!(
        api.request_bodies(),
        vec![r#"{"page":1}"#, r#"{"page":2}"#, r#"{"page":3}"#]
    );
    let titles: Vec<String> = sink.records().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["成都项目", "德阳项目"]);
}
